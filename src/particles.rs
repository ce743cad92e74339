// Particle trail: small dots (or sparkle squares) spawned under the pointer.
// Visual outcomes per preset:
// - spread: dots burst out in every direction and shrink away.
// - fire: dots rise, shifting from yellow to red as they burn out.
// - snow: white flakes drift down and live longer.
// - sparkle: gold squares stay put and twinkle.

use rand::Rng;
use rand::rngs::StdRng;
use std::f32::consts::TAU;

use crate::color::Color;
use crate::config::ParticlePreset;
use crate::surface::DrawingSurface;

/// Life lost per tick. One unit of life lasts 50 ticks.
pub const LIFE_DECAY: f32 = 0.02;

/// Fire hue at full life (yellow); it falls to 0 (red) as the particle dies.
pub const FIRE_HUE_MAX: f32 = 50.0;

/// Sparkle alpha multiplier on a "dim" frame.
const SPARKLE_DIM: f32 = 0.2;

impl ParticlePreset {
    /// Particles per pointer-move event.
    pub fn spawn_count(self) -> usize {
        match self {
            ParticlePreset::Sparkle => 1, // sparse on purpose
            ParticlePreset::Fire => 4,
            ParticlePreset::Spread | ParticlePreset::Snow => 3,
        }
    }

    /// Color used when neither a trail color nor rainbow mode applies.
    /// `None` means "fall back to the cursor's base color".
    pub fn default_color(self) -> Option<Color> {
        match self {
            ParticlePreset::Fire => Some(Color::rgb(0xff, 0x45, 0x00)),
            ParticlePreset::Snow => Some(Color::rgb(0xff, 0xff, 0xff)),
            ParticlePreset::Sparkle => Some(Color::rgb(0xff, 0xd7, 0x00)),
            ParticlePreset::Spread => None,
        }
    }
}

/// How a freshly spawned particle picks its color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPolicy {
    pub trail_color: Option<Color>, // explicit trail color wins
    pub base_color: Color,          // cursor color when rainbow is off
    pub rainbow: bool,
}

impl ColorPolicy {
    /// Resolved once at spawn. `None` = derive from the hue every frame.
    pub fn resolve(&self, preset: ParticlePreset) -> Option<Color> {
        if let Some(c) = self.trail_color {
            return Some(c);
        }
        if self.rainbow {
            return None;
        }
        Some(preset.default_color().unwrap_or(self.base_color))
    }
}

/// One particle. Visual: a dot that drifts by its velocity and fades out.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32, pub y: f32,      // position in pixels
    pub vx: f32, pub vy: f32,    // velocity in px/tick
    pub life: f32,               // remaining life
    pub max_life: f32,           // life at spawn (for the life ratio)
    pub color: Option<Color>,    // fixed color, or None for hue-derived
    pub preset: ParticlePreset,
    ticks_left: u32,             // ceil(max_life / LIFE_DECAY) at spawn
}

impl Particle {
    fn new(x: f32, y: f32, vx: f32, vy: f32, life: f32, color: Option<Color>, preset: ParticlePreset) -> Self {
        Self {
            x, y, vx, vy,
            life,
            max_life: life,
            color,
            preset,
            ticks_left: lifespan_ticks(life),
        }
    }

    /// life / max_life, in [0, 1].
    #[inline]
    pub fn life_ratio(&self) -> f32 {
        if self.max_life <= 0.0 { 0.0 } else { (self.life / self.max_life).clamp(0.0, 1.0) }
    }

    #[inline]
    pub fn alive(&self) -> bool {
        self.ticks_left > 0
    }
}

/// Number of ticks a particle with `life` survives: the first tick at which
/// repeated `LIFE_DECAY` subtraction reaches zero. Counted in integers so
/// float drift cannot add or drop a frame.
pub fn lifespan_ticks(life: f32) -> u32 {
    // Divide by the decimal step, not the f32 constant (0.0199999996), and
    // absorb the f32 error in `life` itself.
    let ticks = (life as f64 / 0.02 - 1e-4).ceil();
    ticks.max(1.0) as u32
}

/// Fire hue for a given life ratio: 50 (yellow) at full life down to 0 (red).
#[inline]
pub fn fire_hue(life_ratio: f32) -> f32 {
    life_ratio.clamp(0.0, 1.0) * FIRE_HUE_MAX
}

/// Live particles. Visual: everything that sparkles behind the cursor.
pub struct ParticleSystem {
    rng: StdRng,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new(rng: StdRng) -> Self {
        Self { rng, particles: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Spawn the preset's batch of particles at (x, y).
    /// Visual: new dots appear right under the pointer.
    pub fn spawn(&mut self, x: f32, y: f32, preset: ParticlePreset, policy: &ColorPolicy) {
        let color = policy.resolve(preset);
        for _ in 0..preset.spawn_count() {
            let (vx, vy, life) = match preset {
                ParticlePreset::Spread => (
                    self.rng.gen_range(-1.0f32..1.0),
                    self.rng.gen_range(-1.0f32..1.0),
                    1.0,
                ),
                // Fire moves up
                ParticlePreset::Fire => (
                    self.rng.gen_range(-0.75f32..0.75),
                    self.rng.gen_range(-2.5f32..-0.5),
                    self.rng.gen_range(0.8f32..1.2),
                ),
                // Snow moves down
                ParticlePreset::Snow => (
                    self.rng.gen_range(-0.75f32..0.75),
                    self.rng.gen_range(0.5f32..2.5),
                    self.rng.gen_range(1.5f32..2.5),
                ),
                // Static sparkle
                ParticlePreset::Sparkle => (0.0, 0.0, 2.0),
            };
            self.particles.push(Particle::new(x, y, vx, vy, life, color, preset));
        }
    }

    /// One tick of motion and decay; dead particles are dropped.
    /// Visual: dots drift one step and fade a little.
    pub fn advance(&mut self) {
        let mut i = 0;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.x += p.vx;
            p.y += p.vy;
            p.life -= LIFE_DECAY;
            p.ticks_left = p.ticks_left.saturating_sub(1);

            if p.alive() {
                i += 1;
            } else {
                // swap-remove, O(1); survivor order doesn't matter
                self.particles.swap_remove(i);
            }
        }
    }

    /// Draw every live particle.
    /// `cursor_size` scales the dots; `hue` colors the rainbow ones.
    pub fn render<S: DrawingSurface + ?Sized>(&mut self, surface: &mut S, cursor_size: f32, hue: f32) {
        for p in &self.particles {
            let (color, alpha) = match p.color {
                Some(fixed) if p.preset == ParticlePreset::Sparkle => {
                    // Twinkle: every frame each sparkle is either full or dim
                    let flicker = if self.rng.gen_bool(0.5) { 1.0 } else { SPARKLE_DIM };
                    (fixed, p.life.min(1.0) * flicker)
                }
                Some(fixed) => (fixed, p.life.min(1.0)),
                None if p.preset == ParticlePreset::Fire => {
                    (Color::hsl(fire_hue(p.life_ratio()), 100.0, 50.0), p.life.min(1.0))
                }
                None => (Color::hsl(hue, 100.0, 50.0), p.life.min(1.0)),
            };

            surface.set_global_alpha(alpha);
            surface.set_fill_style(color);
            surface.begin_path();
            if p.preset == ParticlePreset::Sparkle {
                let size = cursor_size * 0.4;
                surface.rect(p.x - size / 2.0, p.y - size / 2.0, size, size);
            } else {
                surface.arc(p.x, p.y, cursor_size * 0.5 * p.life_ratio(), 0.0, TAU);
            }
            surface.fill();
            surface.set_global_alpha(1.0);
        }
    }
}
