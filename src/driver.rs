// The per-frame animation loop.
// Each tick: clear, advance the hue, update history, draw trail, draw glyph.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::color::Color;
use crate::glyph::{self, GlyphStyle};
use crate::overlay::Overlay;
use crate::surface::DrawingSurface;
use crate::trail::{self, TrailFrame};

/// Cancellation token for a running loop. Clones share the same flag, so any
/// thread can stop the loop.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    running: Arc<AtomicBool>,
}

impl LoopHandle {
    fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, disabled, or no surface: nothing drawn, no state advanced.
    Skipped,
    Drawn,
}

#[derive(Debug)]
pub struct AnimationDriver {
    phase: Phase,
    handle: LoopHandle,
    ticks: u64,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self { phase: Phase::Idle, handle: LoopHandle::default(), ticks: 0 }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ticks scheduled so far, skipped ones included.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Start the loop. Calling it again while running hands back the same
    /// handle without starting a second loop.
    pub fn setup(&mut self) -> LoopHandle {
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
            self.handle.start();
            tracing::debug!("Animation loop started");
        }
        self.handle.clone()
    }

    /// True while set up and not stopped.
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running && self.handle.is_running()
    }

    /// One frame. Before `setup()` and after the handle is stopped nothing
    /// happens at all. Otherwise image completions are applied first; then,
    /// unless the overlay is disabled or there is nothing to draw on, the
    /// frame is drawn.
    pub fn tick<S: DrawingSurface + ?Sized>(&mut self, overlay: &mut Overlay, surface: Option<&mut S>) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Skipped;
        }
        self.ticks += 1;
        overlay.poll_loads();

        let Some(surface) = surface else { return TickOutcome::Skipped };
        if !overlay.config().enable {
            return TickOutcome::Skipped;
        }

        let (w, h) = surface.size();
        surface.clear_rect(0.0, 0.0, w as f32, h as f32);

        overlay.advance_hue();
        let hue = overlay.hue;
        let pointer = overlay.pointer;

        let cfg = overlay.config().clone();
        let current = if cfg.rainbow_mode { Color::hsl(hue, 100.0, 50.0) } else { cfg.base_color_value() };
        // Trail segments blend this string, so keep the configured text as is
        let current_css = if cfg.rainbow_mode { format!("hsl({hue}, 100%, 50%)") } else { cfg.base_color.clone() };
        // Glow for the image glyph: the explicit trail color, else the cursor color
        let glow = cfg.trail_color().and_then(Color::parse).unwrap_or(current);

        if cfg.trail_style.uses_history() {
            overlay.history.push(pointer);
        }

        let trail_bitmap = overlay.trail_image().bitmap().cloned();
        let frame = TrailFrame {
            style: cfg.trail_style,
            cursor_size: cfg.cursor_size as f32,
            hue,
            rainbow: cfg.rainbow_mode,
            trail_color: cfg.trail_color(),
            current_color: &current_css,
            image: trail_bitmap.as_ref(),
        };
        trail::render(surface, &frame, &overlay.history, &mut overlay.particles);

        let style = GlyphStyle {
            shape: cfg.cursor_shape,
            size: cfg.cursor_size as f32,
            color: current,
            glow,
            image: overlay.cursor_image().bitmap(),
        };
        glyph::render(surface, pointer, &style);

        TickOutcome::Drawn
    }

    /// Drive exactly `n` ticks back to back.
    pub fn run_ticks<S: DrawingSurface + ?Sized>(&mut self, overlay: &mut Overlay, mut surface: Option<&mut S>, n: usize) {
        for _ in 0..n {
            self.tick(overlay, surface.as_deref_mut());
        }
    }
}
