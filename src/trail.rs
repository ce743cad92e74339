//! Trail strategies: the fading line, the stamped image, the particles.
//!
//! Exactly one runs per frame, picked by [`TrailStyle`]. The line and image
//! trails read the pointer history; the particle trail never touches it.

use crate::color::{alpha_blend, Color};
use crate::config::TrailStyle;
use crate::history::TrailHistory;
use crate::particles::ParticleSystem;
use crate::surface::{DrawingSurface, LineCap, LineJoin};
use crate::types::Bitmap;

/// Hue step (degrees) between neighbouring rainbow segments.
pub const RAINBOW_SEGMENT_HUE_STEP: f32 = 5.0;

/// Per-frame inputs shared by the strategies.
pub struct TrailFrame<'a> {
    pub style: TrailStyle,
    pub cursor_size: f32,
    pub hue: f32,
    pub rainbow: bool,
    /// Explicit trail color string, if configured.
    pub trail_color: Option<&'a str>,
    /// The current cursor color as a CSS string (used when no trail color is set).
    pub current_color: &'a str,
    pub image: Option<&'a Bitmap>,
}

pub fn render<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    frame: &TrailFrame<'_>,
    history: &TrailHistory,
    particles: &mut ParticleSystem,
) {
    match frame.style {
        TrailStyle::Simple => render_simple(surface, frame, history),
        TrailStyle::Image => render_image(surface, frame, history),
        TrailStyle::Particles => {
            particles.advance();
            particles.render(surface, frame.cursor_size, frame.hue);
        }
    }
}

/// Alpha of history entry `i` out of `len`: oldest is fully transparent.
#[inline]
pub fn fade(i: usize, len: usize) -> f32 {
    i as f32 / len as f32
}

/// Color of line segment `i` given the history length.
pub fn segment_color(frame: &TrailFrame<'_>, i: usize, len: usize) -> Option<Color> {
    let alpha = fade(i, len);
    if let Some(explicit) = frame.trail_color {
        alpha_blend(explicit, alpha)
    } else if frame.rainbow {
        let hue = frame.hue - (len - i) as f32 * RAINBOW_SEGMENT_HUE_STEP;
        Some(Color::hsla(hue, 100.0, 50.0, alpha))
    } else {
        alpha_blend(frame.current_color, alpha)
    }
}

/// Line segments between consecutive history points, thin and faint at the
/// tail, full width at the head.
fn render_simple<S: DrawingSurface + ?Sized>(surface: &mut S, frame: &TrailFrame<'_>, history: &TrailHistory) {
    let len = history.len();
    if len < 2 {
        return;
    }

    surface.set_line_cap(LineCap::Round);
    surface.set_line_join(LineJoin::Round);

    let pairs = history.contents().zip(history.contents().skip(1));
    for (i, (p1, p2)) in pairs.enumerate() {
        surface.begin_path();
        surface.move_to(p1.x, p1.y);
        surface.line_to(p2.x, p2.y);
        surface.set_line_width(frame.cursor_size * fade(i, len));
        // An unparseable style is ignored, like a canvas does
        if let Some(color) = segment_color(frame, i, len) {
            surface.set_stroke_style(color);
        }
        surface.stroke();
    }
}

/// The trail image stamped at every history point, fading toward the tail.
fn render_image<S: DrawingSurface + ?Sized>(surface: &mut S, frame: &TrailFrame<'_>, history: &TrailHistory) {
    let Some(image) = frame.image else { return };
    let len = history.len();
    if len < 1 {
        return;
    }

    let side = frame.cursor_size * 2.0;
    for (i, p) in history.contents().enumerate() {
        surface.set_global_alpha(fade(i, len));
        surface.draw_image(image, p.x - side / 2.0, p.y - side / 2.0, side, side);
    }
    surface.set_global_alpha(1.0);
}
