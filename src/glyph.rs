// The cursor glyph: the shape (or image) drawn right at the pointer.

use std::f32::consts::{PI, TAU};

use crate::color::Color;
use crate::config::CursorShape;
use crate::surface::DrawingSurface;
use crate::types::{Bitmap, Point};

/// Glow blur around vector shapes.
pub const SHAPE_GLOW: f32 = 10.0;
/// Glow blur around an image cursor.
pub const IMAGE_GLOW: f32 = 15.0;
/// Ring outline width.
pub const RING_WIDTH: f32 = 3.0;

/// What the glyph renderer needs for one frame.
pub struct GlyphStyle<'a> {
    pub shape: CursorShape,
    pub size: f32,                 // "radius" of the shape, cursorSize
    pub color: Color,              // current color (rainbow or base)
    pub glow: Color,               // glow for the image glyph (effective trail color)
    pub image: Option<&'a Bitmap>, // a loaded cursor image overrides the shape
}

pub fn render<S: DrawingSurface + ?Sized>(surface: &mut S, at: Point, style: &GlyphStyle<'_>) {
    match style.image {
        Some(image) => render_image(surface, at, image, style),
        None => render_shape(surface, at, style),
    }
}

/// Image cursor: `size * 4` square, centered so the trail leaves its middle.
fn render_image<S: DrawingSurface + ?Sized>(surface: &mut S, at: Point, image: &Bitmap, style: &GlyphStyle<'_>) {
    let side = style.size * 4.0;
    surface.set_shadow(IMAGE_GLOW, style.glow);
    surface.draw_image(image, at.x - side / 2.0, at.y - side / 2.0, side, side);
    surface.set_shadow(0.0, style.glow);
}

fn render_shape<S: DrawingSurface + ?Sized>(surface: &mut S, at: Point, style: &GlyphStyle<'_>) {
    let r = style.size;
    let Point { x, y } = at;

    surface.begin_path();
    match style.shape {
        CursorShape::Square => surface.rect(x - r, y - r, r * 2.0, r * 2.0),
        CursorShape::Star => star_path(surface, x, y, 5, r, r / 2.0),
        CursorShape::Heart => heart_path(surface, x, y, r),
        CursorShape::Triangle => triangle_path(surface, x, y, r),
        CursorShape::Circle | CursorShape::Ring => surface.arc(x, y, r, 0.0, TAU),
    }

    if style.shape == CursorShape::Ring {
        surface.set_line_width(RING_WIDTH);
        surface.set_stroke_style(style.color);
        surface.stroke();
    } else {
        surface.set_fill_style(style.color);
        surface.fill();
        // Second pass with the glow on
        surface.set_shadow(SHAPE_GLOW, style.color);
        surface.fill();
        surface.set_shadow(0.0, style.color);
    }
}

/// Star with alternating outer/inner vertices, first spike straight up.
pub fn star_path<S: DrawingSurface + ?Sized>(surface: &mut S, cx: f32, cy: f32, spikes: u32, outer: f32, inner: f32) {
    let step = PI / spikes as f32;
    let mut rot = PI / 2.0 * 3.0;

    surface.move_to(cx, cy - outer);
    for _ in 0..spikes {
        surface.line_to(cx + rot.cos() * outer, cy + rot.sin() * outer);
        rot += step;
        surface.line_to(cx + rot.cos() * inner, cy + rot.sin() * inner);
        rot += step;
    }
    surface.line_to(cx, cy - outer);
    surface.close_path();
}

/// Heart from four cubic curves, nudged up by 0.3r to look centered.
pub fn heart_path<S: DrawingSurface + ?Sized>(surface: &mut S, x: f32, y: f32, size: f32) {
    let y = y - size * 0.3;

    surface.move_to(x, y + size * 0.3);
    surface.bezier_curve_to(x, y, x - size, y - size, x - size, y - size * 0.3);
    surface.bezier_curve_to(x - size, y + size * 0.5, x, y + size, x, y + size);
    surface.bezier_curve_to(x, y + size, x + size, y + size * 0.5, x + size, y - size * 0.3);
    surface.bezier_curve_to(x + size, y - size, x, y, x, y + size * 0.3);
    surface.close_path();
}

/// Triangle pointing up, nudged down by 0.2r to look centered.
pub fn triangle_path<S: DrawingSurface + ?Sized>(surface: &mut S, x: f32, y: f32, size: f32) {
    let y = y + size * 0.2;

    surface.move_to(x, y - size);                         // apex
    surface.line_to(x + size * 0.866, y + size * 0.5);    // bottom right
    surface.line_to(x - size * 0.866, y + size * 0.5);    // bottom left
    surface.close_path();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCall, Recorder};
    use tiny_skia::Pixmap;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn style(shape: CursorShape) -> GlyphStyle<'static> {
        GlyphStyle { shape, size: 10.0, color: RED, glow: BLUE, image: None }
    }

    fn draw(style: &GlyphStyle<'_>) -> Vec<DrawCall> {
        let mut rec = Recorder::new(100, 100);
        render(&mut rec, Point::new(50.0, 50.0), style);
        rec.calls
    }

    #[test]
    fn filled_shapes_fill_twice_with_glow_on_second_pass() {
        for shape in [
            CursorShape::Circle,
            CursorShape::Square,
            CursorShape::Star,
            CursorShape::Heart,
            CursorShape::Triangle,
        ] {
            let calls = draw(&style(shape));
            let fills: Vec<usize> = calls
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == DrawCall::Fill)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(fills.len(), 2, "{shape:?}");
            let glow_on = calls.iter().position(|c| *c == DrawCall::Shadow { blur: SHAPE_GLOW, color: RED });
            let glow_on = glow_on.expect("glow enabled");
            assert!(fills[0] < glow_on && glow_on < fills[1], "{shape:?}");
            assert_eq!(calls.last(), Some(&DrawCall::Shadow { blur: 0.0, color: RED }));
            assert!(!calls.iter().any(|c| *c == DrawCall::Stroke));
        }
    }

    #[test]
    fn ring_is_stroked_without_glow() {
        let calls = draw(&style(CursorShape::Ring));
        assert!(calls.contains(&DrawCall::Arc { cx: 50.0, cy: 50.0, radius: 10.0, start: 0.0, end: TAU }));
        assert!(calls.contains(&DrawCall::LineWidth(RING_WIDTH)));
        assert!(calls.contains(&DrawCall::StrokeStyle(RED)));
        assert_eq!(calls.iter().filter(|c| **c == DrawCall::Stroke).count(), 1);
        assert!(!calls.iter().any(|c| matches!(c, DrawCall::Fill | DrawCall::Shadow { .. })));
    }

    #[test]
    fn square_is_centered_with_side_2r() {
        let calls = draw(&style(CursorShape::Square));
        assert!(calls.contains(&DrawCall::Rect { x: 40.0, y: 40.0, w: 20.0, h: 20.0 }));
    }

    #[test]
    fn star_alternates_outer_and_inner_radius() {
        let calls = draw(&style(CursorShape::Star));
        assert_eq!(calls[1], DrawCall::MoveTo { x: 50.0, y: 40.0 });
        let pts: Vec<(f32, f32)> = calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::LineTo { x, y } => Some((*x, *y)),
                _ => None,
            })
            .collect();
        // 5 outer + 5 inner + closing line back to the top
        assert_eq!(pts.len(), 11);
        for (i, (x, y)) in pts.iter().take(10).enumerate() {
            let d = ((x - 50.0).powi(2) + (y - 50.0).powi(2)).sqrt();
            let want = if i % 2 == 0 { 10.0 } else { 5.0 };
            assert!((d - want).abs() < 1e-3, "vertex {i}: {d}");
        }
        let (x0, y0) = pts[0];
        assert!((x0 - 50.0).abs() < 1e-3 && (y0 - 40.0).abs() < 1e-3, "first spike points up");
        assert!(calls.contains(&DrawCall::ClosePath));
    }

    #[test]
    fn triangle_vertices_are_offset_down() {
        let calls = draw(&style(CursorShape::Triangle));
        assert!(calls.contains(&DrawCall::MoveTo { x: 50.0, y: 42.0 }));
        assert!(calls.contains(&DrawCall::LineTo { x: 50.0 + 8.66, y: 57.0 }));
        assert!(calls.contains(&DrawCall::LineTo { x: 50.0 - 8.66, y: 57.0 }));
    }

    #[test]
    fn heart_uses_four_curves() {
        let calls = draw(&style(CursorShape::Heart));
        assert_eq!(calls.iter().filter(|c| matches!(c, DrawCall::BezierCurveTo { .. })).count(), 4);
        // starts at the notch between the lobes
        match calls[1] {
            DrawCall::MoveTo { x, y } => assert!((x - 50.0).abs() < 1e-4 && (y - 50.0).abs() < 1e-4),
            ref other => panic!("expected move_to, got {other:?}"),
        }
    }

    #[test]
    fn image_overrides_shape_and_glows_with_trail_color() {
        let bitmap = Bitmap::new(Pixmap::new(16, 16).unwrap());
        let s = GlyphStyle { image: Some(&bitmap), ..style(CursorShape::Star) };
        let calls = draw(&s);
        assert_eq!(
            calls,
            vec![
                DrawCall::Shadow { blur: IMAGE_GLOW, color: BLUE },
                DrawCall::DrawImage { width: 16, height: 16, x: 30.0, y: 30.0, w: 40.0, h: 40.0 },
                DrawCall::Shadow { blur: 0.0, color: BLUE },
            ]
        );
    }
}
