//! The 2D drawing contract the renderers draw through.
//!
//! It is deliberately canvas-shaped: a current path built with `move_to` /
//! `line_to` / ..., then `fill` or `stroke` using whatever style state is set
//! at that moment. [`crate::raster::PixmapSurface`] rasterizes it; [`Recorder`]
//! just remembers every call, which is what the tests look at.

pub use tiny_skia::{LineCap, LineJoin};

use crate::color::Color;
use crate::types::Bitmap;

pub trait DrawingSurface {
    /// Current size in pixels.
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    // Path building
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32);
    /// Circular arc around (cx, cy), angles in radians, clockwise on screen.
    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32);
    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn close_path(&mut self);

    fn fill(&mut self);
    fn stroke(&mut self);

    /// Blit `image` scaled into the destination rectangle.
    fn draw_image(&mut self, image: &Bitmap, x: f32, y: f32, w: f32, h: f32);

    // Style state
    fn set_global_alpha(&mut self, alpha: f32);
    /// Glow drawn under every following fill/stroke/image. `blur == 0` turns it off.
    fn set_shadow(&mut self, blur: f32, color: Color);
    fn set_line_width(&mut self, width: f32);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Resize { width: u32, height: u32 },
    ClearRect { x: f32, y: f32, w: f32, h: f32 },
    BeginPath,
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    BezierCurveTo { c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32 },
    Arc { cx: f32, cy: f32, radius: f32, start: f32, end: f32 },
    Rect { x: f32, y: f32, w: f32, h: f32 },
    ClosePath,
    Fill,
    Stroke,
    DrawImage { width: u32, height: u32, x: f32, y: f32, w: f32, h: f32 },
    GlobalAlpha(f32),
    Shadow { blur: f32, color: Color },
    LineWidth(f32),
    LineCap(LineCap),
    LineJoin(LineJoin),
    FillStyle(Color),
    StrokeStyle(Color),
}

/// A surface that draws nothing and records everything.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<DrawCall>,
    width: u32,
    height: u32,
}

impl Recorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self { calls: Vec::new(), width, height }
    }

    /// Forget everything recorded so far.
    pub fn take(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl DrawingSurface for Recorder {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.calls.push(DrawCall::Resize { width, height });
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.calls.push(DrawCall::ClearRect { x, y, w, h });
    }

    fn begin_path(&mut self) {
        self.calls.push(DrawCall::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.calls.push(DrawCall::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.calls.push(DrawCall::LineTo { x, y });
    }

    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.calls.push(DrawCall::BezierCurveTo { c1x, c1y, c2x, c2y, x, y });
    }

    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        self.calls.push(DrawCall::Arc { cx, cy, radius, start, end });
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.calls.push(DrawCall::Rect { x, y, w, h });
    }

    fn close_path(&mut self) {
        self.calls.push(DrawCall::ClosePath);
    }

    fn fill(&mut self) {
        self.calls.push(DrawCall::Fill);
    }

    fn stroke(&mut self) {
        self.calls.push(DrawCall::Stroke);
    }

    fn draw_image(&mut self, image: &Bitmap, x: f32, y: f32, w: f32, h: f32) {
        self.calls.push(DrawCall::DrawImage {
            width: image.width(),
            height: image.height(),
            x,
            y,
            w,
            h,
        });
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.calls.push(DrawCall::GlobalAlpha(alpha));
    }

    fn set_shadow(&mut self, blur: f32, color: Color) {
        self.calls.push(DrawCall::Shadow { blur, color });
    }

    fn set_line_width(&mut self, width: f32) {
        self.calls.push(DrawCall::LineWidth(width));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.calls.push(DrawCall::LineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.calls.push(DrawCall::LineJoin(join));
    }

    fn set_fill_style(&mut self, color: Color) {
        self.calls.push(DrawCall::FillStyle(color));
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.calls.push(DrawCall::StrokeStyle(color));
    }
}
