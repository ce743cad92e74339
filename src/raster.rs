// Software rasterizer behind the drawing surface: tiny-skia does the
// coverage, we keep the canvas-style path and style state around it.
// Visual: everything you see on the overlay ends up in `pixmap`.

use std::f32::consts::{FRAC_PI_2, TAU};

use tiny_skia::{
    BlendMode, ColorU8, FillRule, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::color::Color;
use crate::error::Error;
use crate::surface::{DrawingSurface, LineCap, LineJoin};
use crate::types::{Bitmap, FrameBuffer};

/// Box-blur passes used to approximate a gaussian glow.
const SHADOW_PASSES: usize = 3;

#[derive(Debug, Clone, Copy)]
enum PathOp {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    CubicTo(f32, f32, f32, f32, f32, f32),
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Style {
    global_alpha: f32,
    shadow_blur: f32,
    shadow_color: Color,
    line_width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    fill: Color,
    stroke: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            global_alpha: 1.0,
            shadow_blur: 0.0,
            shadow_color: Color::TRANSPARENT,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            fill: Color::BLACK,
            stroke: Color::BLACK,
        }
    }
}

/// A [`DrawingSurface`] that rasterizes into a premultiplied RGBA pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    ops: Vec<PathOp>,
    current: Option<(f32, f32)>, // last point of the current subpath
    subpath_start: Option<(f32, f32)>,
    style: Style,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, Error> {
        let pixmap = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| Error::Surface(format!("cannot allocate {width}x{height} pixmap")))?;
        Ok(Self { pixmap, ops: Vec::new(), current: None, subpath_start: None, style: Style::default() })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Copy the frame into a window buffer as 0xAARRGGBB (premultiplied).
    pub fn write_to(&self, fb: &mut FrameBuffer) {
        let (w, h) = (self.pixmap.width() as usize, self.pixmap.height() as usize);
        if fb.width != w || fb.height != h {
            fb.resize(w, h);
        }
        for (dst, p) in fb.pixels.iter_mut().zip(self.pixmap.pixels()) {
            *dst = (p.alpha() as u32) << 24 | (p.red() as u32) << 16 | (p.green() as u32) << 8 | p.blue() as u32;
        }
    }

    fn build_path(&self) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for op in &self.ops {
            match *op {
                PathOp::MoveTo(x, y) => pb.move_to(x, y),
                PathOp::LineTo(x, y) => pb.line_to(x, y),
                PathOp::CubicTo(x1, y1, x2, y2, x, y) => pb.cubic_to(x1, y1, x2, y2, x, y),
                PathOp::Close => pb.close(),
            }
        }
        pb.finish()
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(skia_color(color, self.style.global_alpha));
        paint.anti_alias = true;
        paint
    }

    fn stroke_props(&self) -> Stroke {
        Stroke {
            width: self.style.line_width,
            line_cap: self.style.line_cap,
            line_join: self.style.line_join,
            ..Stroke::default()
        }
    }

    fn shadow_on(&self) -> bool {
        self.style.shadow_blur > 0.0 && self.style.shadow_color.a > 0.0
    }

    /// Draw a blurred, tinted copy of whatever `silhouette` paints under the
    /// next shape. `bounds` is the shape's extent in surface coordinates.
    fn draw_shadow(&mut self, bounds: Rect, silhouette: impl FnOnce(&mut Pixmap, Transform)) {
        let blur = self.style.shadow_blur;
        let pad = (blur * 2.0).ceil();
        let x0 = (bounds.left() - pad).floor();
        let y0 = (bounds.top() - pad).floor();
        let w = (bounds.width() + pad * 2.0).ceil() as u32 + 1;
        let h = (bounds.height() + pad * 2.0).ceil() as u32 + 1;
        let Some(mut scratch) = Pixmap::new(w, h) else { return };

        silhouette(&mut scratch, Transform::from_translate(-x0, -y0));

        // Tint the coverage with the shadow color
        let tint = self.style.shadow_color;
        let alpha = tint.a * self.style.global_alpha;
        for p in scratch.pixels_mut() {
            let a = (p.alpha() as f32 / 255.0 * alpha * 255.0).round() as u8;
            *p = ColorU8::from_rgba(tint.r, tint.g, tint.b, a).premultiply();
        }

        let radius = blur_radius(blur);
        let (w, h) = (w as usize, h as usize);
        let mut tmp = vec![0u8; w * h * 4];
        for _ in 0..SHADOW_PASSES {
            box_blur_rgba(scratch.data_mut(), &mut tmp, w, h, radius);
        }

        self.pixmap.draw_pixmap(
            x0 as i32,
            y0 as i32,
            scratch.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn push_op(&mut self, op: PathOp) {
        match op {
            PathOp::MoveTo(x, y) => {
                self.current = Some((x, y));
                self.subpath_start = Some((x, y));
            }
            PathOp::LineTo(x, y) | PathOp::CubicTo(_, _, _, _, x, y) => self.current = Some((x, y)),
            PathOp::Close => self.current = self.subpath_start,
        }
        self.ops.push(op);
    }
}

/// Our color at `global_alpha` as a tiny-skia color.
fn skia_color(color: Color, global_alpha: f32) -> tiny_skia::Color {
    let mut c = tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255);
    c.set_alpha((color.a * global_alpha).clamp(0.0, 1.0));
    c
}

/// Box radius for one of the three passes, so the sum reads like a canvas
/// `shadowBlur` (which is twice the gaussian sigma).
pub fn blur_radius(shadow_blur: f32) -> usize {
    ((shadow_blur * 0.5).round() as usize).max(1)
}

/// Separable box blur over premultiplied RGBA bytes, in place.
/// Edges are extended, so keep a transparent border around the content.
pub fn box_blur_rgba(pixels: &mut [u8], tmp: &mut [u8], width: usize, height: usize, radius: usize) {
    if width == 0 || height == 0 || pixels.len() < width * height * 4 || tmp.len() < pixels.len() {
        return;
    }
    blur_pass(pixels, tmp, width, height, radius, Axis::Horizontal);
    blur_pass(tmp, pixels, width, height, radius, Axis::Vertical);
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// One sliding-window pass: `src` averaged along `axis` into `dst`.
fn blur_pass(src: &[u8], dst: &mut [u8], width: usize, height: usize, radius: usize, axis: Axis) {
    let (lines, len) = match axis {
        Axis::Horizontal => (height, width),
        Axis::Vertical => (width, height),
    };
    let at = |line: usize, i: usize| -> usize {
        match axis {
            Axis::Horizontal => (line * width + i) * 4,
            Axis::Vertical => (i * width + line) * 4,
        }
    };
    let r = radius as i64;
    let last = len as i64 - 1;
    let win = (2 * radius + 1) as u32;

    for line in 0..lines {
        // Window sum primed with the first pixel repeated r + 1 times
        let first = at(line, 0);
        let mut sum = [0u32; 4];
        for c in 0..4 {
            sum[c] = src[first + c] as u32 * (radius as u32 + 1);
        }
        for i in 1..=r {
            let idx = at(line, i.min(last) as usize);
            for c in 0..4 {
                sum[c] += src[idx + c] as u32;
            }
        }

        for i in 0..len as i64 {
            let out = at(line, i as usize);
            for c in 0..4 {
                dst[out + c] = (sum[c] / win) as u8;
            }

            // Slide: drop the left end, take the next one on the right
            let sub = at(line, (i - r).max(0) as usize);
            let add = at(line, (i + r + 1).min(last) as usize);
            for c in 0..4 {
                sum[c] = sum[c] + src[add + c] as u32 - src[sub + c] as u32;
            }
        }
    }
}

/// Cubic approximation of a circular arc, at most a quarter turn per piece.
/// Returns the start point and the curve segments.
fn arc_segments(cx: f32, cy: f32, r: f32, start: f32, end: f32) -> ((f32, f32), Vec<[f32; 6]>) {
    let sweep = if end - start >= TAU { TAU } else { (end - start).rem_euclid(TAU) };
    let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / pieces as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let point = |a: f32| (cx + r * a.cos(), cy + r * a.sin());
    let mut segments = Vec::with_capacity(pieces);
    let mut a0 = start;
    for _ in 0..pieces {
        let a1 = a0 + step;
        let (x0, y0) = point(a0);
        let (x1, y1) = point(a1);
        segments.push([
            x0 - k * r * a0.sin(),
            y0 + k * r * a0.cos(),
            x1 + k * r * a1.sin(),
            y1 - k * r * a1.cos(),
            x1,
            y1,
        ]);
        a0 = a1;
    }
    (point(start), segments)
}

impl DrawingSurface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        // A minimized window reports 0x0; the pixmap never goes below 1x1
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.size() {
            return;
        }
        match Pixmap::new(width, height) {
            Some(pixmap) => {
                tracing::debug!(width, height, "Surface resized");
                self.pixmap = pixmap;
            }
            None => tracing::warn!(width, height, "Cannot allocate surface, keeping the old size"),
        }
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else { return };
        let mut paint = Paint::default();
        paint.blend_mode = BlendMode::Clear;
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn begin_path(&mut self) {
        self.ops.clear();
        self.current = None;
        self.subpath_start = None;
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push_op(PathOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        if self.current.is_none() {
            self.push_op(PathOp::MoveTo(x, y));
        } else {
            self.push_op(PathOp::LineTo(x, y));
        }
    }

    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        if self.current.is_none() {
            self.push_op(PathOp::MoveTo(c1x, c1y));
        }
        self.push_op(PathOp::CubicTo(c1x, c1y, c2x, c2y, x, y));
    }

    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        if radius <= 0.0 || !radius.is_finite() {
            return;
        }
        let ((sx, sy), segments) = arc_segments(cx, cy, radius, start, end);
        if self.current.is_none() {
            self.push_op(PathOp::MoveTo(sx, sy));
        } else {
            self.push_op(PathOp::LineTo(sx, sy));
        }
        for [x1, y1, x2, y2, x, y] in segments {
            self.push_op(PathOp::CubicTo(x1, y1, x2, y2, x, y));
        }
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.push_op(PathOp::MoveTo(x, y));
        self.push_op(PathOp::LineTo(x + w, y));
        self.push_op(PathOp::LineTo(x + w, y + h));
        self.push_op(PathOp::LineTo(x, y + h));
        self.push_op(PathOp::Close);
    }

    fn close_path(&mut self) {
        if self.current.is_some() {
            self.push_op(PathOp::Close);
        }
    }

    fn fill(&mut self) {
        let Some(path) = self.build_path() else { return };
        if self.shadow_on() {
            self.draw_shadow(path.bounds(), |pm, ts| {
                let mut paint = Paint::default();
                paint.anti_alias = true;
                pm.fill_path(&path, &paint, FillRule::Winding, ts, None);
            });
        }
        let paint = self.paint(self.style.fill);
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn stroke(&mut self) {
        let Some(path) = self.build_path() else { return };
        let stroke = self.stroke_props();
        if self.shadow_on() {
            let half = stroke.width / 2.0;
            let b = path.bounds();
            if let Some(bounds) = Rect::from_ltrb(b.left() - half, b.top() - half, b.right() + half, b.bottom() + half) {
                self.draw_shadow(bounds, |pm, ts| {
                    let mut paint = Paint::default();
                    paint.anti_alias = true;
                    pm.stroke_path(&path, &paint, &stroke, ts, None);
                });
            }
        }
        let paint = self.paint(self.style.stroke);
        self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn draw_image(&mut self, image: &Bitmap, x: f32, y: f32, w: f32, h: f32) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let sx = w / image.width() as f32;
        let sy = h / image.height() as f32;
        let place = Transform::from_row(sx, 0.0, 0.0, sy, x, y);
        let src = image.pixmap().as_ref();

        if self.shadow_on() {
            if let Some(bounds) = Rect::from_xywh(x, y, w, h) {
                self.draw_shadow(bounds, |pm, ts| {
                    pm.draw_pixmap(0, 0, src, &PixmapPaint::default(), ts.pre_concat(place), None);
                });
            }
        }

        let paint = PixmapPaint {
            opacity: self.style.global_alpha,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(0, 0, src, &paint, place, None);
    }

    // Out-of-range values are ignored, as a canvas does
    fn set_global_alpha(&mut self, alpha: f32) {
        if (0.0..=1.0).contains(&alpha) {
            self.style.global_alpha = alpha;
        }
    }

    fn set_shadow(&mut self, blur: f32, color: Color) {
        if blur.is_finite() && blur >= 0.0 {
            self.style.shadow_blur = blur;
        }
        self.style.shadow_color = color;
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.style.line_width = width;
        }
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.style.line_cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.style.line_join = join;
    }

    fn set_fill_style(&mut self, color: Color) {
        self.style.fill = color;
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.style.stroke = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_at(s: &PixmapSurface, x: u32, y: u32) -> u8 {
        s.pixmap().pixel(x, y).unwrap().alpha()
    }

    fn red_disk(s: &mut PixmapSurface) {
        s.begin_path();
        s.arc(50.0, 50.0, 10.0, 0.0, TAU);
        s.set_fill_style(Color::rgb(255, 0, 0));
        s.fill();
    }

    #[test]
    fn fill_covers_the_disk_only() {
        let mut s = PixmapSurface::new(100, 100).unwrap();
        red_disk(&mut s);
        let center = s.pixmap().pixel(50, 50).unwrap();
        assert_eq!((center.red(), center.alpha()), (255, 255));
        assert_eq!(alpha_at(&s, 70, 50), 0);
        assert_eq!(alpha_at(&s, 50, 35), 0);
    }

    #[test]
    fn global_alpha_scales_paint() {
        let mut s = PixmapSurface::new(100, 100).unwrap();
        s.set_global_alpha(0.5);
        red_disk(&mut s);
        let a = alpha_at(&s, 50, 50);
        assert!((126..=129).contains(&a), "{a}");

        // out of range: ignored
        s.set_global_alpha(2.0);
        s.clear_rect(0.0, 0.0, 100.0, 100.0);
        red_disk(&mut s);
        let a = alpha_at(&s, 50, 50);
        assert!((126..=129).contains(&a), "{a}");
    }

    #[test]
    fn clear_rect_wipes_pixels() {
        let mut s = PixmapSurface::new(100, 100).unwrap();
        red_disk(&mut s);
        s.clear_rect(0.0, 0.0, 100.0, 100.0);
        assert!(s.pixmap().pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn shadow_glows_outside_the_shape() {
        let mut s = PixmapSurface::new(100, 100).unwrap();
        s.set_shadow(10.0, Color::rgb(0, 0, 255));
        red_disk(&mut s);
        // 3px outside the disk edge
        let glow = s.pixmap().pixel(63, 50).unwrap();
        assert!(glow.alpha() > 0);
        assert!(glow.blue() > 0 && glow.red() == 0);

        let mut plain = PixmapSurface::new(100, 100).unwrap();
        red_disk(&mut plain);
        assert_eq!(alpha_at(&plain, 63, 50), 0);
    }

    #[test]
    fn zero_line_width_keeps_previous() {
        let mut s = PixmapSurface::new(10, 10).unwrap();
        s.set_line_width(4.0);
        s.set_line_width(0.0);
        assert_eq!(s.stroke_props().width, 4.0);
    }

    #[test]
    fn stroke_draws_a_line() {
        let mut s = PixmapSurface::new(100, 100).unwrap();
        s.set_line_width(4.0);
        s.set_stroke_style(Color::WHITE);
        s.begin_path();
        s.move_to(10.0, 50.0);
        s.line_to(90.0, 50.0);
        s.stroke();
        assert_eq!(alpha_at(&s, 50, 50), 255);
        assert_eq!(alpha_at(&s, 50, 40), 0);
    }

    #[test]
    fn image_is_scaled_into_destination() {
        let mut src = Pixmap::new(2, 2).unwrap();
        src.fill(tiny_skia::Color::from_rgba8(0, 255, 0, 255));
        let bitmap = Bitmap::new(src);

        let mut s = PixmapSurface::new(100, 100).unwrap();
        s.draw_image(&bitmap, 20.0, 20.0, 40.0, 40.0);
        assert!(s.pixmap().pixel(40, 40).unwrap().green() >= 250);
        assert_eq!(alpha_at(&s, 70, 70), 0);
    }

    #[test]
    fn arc_quarter_pieces_stay_on_circle() {
        let ((sx, sy), segments) = arc_segments(0.0, 0.0, 10.0, 0.0, TAU);
        assert_eq!(segments.len(), 4);
        assert!((sx - 10.0).abs() < 1e-4 && sy.abs() < 1e-4);
        for seg in &segments {
            let d = (seg[4].powi(2) + seg[5].powi(2)).sqrt();
            assert!((d - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn box_blur_spreads_a_single_pixel() {
        let (w, h) = (9, 9);
        let mut px = vec![0u8; w * h * 4];
        let mid = (4 * w + 4) * 4;
        px[mid..mid + 4].copy_from_slice(&[255, 255, 255, 255]);
        let mut tmp = vec![0u8; px.len()];
        box_blur_rgba(&mut px, &mut tmp, w, h, 1);

        let at = |x: usize, y: usize| px[(y * w + x) * 4 + 3];
        assert!(at(4, 4) > 0 && at(4, 4) < 255);
        assert!(at(3, 3) > 0);
        assert_eq!(at(1, 1), 0);
    }

    #[test]
    fn framebuffer_gets_argb() {
        let mut s = PixmapSurface::new(4, 4).unwrap();
        s.set_fill_style(Color::rgb(255, 0, 0));
        s.begin_path();
        s.rect(0.0, 0.0, 4.0, 4.0);
        s.fill();

        let mut fb = FrameBuffer::new(1, 1);
        s.write_to(&mut fb);
        assert_eq!((fb.width, fb.height), (4, 4));
        assert!(fb.pixels.iter().all(|p| *p == 0xFFFF_0000));
    }

    #[test]
    fn resize_changes_size() {
        let mut s = PixmapSurface::new(10, 10).unwrap();
        s.resize(30, 20);
        assert_eq!(s.size(), (30, 20));
    }

    #[test]
    fn zero_size_keeps_a_one_pixel_surface() {
        let mut s = PixmapSurface::new(10, 10).unwrap();
        s.resize(0, 0);
        assert_eq!(s.size(), (1, 1));
        s.set_fill_style(Color::rgb(255, 0, 0));
        s.begin_path();
        s.rect(0.0, 0.0, 1.0, 1.0);
        s.fill();
        // same clamped size: the pixmap, and what's on it, stays
        s.resize(0, 0);
        assert_eq!(alpha_at(&s, 0, 0), 255);
    }
}
