// Core types shared by the renderers and the window.

use std::sync::Arc;

use tiny_skia::Pixmap;

/// Pixels handed to the window each frame.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // overlay width on screen (pixels)
    pub height: usize,     // overlay height on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0xAARRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Reallocate for a new window size. Contents are cleared.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
    }
}

/// A pointer position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Where the pointer starts: off-screen, so nothing renders at the origin
    /// before the first move.
    pub const OFFSCREEN: Point = Point::new(-100.0, -100.0);
}

/// A decoded, drawable image. Cheap to clone; the pixels are shared.
#[derive(Clone)]
pub struct Bitmap {
    pixmap: Arc<Pixmap>,
}

impl Bitmap {
    pub fn new(pixmap: Pixmap) -> Self {
        Self { pixmap: Arc::new(pixmap) }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bitmap({}x{})", self.width(), self.height())
    }
}
