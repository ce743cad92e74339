// The on-screen overlay: a borderless, always-on-top, transparent window.
// Visual: the trail and cursor float over whatever is underneath.

use crate::error::Error;
use crate::overlay::Host;
use crate::types::FrameBuffer;
use minifb::{Key, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,      // the overlay window you see
    visible: bool,       // false: present an empty frame instead
    cursor_hidden: bool, // native pointer state as last requested
    blank: Vec<u32>,     // fully transparent frame for the hidden state
}

impl Drawer {
    /// Open the overlay window.
    /// Visual: nothing yet; the window is transparent until the first frame.
    pub fn new(title: &str, width: usize, height: usize, fps: usize) -> Result<Self, Error> {
        let options = WindowOptions {
            borderless: true,
            title: false,
            resize: true,
            topmost: true,
            transparency: true,
            ..WindowOptions::default()
        };
        let mut window = Window::new(title, width, height, options).map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(fps);

        Ok(Self { window, visible: true, cursor_hidden: false, blank: Vec::new() })
    }

    /// Push this frame's pixels to the screen (or a blank one while hidden).
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        let (w, h) = (framebuffer.width, framebuffer.height);
        let pixels = if self.visible {
            &framebuffer.pixels
        } else {
            self.blank.clear();
            self.blank.resize(w * h, 0);
            &self.blank
        };
        self.window
            .update_with_buffer(pixels, w, h)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Returns false when the window was closed.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while ESC is held down.
    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Pointer position in window pixels, `None` while it's outside.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Discard)
    }

    /// Current inner size; changes when the user resizes the window.
    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }
}

impl Host for Drawer {
    fn set_system_cursor_hidden(&mut self, hidden: bool) {
        if hidden != self.cursor_hidden {
            tracing::debug!(hidden, "System cursor visibility");
        }
        self.cursor_hidden = hidden;
        self.window.set_cursor_visibility(!hidden);
    }

    fn set_overlay_visible(&mut self, visible: bool) {
        if visible != self.visible {
            tracing::debug!(visible, "Overlay visibility");
        }
        self.visible = visible;
    }
}
