//! Animated cursor overlay: a glyph at the pointer with a fading line,
//! stamped-image or particle trail behind it.

pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod glyph;
pub mod history;
pub mod loader;
pub mod logging;
pub mod overlay;
pub mod particles;
pub mod raster;
pub mod settings;
pub mod surface;
pub mod trail;
pub mod types;
pub mod window;

pub use config::{Config, ConfigBridge, OptionKey, OptionValue};
pub use driver::{AnimationDriver, LoopHandle, TickOutcome};
pub use error::Error;
pub use overlay::{Host, Overlay};
