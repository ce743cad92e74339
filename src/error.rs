// One error type for the whole crate.
// Every variant states *where* things went wrong.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the overlay window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Pushing the frame to the window failed
    #[error("Surface error: {0}")]
    Surface(String), // Allocating or resizing the pixmap failed

    #[error("Image fetch error ({source_ref}): {reason}")]
    ImageFetch { source_ref: String, reason: String }, // URL/path could not be read
    #[error("Image decode error ({source_ref}): {reason}")]
    ImageDecode { source_ref: String, reason: String }, // Bytes were not a usable bitmap

    #[error("Unknown option `{0}`")]
    UnknownOption(String), // Key not in the option registry
    #[error("Invalid value for `{key}`: {reason}")]
    InvalidOption { key: String, reason: String }, // Wrong type, bad enum name, bad color

    #[error("Settings read error ({}): {reason}", path.display())]
    SettingsRead { path: PathBuf, reason: String }, // Settings file unreadable
    #[error("Settings parse error ({}): {reason}", path.display())]
    SettingsParse { path: PathBuf, reason: String }, // Settings file not valid TOML
}

impl Error {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Error::InvalidOption { key: key.to_string(), reason: reason.into() }
    }
}
