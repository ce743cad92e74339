// Image loading for the cursor glyph and the image trail.
// Loads run on worker threads; results come back over a channel that the
// overlay drains once per tick.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tiny_skia::{ColorU8, Pixmap};
use url::Url;

use crate::error::Error;
use crate::types::Bitmap;

/// Images larger than this are refused before decoding.
const MAX_IMAGE_BYTES: u64 = 8 * 1024 * 1024;
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Which slot a load is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Cursor,
    Trail,
}

/// A finished load. `source` is the string the request was made with.
#[derive(Debug)]
pub struct LoadResult {
    pub target: ImageTarget,
    pub source: String,
    pub outcome: Result<Bitmap, Error>,
}

/// Resolves image sources to bitmaps without blocking the frame loop.
pub trait ImageLoader {
    /// Start loading `source` for `target`. Completion is reported later
    /// through [`ImageLoader::completed`], possibly out of order.
    fn request(&mut self, target: ImageTarget, source: &str);

    /// Everything that finished since the last call.
    fn completed(&mut self) -> Vec<LoadResult>;
}

/// Where a source string points.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Http(String),
    File(PathBuf),
}

impl ImageSource {
    /// `http(s)://` goes over the network, `file://` and plain paths are read
    /// from disk. Relative paths are taken against `asset_root` when given.
    pub fn resolve(source: &str, asset_root: Option<&Path>) -> Result<Self, Error> {
        let fetch_err = |reason: String| Error::ImageFetch { source_ref: source.to_string(), reason };

        match Url::parse(source) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(ImageSource::Http(url.to_string())),
                "file" => url
                    .to_file_path()
                    .map(ImageSource::File)
                    .map_err(|_| fetch_err("not a local file URL".to_string())),
                // "C:\cursor.png" parses as a URL with a one-letter scheme
                scheme if scheme.len() == 1 => Ok(ImageSource::File(PathBuf::from(source))),
                scheme => Err(fetch_err(format!("unsupported scheme `{scheme}`"))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = Path::new(source);
                match asset_root {
                    Some(root) if path.is_relative() => Ok(ImageSource::File(root.join(path))),
                    _ => Ok(ImageSource::File(path.to_path_buf())),
                }
            }
            Err(e) => Err(fetch_err(e.to_string())),
        }
    }
}

/// Read the raw bytes behind `source`.
fn fetch(source_ref: &str, source: &ImageSource) -> Result<Vec<u8>, Error> {
    let fetch_err = |reason: String| Error::ImageFetch { source_ref: source_ref.to_string(), reason };

    match source {
        ImageSource::File(path) => std::fs::read(path).map_err(|e| fetch_err(e.to_string())),
        ImageSource::Http(url) => {
            let response = ureq::get(url)
                .timeout(FETCH_TIMEOUT)
                .call()
                .map_err(|e| fetch_err(e.to_string()))?;

            if let Some(len) = response.header("Content-Length").and_then(|s| s.parse::<u64>().ok()) {
                if len > MAX_IMAGE_BYTES {
                    return Err(fetch_err(format!("{len} bytes is too large")));
                }
            }

            let mut bytes = Vec::new();
            response
                .into_reader()
                .take(MAX_IMAGE_BYTES)
                .read_to_end(&mut bytes)
                .map_err(|e| fetch_err(e.to_string()))?;
            Ok(bytes)
        }
    }
}

/// Decode encoded image bytes into a premultiplied bitmap.
pub fn decode(source_ref: &str, bytes: &[u8]) -> Result<Bitmap, Error> {
    let decode_err = |reason: String| Error::ImageDecode { source_ref: source_ref.to_string(), reason };

    let rgba = image::load_from_memory(bytes).map_err(|e| decode_err(e.to_string()))?.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut pixmap = Pixmap::new(w, h).ok_or_else(|| decode_err(format!("unusable size {w}x{h}")))?;

    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(Bitmap::new(pixmap))
}

/// Fetch + decode in one go. Blocking; the threaded loader calls this off the
/// frame loop.
pub fn load(source: &str, asset_root: Option<&Path>) -> Result<Bitmap, Error> {
    let resolved = ImageSource::resolve(source, asset_root)?;
    let bytes = fetch(source, &resolved)?;
    decode(source, &bytes)
}

/// One short-lived thread per request.
pub struct ThreadedLoader {
    asset_root: Option<PathBuf>,
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
}

impl ThreadedLoader {
    pub fn new(asset_root: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { asset_root, tx, rx }
    }
}

impl ImageLoader for ThreadedLoader {
    fn request(&mut self, target: ImageTarget, source: &str) {
        let tx = self.tx.clone();
        let root = self.asset_root.clone();
        let source = source.to_string();

        tracing::debug!(?target, %source, "Loading image");
        thread::spawn(move || {
            let outcome = load(&source, root.as_deref());
            // The receiver is gone only when the overlay was dropped
            let _ = tx.send(LoadResult { target, source, outcome });
        });
    }

    fn completed(&mut self) -> Vec<LoadResult> {
        self.rx.try_iter().collect()
    }
}
