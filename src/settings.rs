// Settings file: `[cursor]` holds the overlay options by their external
// names, `[app]` the process-level knobs. The watcher re-reads the file when
// it changes on disk and hands back the options that differ.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::config::{OptionKey, OptionValue};
use crate::error::Error;

pub const DEFAULT_FPS: usize = 60;
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub cursor: toml::Table,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub asset_root: Option<PathBuf>, // base for relative image paths
    pub target_fps: usize,
    pub debug: bool,
    pub seed: Option<u64>,           // fixed particle randomness
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { asset_root: None, target_fps: DEFAULT_FPS, debug: false, seed: None }
    }
}

impl Settings {
    /// Read `path`. A missing file is not an error: defaults apply.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::SettingsRead { path: path.to_path_buf(), reason: e.to_string() })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::SettingsParse { path: path.to_path_buf(), reason: e.to_string() })
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cursor-trail")
            .join("config.toml")
    }

    /// Every `[cursor]` entry as an option change, in key order.
    pub fn cursor_options(&self) -> Vec<(String, OptionValue)> {
        self.cursor.iter().filter_map(|(k, v)| Some((k.clone(), option_value(k, v)?))).collect()
    }
}

/// TOML scalar to option value. Tables and arrays are not options.
fn option_value(key: &str, value: &toml::Value) -> Option<OptionValue> {
    match value {
        toml::Value::Boolean(b) => Some(OptionValue::Bool(*b)),
        toml::Value::Integer(i) => Some(OptionValue::Int(*i)),
        toml::Value::Float(f) => Some(OptionValue::Float(*f)),
        toml::Value::String(s) => Some(OptionValue::Text(s.clone())),
        other => {
            tracing::warn!(option = key, "Ignoring {} value", other.type_str());
            None
        }
    }
}

/// Changes needed to go from `old` to `new`: changed or added entries, plus
/// the default for every known option that disappeared.
pub fn diff(old: &toml::Table, new: &toml::Table) -> Vec<(String, OptionValue)> {
    let mut changes = Vec::new();
    for (key, value) in new {
        if old.get(key) != Some(value) {
            if let Some(v) = option_value(key, value) {
                changes.push((key.clone(), v));
            }
        }
    }
    for key in old.keys().filter(|k| !new.contains_key(*k)) {
        if let Ok(option) = key.parse::<OptionKey>() {
            changes.push((key.clone(), option.default_value()));
        }
    }
    changes
}

/// Polls the settings file's modification time.
pub struct SettingsWatcher {
    path: PathBuf,
    applied: toml::Table,
    modified: Option<SystemTime>,
    last_check: Instant,
    interval: Duration,
}

impl SettingsWatcher {
    /// `applied` is the `[cursor]` table already in effect.
    pub fn new(path: PathBuf, applied: toml::Table) -> Self {
        let modified = modified_time(&path);
        Self { path, applied, modified, last_check: Instant::now(), interval: POLL_INTERVAL }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Option changes since the last reload, or nothing when the interval
    /// hasn't elapsed or the file is untouched. A broken file is reported
    /// and skipped; the previous options stay in effect.
    pub fn poll(&mut self, now: Instant) -> Vec<(String, OptionValue)> {
        if now.duration_since(self.last_check) < self.interval {
            return Vec::new();
        }
        self.last_check = now;

        let modified = modified_time(&self.path);
        if modified == self.modified {
            return Vec::new();
        }
        self.modified = modified;

        let next = if modified.is_none() {
            // deleted: every option goes back to its default
            toml::Table::new()
        } else {
            match Settings::load(&self.path) {
                Ok(settings) => settings.cursor,
                Err(e) => {
                    tracing::warn!("Settings reload failed: {e}");
                    return Vec::new();
                }
            }
        };

        let changes = diff(&self.applied, &next);
        if !changes.is_empty() {
            tracing::debug!(path = %self.path.display(), count = changes.len(), "Settings changed");
        }
        self.applied = next;
        changes
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Table {
        src.parse::<toml::Table>().unwrap()
    }

    #[test]
    fn parses_both_sections() {
        let s = Settings::parse(
            Path::new("test.toml"),
            r##"
            [app]
            target_fps = 30
            seed = 42

            [cursor]
            cursorShape = "star"
            trailLength = 12
            rainbowMode = false
            baseColor = "#00ff00"
            "##,
        )
        .unwrap();

        assert_eq!(s.app.target_fps, 30);
        assert_eq!(s.app.seed, Some(42));
        assert!(!s.app.debug);
        let opts = s.cursor_options();
        assert!(opts.contains(&("cursorShape".to_string(), OptionValue::Text("star".into()))));
        assert!(opts.contains(&("trailLength".to_string(), OptionValue::Int(12))));
        assert!(opts.contains(&("rainbowMode".to_string(), OptionValue::Bool(false))));
    }

    #[test]
    fn empty_file_gives_defaults() {
        let s = Settings::parse(Path::new("empty.toml"), "").unwrap();
        assert_eq!(s.app.target_fps, DEFAULT_FPS);
        assert!(s.cursor.is_empty());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = Settings::parse(Path::new("bad.toml"), "[cursor\nx=").unwrap_err();
        assert!(matches!(err, Error::SettingsParse { .. }));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = Settings::load(Path::new("/nonexistent/cursor-trail/config.toml")).unwrap();
        assert!(s.cursor.is_empty());
    }

    #[test]
    fn diff_reports_changes_and_removals() {
        let old = table("trailLength = 10\ncursorSize = 4\nenable = true");
        let new = table("trailLength = 10\ncursorSize = 6\ntrailStyle = \"image\"");
        let mut changes = diff(&old, &new);
        changes.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            changes,
            vec![
                ("cursorSize".to_string(), OptionValue::Int(6)),
                ("enable".to_string(), OptionValue::Bool(true)),
                ("trailStyle".to_string(), OptionValue::Text("image".into())),
            ]
        );
    }

    #[test]
    fn arrays_are_not_options() {
        let new = table("baseColor = [1, 2, 3]");
        assert!(diff(&toml::Table::new(), &new).is_empty());
    }

    #[test]
    fn watcher_picks_up_edits() {
        let dir = std::env::temp_dir().join(format!("cursor-trail-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[cursor]\ntrailLength = 10\n").unwrap();

        let initial = Settings::load(&path).unwrap().cursor;
        let mut watcher = SettingsWatcher::new(path.clone(), initial).with_interval(Duration::ZERO);
        assert!(watcher.poll(Instant::now()).is_empty());

        // make sure the mtime moves even on coarse filesystems
        std::thread::sleep(Duration::from_millis(1100));
        fs::write(&path, "[cursor]\ntrailLength = 5\n").unwrap();
        assert_eq!(watcher.poll(Instant::now()), vec![("trailLength".to_string(), OptionValue::Int(5))]);

        fs::remove_file(&path).unwrap();
        assert_eq!(watcher.poll(Instant::now()), vec![("trailLength".to_string(), OptionValue::Int(20))]);

        let _ = fs::remove_dir_all(dir);
    }
}
