//! Typed configuration snapshot and the bridge that applies option changes.
//!
//! Options arrive as loosely typed `(key, value)` pairs from whatever store
//! backs them (the settings file, `--set` on the command line). The bridge
//! validates each change and swaps in a fresh [`Config`]; nothing ever
//! mutates a snapshot in place.

use std::fmt;
use std::str::FromStr;

use crate::color::Color;
use crate::error::Error;

pub const TRAIL_LENGTH_RANGE: (i64, i64) = (2, 100);
pub const CURSOR_SIZE_RANGE: (i64, i64) = (1, 30);

/// Shape drawn at the pointer when no cursor image is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Circle,
    Ring,
    Square,
    Star,
    Heart,
    Triangle,
}

/// Which trail is drawn behind the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailStyle {
    #[default]
    Simple,
    Image,
    Particles,
}

impl TrailStyle {
    /// Styles fed by the pointer history buffer.
    pub fn uses_history(self) -> bool {
        matches!(self, TrailStyle::Simple | TrailStyle::Image)
    }
}

/// Particle physics profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticlePreset {
    #[default]
    Spread,
    Fire,
    Snow,
    Sparkle,
}

macro_rules! named_enum {
    ($ty:ty, $label:literal, { $($name:literal => $variant:path),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $variant => $name, )+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $( $name => Ok($variant), )+
                    other => Err(format!(
                        "unknown {} `{}` (expected one of: {})",
                        $label, other, [$($name),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_enum!(CursorShape, "cursor shape", {
    "circle" => CursorShape::Circle,
    "ring" => CursorShape::Ring,
    "square" => CursorShape::Square,
    "star" => CursorShape::Star,
    "heart" => CursorShape::Heart,
    "triangle" => CursorShape::Triangle,
});

named_enum!(TrailStyle, "trail style", {
    "simple" => TrailStyle::Simple,
    "image" => TrailStyle::Image,
    "particles" => TrailStyle::Particles,
});

named_enum!(ParticlePreset, "particle preset", {
    "spread" => ParticlePreset::Spread,
    "fire" => ParticlePreset::Fire,
    "snow" => ParticlePreset::Snow,
    "sparkle" => ParticlePreset::Sparkle,
});

/// Immutable configuration snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub enable: bool,
    pub hide_system_cursor: bool,
    pub trail_length: usize,
    pub cursor_shape: CursorShape,
    pub cursor_image: String,     // URL/path, empty = use the shape
    pub cursor_size: u32,
    pub rainbow_mode: bool,
    pub base_color: String,       // CSS color
    pub trail_color: String,      // CSS color, empty = follow the cursor color
    pub trail_image: String,      // URL/path for the image trail
    pub trail_style: TrailStyle,
    pub particle_preset: ParticlePreset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable: true,
            hide_system_cursor: false,
            trail_length: 20,
            cursor_shape: CursorShape::Circle,
            cursor_image: String::new(),
            cursor_size: 8,
            rainbow_mode: true,
            base_color: "#ff0000".to_string(),
            trail_color: String::new(),
            trail_image: String::new(),
            trail_style: TrailStyle::Simple,
            particle_preset: ParticlePreset::Spread,
        }
    }
}

impl Config {
    /// The explicit trail color, if one is set.
    pub fn trail_color(&self) -> Option<&str> {
        if self.trail_color.is_empty() { None } else { Some(&self.trail_color) }
    }

    /// Base color as a [`Color`]. Validated on the way in, so this only falls
    /// back to black for a hand-built snapshot.
    pub fn base_color_value(&self) -> Color {
        Color::parse(&self.base_color).unwrap_or(Color::BLACK)
    }

    /// True exactly when the native pointer should be hidden.
    pub fn hides_system_cursor(&self) -> bool {
        self.enable && self.hide_system_cursor
    }
}

/// Every option the bridge understands, by its external name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Enable,
    HideSystemCursor,
    TrailLength,
    CursorShape,
    CursorImage,
    CursorSize,
    RainbowMode,
    BaseColor,
    TrailColor,
    TrailImage,
    TrailStyle,
    ParticlePreset,
}

impl OptionKey {
    pub const ALL: [OptionKey; 12] = [
        OptionKey::Enable,
        OptionKey::HideSystemCursor,
        OptionKey::TrailLength,
        OptionKey::CursorShape,
        OptionKey::CursorImage,
        OptionKey::CursorSize,
        OptionKey::RainbowMode,
        OptionKey::BaseColor,
        OptionKey::TrailColor,
        OptionKey::TrailImage,
        OptionKey::TrailStyle,
        OptionKey::ParticlePreset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::Enable => "enable",
            OptionKey::HideSystemCursor => "hideSystemCursor",
            OptionKey::TrailLength => "trailLength",
            OptionKey::CursorShape => "cursorShape",
            OptionKey::CursorImage => "cursorImage",
            OptionKey::CursorSize => "cursorSize",
            OptionKey::RainbowMode => "rainbowMode",
            OptionKey::BaseColor => "baseColor",
            OptionKey::TrailColor => "trailColor",
            OptionKey::TrailImage => "trailImage",
            OptionKey::TrailStyle => "trailStyle",
            OptionKey::ParticlePreset => "particlePreset",
        }
    }

    /// The value this option has in a default snapshot.
    pub fn default_value(self) -> OptionValue {
        let d = Config::default();
        match self {
            OptionKey::Enable => OptionValue::Bool(d.enable),
            OptionKey::HideSystemCursor => OptionValue::Bool(d.hide_system_cursor),
            OptionKey::TrailLength => OptionValue::Int(d.trail_length as i64),
            OptionKey::CursorShape => OptionValue::Text(d.cursor_shape.to_string()),
            OptionKey::CursorImage => OptionValue::Text(d.cursor_image),
            OptionKey::CursorSize => OptionValue::Int(d.cursor_size as i64),
            OptionKey::RainbowMode => OptionValue::Bool(d.rainbow_mode),
            OptionKey::BaseColor => OptionValue::Text(d.base_color),
            OptionKey::TrailColor => OptionValue::Text(d.trail_color),
            OptionKey::TrailImage => OptionValue::Text(d.trail_image),
            OptionKey::TrailStyle => OptionValue::Text(d.trail_style.to_string()),
            OptionKey::ParticlePreset => OptionValue::Text(d.particle_preset.to_string()),
        }
    }
}

impl FromStr for OptionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OptionKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownOption(s.to_string()))
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loosely typed option value as stores hand them over.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Best-effort typing of a `key=value` string from the command line.
    pub fn infer(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(b) = raw.parse::<bool>() {
            return OptionValue::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return OptionValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return OptionValue::Float(f);
        }
        OptionValue::Text(raw.to_string())
    }

    fn as_bool(&self, key: OptionKey) -> Result<bool, Error> {
        match self {
            OptionValue::Bool(b) => Ok(*b),
            other => Err(Error::invalid(key.as_str(), format!("expected a boolean, got {other}"))),
        }
    }

    fn as_int(&self, key: OptionKey) -> Result<i64, Error> {
        match self {
            OptionValue::Int(i) => Ok(*i),
            OptionValue::Float(f) if f.is_finite() => Ok(f.round() as i64),
            OptionValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::invalid(key.as_str(), format!("expected a number, got `{s}`"))),
            other => Err(Error::invalid(key.as_str(), format!("expected a number, got {other}"))),
        }
    }

    fn as_text(&self, key: OptionKey) -> Result<String, Error> {
        match self {
            OptionValue::Text(s) => Ok(s.trim().to_string()),
            other => Err(Error::invalid(key.as_str(), format!("expected a string, got {other}"))),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Text(v)
    }
}

fn clamp_range(key: OptionKey, value: i64, (lo, hi): (i64, i64)) -> i64 {
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        tracing::warn!(option = %key, value, min = lo, max = hi, "Value out of range, clamped");
    }
    clamped
}

fn parse_enum<T: FromStr<Err = String>>(key: OptionKey, value: &OptionValue) -> Result<T, Error> {
    value.as_text(key)?.parse::<T>().map_err(|e| Error::invalid(key.as_str(), e))
}

fn parse_color(key: OptionKey, value: &OptionValue, allow_empty: bool) -> Result<String, Error> {
    let text = value.as_text(key)?;
    if text.is_empty() && allow_empty {
        return Ok(text);
    }
    if Color::parse(&text).is_none() {
        return Err(Error::invalid(key.as_str(), format!("`{text}` is not a color")));
    }
    Ok(text)
}

/// Holds the current snapshot and applies option changes to it.
#[derive(Debug, Default)]
pub struct ConfigBridge {
    snapshot: Config,
}

impl ConfigBridge {
    pub fn new(snapshot: Config) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Config {
        &self.snapshot
    }

    /// Validate `value` for `key` and swap in the re-derived snapshot.
    /// On error the previous snapshot stays in effect.
    pub fn apply_change(&mut self, key: &str, value: OptionValue) -> Result<OptionKey, Error> {
        let key: OptionKey = key.parse()?;
        let mut next = self.snapshot.clone();

        match key {
            OptionKey::Enable => next.enable = value.as_bool(key)?,
            OptionKey::HideSystemCursor => next.hide_system_cursor = value.as_bool(key)?,
            OptionKey::RainbowMode => next.rainbow_mode = value.as_bool(key)?,
            OptionKey::TrailLength => {
                next.trail_length = clamp_range(key, value.as_int(key)?, TRAIL_LENGTH_RANGE) as usize;
            }
            OptionKey::CursorSize => {
                next.cursor_size = clamp_range(key, value.as_int(key)?, CURSOR_SIZE_RANGE) as u32;
            }
            OptionKey::CursorShape => next.cursor_shape = parse_enum(key, &value)?,
            OptionKey::TrailStyle => next.trail_style = parse_enum(key, &value)?,
            OptionKey::ParticlePreset => next.particle_preset = parse_enum(key, &value)?,
            OptionKey::CursorImage => next.cursor_image = value.as_text(key)?,
            OptionKey::TrailImage => next.trail_image = value.as_text(key)?,
            OptionKey::BaseColor => next.base_color = parse_color(key, &value, false)?,
            OptionKey::TrailColor => next.trail_color = parse_color(key, &value, true)?,
        }

        tracing::debug!(option = %key, %value, "Option changed");
        self.snapshot = next;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_option_registry() {
        let c = Config::default();
        assert!(c.enable);
        assert!(!c.hide_system_cursor);
        assert_eq!(c.trail_length, 20);
        assert_eq!(c.cursor_shape, CursorShape::Circle);
        assert_eq!(c.cursor_size, 8);
        assert!(c.rainbow_mode);
        assert_eq!(c.base_color, "#ff0000");
        assert_eq!(c.trail_color(), None);
        assert_eq!(c.trail_style, TrailStyle::Simple);
        assert_eq!(c.particle_preset, ParticlePreset::Spread);
    }

    #[test]
    fn apply_change_updates_one_field() {
        let mut bridge = ConfigBridge::default();
        let key = bridge.apply_change("trailStyle", "particles".into()).unwrap();
        assert_eq!(key, OptionKey::TrailStyle);
        assert_eq!(bridge.snapshot().trail_style, TrailStyle::Particles);
        assert_eq!(bridge.snapshot().trail_length, 20);

        bridge.apply_change("particlePreset", "Fire".into()).unwrap();
        assert_eq!(bridge.snapshot().particle_preset, ParticlePreset::Fire);
        bridge.apply_change("cursorShape", "heart".into()).unwrap();
        assert_eq!(bridge.snapshot().cursor_shape, CursorShape::Heart);
    }

    #[test]
    fn integers_are_clamped_into_range() {
        let mut bridge = ConfigBridge::default();
        bridge.apply_change("trailLength", 500i64.into()).unwrap();
        assert_eq!(bridge.snapshot().trail_length, 100);
        bridge.apply_change("trailLength", 1i64.into()).unwrap();
        assert_eq!(bridge.snapshot().trail_length, 2);
        bridge.apply_change("cursorSize", 0i64.into()).unwrap();
        assert_eq!(bridge.snapshot().cursor_size, 1);
        bridge.apply_change("cursorSize", OptionValue::Float(12.4)).unwrap();
        assert_eq!(bridge.snapshot().cursor_size, 12);
    }

    #[test]
    fn invalid_changes_keep_previous_snapshot() {
        let mut bridge = ConfigBridge::default();
        let before = bridge.snapshot().clone();

        assert!(matches!(bridge.apply_change("bogus", true.into()), Err(Error::UnknownOption(_))));
        assert!(matches!(bridge.apply_change("enable", "yes".into()), Err(Error::InvalidOption { .. })));
        assert!(bridge.apply_change("cursorShape", "hexagon".into()).is_err());
        assert!(bridge.apply_change("baseColor", "notacolor".into()).is_err());
        assert!(bridge.apply_change("baseColor", "".into()).is_err());
        assert_eq!(bridge.snapshot(), &before);
    }

    #[test]
    fn trail_color_may_be_cleared() {
        let mut bridge = ConfigBridge::default();
        bridge.apply_change("trailColor", "#00ff00".into()).unwrap();
        assert_eq!(bridge.snapshot().trail_color(), Some("#00ff00"));
        bridge.apply_change("trailColor", "  ".into()).unwrap();
        assert_eq!(bridge.snapshot().trail_color(), None);
    }

    #[test]
    fn image_sources_are_trimmed() {
        let mut bridge = ConfigBridge::default();
        bridge.apply_change("cursorImage", "  icons/arrow.png \n".into()).unwrap();
        assert_eq!(bridge.snapshot().cursor_image, "icons/arrow.png");
    }

    #[test]
    fn option_keys_round_trip_their_names() {
        for key in OptionKey::ALL {
            assert_eq!(key.as_str().parse::<OptionKey>().unwrap(), key);
        }
        assert_eq!("TRAILLENGTH".parse::<OptionKey>().unwrap(), OptionKey::TrailLength);
    }

    #[test]
    fn infer_types_cli_values() {
        assert_eq!(OptionValue::infer("true"), OptionValue::Bool(true));
        assert_eq!(OptionValue::infer("42"), OptionValue::Int(42));
        assert_eq!(OptionValue::infer("#ff0000"), OptionValue::Text("#ff0000".into()));
        assert_eq!(OptionValue::infer("fire"), OptionValue::Text("fire".into()));
    }

    #[test]
    fn system_cursor_hidden_only_when_enabled() {
        let mut c = Config { hide_system_cursor: true, ..Config::default() };
        assert!(c.hides_system_cursor());
        c.enable = false;
        assert!(!c.hides_system_cursor());
    }
}
