//! Color helpers: hex → rgba strings, CSS color parsing, HSL.
//!
//! Configuration carries colors as CSS strings (`#ff0000`, `rgba(...)`,
//! `hsl(...)`, a few names). Renderers turn them into [`Color`] right before
//! handing them to a drawing surface.

use std::fmt;

/// A solid color: 8-bit RGB plus alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `hsl(h, s%, l%)`. Hue may be any value; it wraps into `[0, 360)`.
    pub fn hsl(h: f32, s: f32, l: f32) -> Self {
        Self::hsla(h, s, l, 1.0)
    }

    /// `hsla(h, s%, l%, a)`, saturation and lightness in percent.
    pub fn hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        let (r, g, b) = hsl_to_rgb(h, s, l);
        Self { r, g, b, a: a.clamp(0.0, 1.0) }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    /// Parse a CSS color string. Returns `None` for anything we don't know.
    pub fn parse(input: &str) -> Option<Color> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex_digits(hex);
        }

        let lower = s.to_ascii_lowercase();
        if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
            return parse_rgb_args(&args);
        }
        if let Some(args) = function_args(&lower, "hsla").or_else(|| function_args(&lower, "hsl")) {
            return parse_hsl_args(&args);
        }
        named_color(&lower)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// Turn `#rgb` / `#rrggbb` into `rgba(r,g,b,alpha)`.
///
/// Anything else is returned unchanged: it is assumed to already be a valid
/// CSS color (an `rgba(...)` string or a named color) and is passed through
/// without applying `alpha`.
pub fn hex_to_rgba(hex: &str, alpha: f32) -> String {
    match strict_hex(hex) {
        Some((r, g, b)) => format!("rgba({},{},{},{})", r, g, b, alpha),
        None => hex.to_string(),
    }
}

/// The color a canvas would end up with after assigning
/// `hex_to_rgba(css, alpha)` as its style.
pub fn alpha_blend(css: &str, alpha: f32) -> Option<Color> {
    Color::parse(&hex_to_rgba(css, alpha))
}

/// HSL (hue in degrees, saturation/lightness in percent) to 8-bit RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0) / 360.0;
    let s = (s / 100.0).clamp(0.0, 1.0);
    let l = (l / 100.0).clamp(0.0, 1.0);

    if s == 0.0 {
        let v = to_u8(l);
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_channel(p, q, h)),
        to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Exactly `#` followed by 3 or 6 hex digits.
fn strict_hex(s: &str) -> Option<(u8, u8, u8)> {
    let digits = s.strip_prefix('#')?;
    if digits.len() != 3 && digits.len() != 6 {
        return None;
    }
    let c = parse_hex_digits(digits)?;
    Some((c.r, c.g, c.b))
}

fn parse_hex_digits(digits: &str) -> Option<Color> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match digits.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)? as f32 / 255.0)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)? as f32 / 255.0)),
        _ => None,
    }
}

/// `name(a, b, c)` → `["a", "b", "c"]`. Accepts comma or whitespace separators
/// and the `/ alpha` form.
fn function_args(s: &str, name: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?.strip_suffix(')')?;
    let args: Vec<String> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    Some(args)
}

fn parse_alpha(arg: Option<&String>) -> Option<f32> {
    match arg {
        None => Some(1.0),
        Some(a) => match a.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok().map(|v| (v / 100.0).clamp(0.0, 1.0)),
            None => a.parse::<f32>().ok().map(|v| v.clamp(0.0, 1.0)),
        },
    }
}

fn parse_rgb_args(args: &[String]) -> Option<Color> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let channel = |s: &String| -> Option<u8> {
        match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok().map(|v| to_u8(v / 100.0)),
            None => s.parse::<f32>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8),
        }
    };
    Some(Color::rgba(
        channel(&args[0])?,
        channel(&args[1])?,
        channel(&args[2])?,
        parse_alpha(args.get(3))?,
    ))
}

fn parse_hsl_args(args: &[String]) -> Option<Color> {
    if args.len() != 3 && args.len() != 4 {
        return None;
    }
    let h = args[0].trim_end_matches("deg").parse::<f32>().ok()?;
    let s = args[1].trim_end_matches('%').parse::<f32>().ok()?;
    let l = args[2].trim_end_matches('%').parse::<f32>().ok()?;
    Some(Color::hsla(h, s, l, parse_alpha(args.get(3))?))
}

fn named_color(name: &str) -> Option<Color> {
    let c = match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "transparent" => Color::TRANSPARENT,
        "red" => Color::rgb(255, 0, 0),
        "lime" => Color::rgb(0, 255, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "orange" => Color::rgb(255, 165, 0),
        "orangered" => Color::rgb(255, 69, 0),
        "gold" => Color::rgb(255, 215, 0),
        "purple" => Color::rgb(128, 0, 128),
        "pink" => Color::rgb(255, 192, 203),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        _ => return None,
    };
    Some(c)
}
