// src/color/model.rs
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Canonical color value. Every other representation is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

/// Hue in degrees [0,360), saturation and lightness in [0,100], alpha in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsla {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    /// Build from unclamped channels: rounded and clamped to [0,255], alpha to [0,1].
    pub fn from_channels(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: clamp_channel(r),
            g: clamp_channel(g),
            b: clamp_channel(b),
            a: clamp_alpha(a),
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

pub(crate) fn clamp_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

pub(crate) fn clamp_alpha(a: f64) -> f64 {
    if a.is_nan() { 1.0 } else { a.clamp(0.0, 1.0) }
}

pub(crate) fn wrap_hue(h: f64) -> f64 {
    if !h.is_finite() {
        return 0.0;
    }
    let wrapped = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Hex digits without the leading '#'. Shorthand forms are digit-doubled.
fn parse_hex(hex: &str) -> Option<Rgba> {
    let digits: Vec<u8> = hex.bytes().map(nibble).collect::<Option<_>>()?;
    let bytes: Vec<u8> = match digits.len() {
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks(2).map(|p| p[0] << 4 | p[1]).collect(),
        _ => return None,
    };
    let a = bytes.get(3).map_or(1.0, |&a| a as f64 / 255.0);
    Some(Rgba {
        r: bytes[0],
        g: bytes[1],
        b: bytes[2],
        a,
    })
}

/// `rgb(r, g, b)` or `rgba(r, g, b, a)` with integer channels.
fn parse_css_rgb(input: &str) -> Option<Rgba> {
    let args = input
        .strip_prefix("rgba(")
        .or_else(|| input.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |s: &str| -> Option<f64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<f64>().ok()
    };
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = match parts.get(3) {
        Some(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.') => {
            s.parse::<f64>().ok()?
        }
        Some(_) => return None,
        None => 1.0,
    };

    Some(Rgba::from_channels(r, g, b, a))
}

/// Parse a hex or `rgb()`/`rgba()` string. Unrecognized input yields opaque white.
pub fn parse_color(input: &str) -> Rgba {
    let input = input.trim();
    let parsed = if let Some(hex) = input.strip_prefix('#') {
        parse_hex(hex)
    } else if input.starts_with("rgb") {
        parse_css_rgb(input)
    } else {
        None
    };
    parsed.unwrap_or(Rgba::WHITE)
}

/// Uppercase `#RRGGBB`, with an `AA` pair appended only for translucent colors.
pub fn rgba_to_hex(c: Rgba) -> String {
    let mut out = String::with_capacity(9);
    out.push('#');
    for channel in [c.r, c.g, c.b] {
        let _ = write!(out, "{:02X}", channel);
    }
    if c.a != 1.0 {
        let _ = write!(out, "{:02X}", clamp_channel(clamp_alpha(c.a) * 255.0));
    }
    out
}

pub fn rgba_to_hsl(c: Rgba) -> Hsla {
    let r = c.r as f64 / 255.0;
    let g = c.g as f64 / 255.0;
    let b = c.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsla {
            h: 0.0,
            s: 0.0,
            l: l * 100.0,
            a: c.a,
        };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsla {
        h: wrap_hue(h * 60.0),
        s: s * 100.0,
        l: l * 100.0,
        a: c.a,
    }
}

pub fn hsl_to_rgba(hsl: Hsla) -> Rgba {
    let h = wrap_hue(hsl.h);
    let s = hsl.s.clamp(0.0, 100.0) / 100.0;
    let l = hsl.l.clamp(0.0, 100.0) / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgba::from_channels((r + m) * 255.0, (g + m) * 255.0, (b + m) * 255.0, hsl.a)
}

/// `rgba(r, g, b, a)` with alpha exactly as stored.
pub fn rgba_to_css(c: Rgba) -> String {
    format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a)
}
