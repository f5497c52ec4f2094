// src/color/picker.rs
// Pointer and field handling for the color picker widget. Handlers take the
// current CSS value and return the new one, or `None` when the event is ignored.
use super::model::{Hsla, Rgba, hsl_to_rgba, parse_color, rgba_to_css, rgba_to_hsl, wrap_hue};
use serde::{Deserialize, Serialize};

/// Bounding box of a picker control, in the same coordinate space as the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    /// Only events with the primary button held move the picker.
    pub primary_pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    SaturationLightness,
    Hue,
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Red,
    Green,
    Blue,
    Hue,
    Saturation,
    Lightness,
}

impl Field {
    fn max(self) -> f64 {
        match self {
            Field::Red | Field::Green | Field::Blue => 255.0,
            Field::Hue => 360.0,
            Field::Saturation | Field::Lightness => 100.0,
        }
    }
}

fn fraction(offset: f64, extent: f64) -> f64 {
    if extent <= 0.0 || !offset.is_finite() {
        return 0.0;
    }
    (offset / extent).clamp(0.0, 1.0)
}

/// Map a pointer on the 2D surface to (saturation, lightness), both in [0,100].
/// The top edge is lightness 100.
pub fn saturation_lightness_at(rect: Rect, x: f64, y: f64) -> (f64, f64) {
    let s = fraction(x - rect.left, rect.width) * 100.0;
    let l = (1.0 - fraction(y - rect.top, rect.height)) * 100.0;
    (s, l)
}

/// Hue in [0,360); the right edge wraps back to 0.
pub fn hue_at(rect: Rect, x: f64) -> f64 {
    wrap_hue(fraction(x - rect.left, rect.width) * 360.0)
}

pub fn alpha_at(rect: Rect, x: f64) -> f64 {
    fraction(x - rect.left, rect.width)
}

/// Apply a pointer event on one of the picker's controls.
///
/// A press without any drag already moves the color.
pub fn pointer_moved(
    current: &str,
    control: Control,
    rect: Rect,
    event: PointerEvent,
) -> Option<String> {
    if !event.primary_pressed {
        return None;
    }
    let hsl = rgba_to_hsl(parse_color(current));
    let next = match control {
        Control::SaturationLightness => {
            let (s, l) = saturation_lightness_at(rect, event.x, event.y);
            Hsla { s, l, ..hsl }
        }
        Control::Hue => Hsla {
            h: hue_at(rect, event.x),
            ..hsl
        },
        Control::Alpha => Hsla {
            a: alpha_at(rect, event.x),
            ..hsl
        },
    };
    Some(rgba_to_css(hsl_to_rgba(next)))
}

/// Apply a numeric field edit, clamping it to the field's range.
pub fn field_changed(current: &str, field: Field, value: f64) -> String {
    let value = if value.is_finite() {
        value.clamp(0.0, field.max())
    } else {
        0.0
    };
    let rgba = parse_color(current);
    let hsl = rgba_to_hsl(rgba);
    let next = match field {
        Field::Red => Rgba::from_channels(value, rgba.g as f64, rgba.b as f64, rgba.a),
        Field::Green => Rgba::from_channels(rgba.r as f64, value, rgba.b as f64, rgba.a),
        Field::Blue => Rgba::from_channels(rgba.r as f64, rgba.g as f64, value, rgba.a),
        Field::Hue => hsl_to_rgba(Hsla { h: value, ..hsl }),
        Field::Saturation => hsl_to_rgba(Hsla { s: value, ..hsl }),
        Field::Lightness => hsl_to_rgba(Hsla { l: value, ..hsl }),
    };
    rgba_to_css(next)
}

/// Apply a hex field edit. Only `#RGB` and `#RRGGBB` are accepted; alpha is kept.
pub fn hex_changed(current: &str, hex: &str) -> Option<String> {
    let digits = hex.strip_prefix('#')?;
    if !matches!(digits.len(), 3 | 6) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let alpha = parse_color(current).a;
    Some(rgba_to_css(Rgba {
        a: alpha,
        ..parse_color(hex)
    }))
}
