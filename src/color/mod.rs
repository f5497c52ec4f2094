// src/color/mod.rs
pub mod model;
pub mod picker;

pub use model::{parse_color, rgba_to_css, rgba_to_hex, rgba_to_hsl};
