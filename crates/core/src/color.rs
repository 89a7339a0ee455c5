//! Hex color parsing and WCAG contrast math.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);
    pub const WHITE: RgbColor = RgbColor::new(255, 255, 255);

    /// Creates a color from channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB`, `RRGGBB` or the short `#RGB` form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] if the string is not a hex color.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(Error::InvalidColor(hex.to_string())),
        };
        if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&expanded[range], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// The color as `#RRGGBB` (uppercase).
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// WCAG 2.x relative luminance in `0.0..=1.0`.
    pub fn relative_luminance(&self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = f64::from(channel) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// Contrast ratio against another color, from 1.0 (none) to 21.0.
    pub fn contrast_ratio(&self, other: &RgbColor) -> f64 {
        let a = self.relative_luminance();
        let b = other.relative_luminance();
        let (lighter, darker) = if a >= b { (a, b) } else { (b, a) };
        (lighter + 0.05) / (darker + 0.05)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Contrast ratio between two hex color strings.
pub fn contrast_ratio(foreground: &str, background: &str) -> Result<f64> {
    let fg = RgbColor::from_hex(foreground)?;
    let bg = RgbColor::from_hex(background)?;
    Ok(fg.contrast_ratio(&bg))
}
