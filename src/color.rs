//! Color values for grid cells
//!
//! Cells hold opaque RGB colors written as `#RRGGBB`. Input accepts the
//! `#RGB` shorthand (each digit doubled) and either letter case; output is
//! always canonical uppercase six-digit hex.

use image::Rgba;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Input string doesn't start with '#'
    #[error("color must start with '#'")]
    MissingHash,
    /// Invalid length (must be 3 or 6 hex chars after #)
    #[error("invalid color length {0}, expected 3 or 6")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// An opaque RGB cell color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string (`#RGB` or `#RRGGBB`).
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixelgrid::color::Color;
    ///
    /// let red = Color::parse("#f00").unwrap();
    /// assert_eq!(red.to_hex(), "#FF0000");
    /// assert!(Color::parse("red").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorError::Empty);
        }
        let hex = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;

        // Validate all characters are hex
        for c in hex.chars() {
            if !c.is_ascii_hexdigit() {
                return Err(ColorError::InvalidHex(c));
            }
        }

        let digits: Vec<u8> = hex.chars().map(parse_hex_digit).collect::<Result<_, _>>()?;
        match digits.as_slice() {
            // #RGB -> #RRGGBB (doubled digits)
            [r, g, b] => Ok(Color::rgb(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => {
                Ok(Color::rgb(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0))
            }
            _ => Err(ColorError::InvalidLength(digits.len())),
        }
    }

    /// Canonical `#RRGGBB` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Euclidean distance in RGB space. Identical colors are at distance 0.
    pub fn distance(&self, other: &Color) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Fully opaque RGBA pixel for this color.
    pub fn to_rgba(&self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

/// Parse user-typed color text, returning `None` for anything malformed.
///
/// Color entry fields call this on every keystroke; partial input such as
/// `#AB` simply yields nothing and leaves the current color alone.
pub fn parse_color_lenient(s: &str) -> Option<Color> {
    Color::parse(s).ok()
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digit() {
        assert_eq!(Color::parse("#FF8800").unwrap(), Color::rgb(255, 136, 0));
    }

    #[test]
    fn test_parse_shorthand_doubles_digits() {
        assert_eq!(Color::parse("#abc").unwrap().to_hex(), "#AABBCC");
    }

    #[test]
    fn test_parse_lowercase_normalizes() {
        assert_eq!(Color::parse("#00ff7f").unwrap().to_string(), "#00FF7F");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Color::parse("  #123456 \n").unwrap(), Color::rgb(0x12, 0x34, 0x56));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Color::parse(""), Err(ColorError::Empty));
        assert_eq!(Color::parse("FF0000"), Err(ColorError::MissingHash));
        assert_eq!(Color::parse("#FF00"), Err(ColorError::InvalidLength(4)));
        assert_eq!(Color::parse("#FF00000A"), Err(ColorError::InvalidLength(8)));
        assert_eq!(Color::parse("#GG0000"), Err(ColorError::InvalidHex('G')));
    }

    #[test]
    fn test_lenient_ignores_partial_input() {
        assert_eq!(parse_color_lenient("#AB"), None);
        assert_eq!(parse_color_lenient("#"), None);
        assert_eq!(parse_color_lenient("#0F0"), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn test_distance() {
        let red = Color::rgb(255, 0, 0);
        assert_eq!(red.distance(&red), 0.0);
        assert_eq!(Color::rgb(0, 0, 0).distance(&Color::rgb(3, 4, 0)), 5.0);
        let white = Color::WHITE;
        assert!((Color::BLACK.distance(&white) - 441.672_955_930_063_7).abs() < 1e-9);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Color = serde_json::from_str("\"#fff\"").unwrap();
        assert_eq!(back, Color::WHITE);
        assert!(serde_json::from_str::<Color>("\"white\"").is_err());
    }
}
