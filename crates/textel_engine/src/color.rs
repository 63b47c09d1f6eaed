use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    static ref HEX_COLOR_REGEX: Regex = Regex::new(r"([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})").unwrap();
}

/// An opaque 24-bit RGB color. No alpha.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{Color: r={:02X}, g={:02X}, b={:02X}}}", self.r, self.g, self.b)
    }
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn get_rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Componentwise RGB inversion.
    pub fn invert(&self) -> Color {
        Color::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parses a `#rrggbb` hex color.
    ///
    /// # Errors
    ///
    /// Returns an error if the string holds no 6-digit hex triplet.
    pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
        if let Some(cap) = HEX_COLOR_REGEX.captures(hex) {
            let (_, [r, g, b]) = cap.extract();
            let r = u32::from_str_radix(r, 16)?;
            let g = u32::from_str_radix(g, 16)?;
            let b = u32::from_str_radix(b, 16)?;
            Ok(Color::new(r as u8, g as u8, b as u8))
        } else {
            Err(anyhow::anyhow!("Invalid hex color: {hex}"))
        }
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from(value: (u8, u8, u8)) -> Self {
        Color {
            r: value.0,
            g: value.1,
            b: value.2,
        }
    }
}

impl From<Color> for (u8, u8, u8) {
    fn from(value: Color) -> (u8, u8, u8) {
        (value.r, value.g, value.b)
    }
}

impl From<[u8; 3]> for Color {
    fn from(value: [u8; 3]) -> Self {
        Color {
            r: value[0],
            g: value[1],
            b: value[2],
        }
    }
}

impl From<Color> for [u8; 3] {
    fn from(value: Color) -> [u8; 3] {
        [value.r, value.g, value.b]
    }
}
