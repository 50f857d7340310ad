use crate::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const TRANSPARENT: Color = Color(0, 0, 0, 0);
    pub const BLACK: Color = Color(0, 0, 0, 255);
    pub const WHITE: Color = Color(255, 255, 255, 255);

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color(r, g, b, 255)
    }

    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(r, g, b, a)
    }

    /// Lenient hex decode; malformed input falls back to opaque black.
    /// Style-sheet decoding goes through [`Color::parse`] instead, which
    /// reports failure.
    pub fn from_hex(hex: &str) -> Self {
        Self::parse(hex).unwrap_or(Color::BLACK)
    }

    /// Strict `#rrggbb` / `#rrggbbaa` decode.
    pub fn parse(hex: &str) -> Option<Self> {
        let s = hex.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        match s.len() {
            6 => Some(Color(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Color(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Color(self.0, self.1, self.2, a)
    }
}

/// Fill description: solid color or a linear gradient in the local space of
/// the rect being filled.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Brush {
    Solid(Color),
    Linear {
        start: Vec2,
        end: Vec2,
        start_color: Color,
        end_color: Color,
    },
}

impl From<Color> for Brush {
    fn from(c: Color) -> Self {
        Brush::Solid(c)
    }
}

pub struct LinearGradient;

impl LinearGradient {
    pub fn vertical(top: Color, bottom: Color) -> Brush {
        Brush::Linear {
            start: Vec2 { x: 0.0, y: 0.0 },
            end: Vec2 { x: 0.0, y: 1.0 },
            start_color: top,
            end_color: bottom,
        }
    }

    pub fn horizontal(left: Color, right: Color) -> Brush {
        Brush::Linear {
            start: Vec2 { x: 0.0, y: 0.0 },
            end: Vec2 { x: 1.0, y: 0.0 },
            start_color: left,
            end_color: right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex() {
        assert_eq!(Color::parse("#FF5733"), Some(Color(255, 87, 51, 255)));
        assert_eq!(Color::parse("FF5733AA"), Some(Color(255, 87, 51, 170)));
        assert_eq!(Color::parse("#F53"), None);
        assert_eq!(Color::parse("#GG5733"), None);
        assert_eq!(Color::from_hex("#bogus!"), Color::BLACK);
    }
}
