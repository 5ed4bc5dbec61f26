//! sRGB color type
//!
//! sRGB is the encoding of decoded images and of the panel palette. The
//! quantizer does all of its arithmetic on these gamma-encoded values.

use std::str::FromStr;

use crate::palette::ParseColorError;

/// Weights of the luma approximation, in per-mille of the channel value.
///
/// `luma = (R*250 + G*350 + B*400) / (255 * 1000)` for 8-bit channels.
pub(crate) const LUMA_WEIGHTS: [f32; 3] = [0.250, 0.350, 0.400];

/// A color in sRGB color space.
///
/// Values are in the range 0.0..=1.0 (mapping to 0..255 for 8-bit). Working
/// values inside the quantizer may leave that range before they are clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    /// Red channel (gamma-corrected, 0.0..=1.0)
    pub r: f32,
    /// Green channel (gamma-corrected, 0.0..=1.0)
    pub g: f32,
    /// Blue channel (gamma-corrected, 0.0..=1.0)
    pub b: f32,
}

impl Srgb {
    /// Create a new Srgb color from float values.
    #[inline]
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create an Srgb color from 8-bit unsigned integer values.
    ///
    /// # Example
    /// ```
    /// use spectra_dither::Srgb;
    /// let red = Srgb::from_u8(255, 0, 0);
    /// assert_eq!(red.r, 1.0);
    /// ```
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Create an Srgb color from a byte array [R, G, B].
    #[inline]
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::from_u8(bytes[0], bytes[1], bytes[2])
    }

    /// Convert to a byte array [R, G, B].
    ///
    /// Rounds and clamps values to the 0..=255 range.
    ///
    /// # Example
    /// ```
    /// use spectra_dither::Srgb;
    /// let color = Srgb::new(1.0, 0.5, 0.0);
    /// assert_eq!(color.to_bytes(), [255, 128, 0]);
    /// ```
    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [
            (self.r * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.g * 255.0).round().clamp(0.0, 255.0) as u8,
            (self.b * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }

    /// Clamp every channel to 0.0..=1.0 (the 8-bit range 0..=255).
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    /// Normalized weighted brightness in 0.0..=1.0.
    ///
    /// # Example
    /// ```
    /// use spectra_dither::Srgb;
    /// assert_eq!(Srgb::from_u8(0, 0, 0).luma(), 0.0);
    /// assert!((Srgb::from_u8(255, 255, 255).luma() - 1.0).abs() < 1e-6);
    /// ```
    #[inline]
    pub fn luma(self) -> f32 {
        LUMA_WEIGHTS[0] * self.r + LUMA_WEIGHTS[1] * self.g + LUMA_WEIGHTS[2] * self.b
    }
}

impl FromStr for Srgb {
    type Err = ParseColorError;

    /// Parse an sRGB color from a hex string.
    ///
    /// Supports `#RRGGBB`, `RRGGBB`, `#RGB` and `RGB`. Parsing is
    /// case-insensitive and surrounding whitespace is trimmed.
    ///
    /// # Examples
    ///
    /// ```
    /// use spectra_dither::Srgb;
    ///
    /// let yellow: Srgb = "#FFFF00".parse().unwrap();
    /// assert_eq!(yellow.to_bytes(), [255, 255, 0]);
    ///
    /// let red: Srgb = "#F00".parse().unwrap();
    /// assert_eq!(red.r, 1.0);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() {
            return Err(ParseColorError::InvalidLength);
        }

        match s.len() {
            3 => {
                // Shorthand: expand each digit by multiplying by 17 (0xF -> 0xFF)
                let r = u8::from_str_radix(&s[0..1], 16)? * 17;
                let g = u8::from_str_radix(&s[1..2], 16)? * 17;
                let b = u8::from_str_radix(&s[2..3], 16)? * 17;
                Ok(Self::from_u8(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&s[0..2], 16)?;
                let g = u8::from_str_radix(&s[2..4], 16)?;
                let b = u8::from_str_radix(&s[4..6], 16)?;
                Ok(Self::from_u8(r, g, b))
            }
            _ => Err(ParseColorError::InvalidLength),
        }
    }
}
