//! Linear RGB color type
//!
//! Linear RGB is proportional to light intensity and is the input space of
//! the RGB → CIE XYZ matrix.

use super::lut::srgb_to_linear;
use super::srgb::Srgb;

/// A color in linear RGB color space.
///
/// Values are in the range 0.0..=1.0 for in-gamut colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRgb {
    /// Red channel (linear light intensity)
    pub r: f32,
    /// Green channel (linear light intensity)
    pub g: f32,
    /// Blue channel (linear light intensity)
    pub b: f32,
}

impl LinearRgb {
    /// Create a new LinearRgb color from linear RGB values.
    #[inline]
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl From<Srgb> for LinearRgb {
    /// Gamma-decode sRGB through the lookup table.
    ///
    /// Channels are clamped to 0.0..=1.0 first, so working values from the
    /// quantizer must already be clamped before conversion.
    fn from(srgb: Srgb) -> Self {
        Self {
            r: srgb_to_linear(srgb.r),
            g: srgb_to_linear(srgb.g),
            b: srgb_to_linear(srgb.b),
        }
    }
}
