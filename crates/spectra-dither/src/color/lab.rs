//! CIE 1976 L*a*b* color space
//!
//! Conversion goes sRGB → linear RGB → CIE XYZ (D65) → L*a*b*. Squared
//! Euclidean distance in this space is the CIE76 ΔE² used by
//! [`DistanceMetric::CieLab76`](crate::DistanceMetric::CieLab76).

use super::linear_rgb::LinearRgb;
use super::srgb::Srgb;

/// Linear sRGB → XYZ matrix (sRGB primaries, D65 reference white).
const RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

/// D65 reference white.
const WHITE_X: f32 = 0.95047;
const WHITE_Y: f32 = 1.00000;
const WHITE_Z: f32 = 1.08883;

/// Threshold between the cube-root and the linear segment: (6/29)^3.
const EPSILON: f32 = 0.008856;

/// Slope of the linear segment, (29/3)^3.
const KAPPA: f32 = 903.3;

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

/// A color in CIE L*a*b*.
///
/// - `l`: lightness, 0 (black) to 100 (diffuse white)
/// - `a`: green (negative) to red (positive)
/// - `b`: blue (negative) to yellow (positive)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl Lab {
    #[inline]
    pub fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    /// Squared CIE76 color difference (ΔE²).
    ///
    /// # Example
    ///
    /// ```
    /// use spectra_dither::Lab;
    ///
    /// let a = Lab::new(50.0, 10.0, -10.0);
    /// let b = Lab::new(53.0, 14.0, -10.0);
    /// assert_eq!(a.delta_e_squared(b), 25.0);
    /// ```
    #[inline]
    pub fn delta_e_squared(self, other: Lab) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

impl From<LinearRgb> for Lab {
    fn from(rgb: LinearRgb) -> Self {
        let x = (RGB_TO_XYZ[0][0] * rgb.r + RGB_TO_XYZ[0][1] * rgb.g + RGB_TO_XYZ[0][2] * rgb.b)
            / WHITE_X;
        let y = (RGB_TO_XYZ[1][0] * rgb.r + RGB_TO_XYZ[1][1] * rgb.g + RGB_TO_XYZ[1][2] * rgb.b)
            / WHITE_Y;
        let z = (RGB_TO_XYZ[2][0] * rgb.r + RGB_TO_XYZ[2][1] * rgb.g + RGB_TO_XYZ[2][2] * rgb.b)
            / WHITE_Z;

        let fx = lab_f(x);
        let fy = lab_f(y);
        let fz = lab_f(z);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

impl From<Srgb> for Lab {
    /// Clamps to the 8-bit gamut, gamma-decodes, then converts.
    fn from(srgb: Srgb) -> Self {
        Lab::from(LinearRgb::from(srgb.clamped()))
    }
}
