//! Color types and conversion utilities
//!
//! This module provides type-safe color handling with compile-time distinction
//! between gamma-encoded sRGB, linear RGB and CIE L*a*b*.
//!
//! # Color Spaces
//!
//! - **sRGB**: The encoding of decoded image buffers and palette entries. The
//!   quantizer works directly on these values.
//! - **LinearRgb**: Linear light intensity, only used as the stepping stone
//!   towards CIE XYZ.
//! - **Lab**: CIE 1976 L*a*b* under D65, used by the ΔE76 distance metric.
//!
//! # Example
//!
//! ```
//! use spectra_dither::{Lab, LinearRgb, Srgb};
//!
//! let srgb = Srgb::from_u8(128, 64, 32);
//! let linear = LinearRgb::from(srgb);
//! let lab = Lab::from(linear);
//! assert!(lab.l > 0.0 && lab.l < 100.0);
//! ```

mod lab;
mod linear_rgb;
mod lut;
mod srgb;

pub use lab::Lab;
pub use linear_rgb::LinearRgb;
pub use srgb::Srgb;
