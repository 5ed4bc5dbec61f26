// Generated LUT tables and index-heavy pixel loops
#![allow(
    clippy::excessive_precision,
    clippy::needless_range_loop,
    clippy::module_inception,
    clippy::doc_overindented_list_items,
    clippy::manual_range_contains
)]

//! spectra-dither: palette quantization for six-color e-paper panels
//!
//! This library maps photographs onto a small fixed panel palette (black,
//! white, yellow, red, blue, green) with a brightness-favoring distance
//! metric and error diffusion.
//!
//! # Quick Start
//!
//! The [`Quantizer`] builder is the primary entry point:
//!
//! ```
//! use spectra_dither::{Palette, QuantizeMode, Quantizer, Srgb};
//!
//! let quantizer = Quantizer::new(Palette::spectra6()).mode(QuantizeMode::ErrorDiffusion);
//!
//! let pixels = vec![Srgb::from_u8(128, 128, 128); 4];
//! let result = quantizer.quantize(&pixels, 2, 2).unwrap();
//!
//! assert_eq!(result.width(), 2);
//! assert_eq!(result.indices().len(), 4);
//! ```
//!
//! # Color Spaces
//!
//! - [`Srgb`]: gamma-encoded input/output, and the space error is diffused in
//! - [`LinearRgb`]: linear light, intermediate for the Lab conversion
//! - [`Lab`]: CIE L*a*b* (D65) for the [`DistanceMetric::CieLab76`] metric
//!
//! # Quantization Modes
//!
//! Selected via [`QuantizeMode`]:
//!
//! - Error diffusion with a reduced Atkinson kernel (default)
//! - Floyd-Steinberg (full error propagation)
//! - Threshold (independent nearest-color per pixel)
//!
//! # Distance Metrics
//!
//! The palette carries exactly one [`DistanceMetric`]:
//!
//! ```text
//! LumaWeighted (default, kc = 1.5, kl = 0.60):
//!   chroma = 0.75 * (0.25*dR² + 0.35*dG² + 0.40*dB²)    channels in 0..1
//!   luma   = 0.25*R + 0.35*G + 0.40*B
//!   d      = kc * chroma + kl * (luma_a - luma_b)²
//!
//! CieLab76:
//!   d      = (L1-L2)² + (a1-a2)² + (b1-b2)²
//! ```
//!
//! The luma term keeps light greys on white and dark greys on black; with
//! plain RGB distance a light grey can land on yellow, whose luma (0.6) is
//! far below white.
//!
//! ## Error Diffusion Units
//!
//! The working buffer holds sRGB values in `0..1`, the same units the
//! luma-weighted metric reads. Each pixel is clamped to `0..1` before
//! matching, and the residue `clamped - actual[idx]` is what the kernel
//! distributes. Residue pushed past the image edge is dropped.
//!
//! ## Dual Palettes
//!
//! A panel shows its colors darker and less saturated than their nominal
//! codes. [`Palette::new`] accepts the measured colors as a second list:
//! matching and residue use the measured (actual) colors, while the
//! [`IndexedImage`] codes still address the official list.

pub mod api;
pub mod color;
pub mod dither;
pub mod output;
pub mod palette;


pub use api::{DitherError, Quantizer};
pub use color::{Lab, LinearRgb, Srgb};
pub use dither::{Atkinson, Dither, FloydSteinberg, Kernel, QuantizeMode, Threshold};
pub use output::IndexedImage;
pub use palette::{DistanceMetric, Palette, PaletteError, ParseColorError};
