//! Unified error type for the spectra-dither public API.
//!
//! [`DitherError`] wraps all error types from the crate into a single enum
//! for convenient `?` propagation in application code.

use crate::palette::{PaletteError, ParseColorError};
use std::fmt;

/// Unified error type for the spectra-dither public API.
///
/// # Example
///
/// ```
/// use spectra_dither::{DitherError, Palette};
///
/// fn create_palette() -> Result<Palette, DitherError> {
///     let palette = Palette::from_hex(&["#000000", "#FFFFFF"], None)?;
///     Ok(palette)
/// }
/// ```
#[derive(Debug)]
pub enum DitherError {
    /// Palette validation error (empty, duplicate, length mismatch, or parse error)
    Palette(PaletteError),
    /// Color parsing error (invalid hex string)
    ParseColor(ParseColorError),
    /// A parameter is outside its valid range (e.g. zero-size image)
    InvalidParameter(String),
    /// Pixel buffer length does not match `width * height`
    Dimension {
        /// Number of pixels implied by the dimensions
        expected: usize,
        /// Number of pixels supplied
        actual: usize,
    },
}

impl fmt::Display for DitherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DitherError::Palette(err) => write!(f, "palette error: {}", err),
            DitherError::ParseColor(err) => write!(f, "color parse error: {}", err),
            DitherError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            DitherError::Dimension { expected, actual } => write!(
                f,
                "dimension mismatch: expected {} pixels, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for DitherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DitherError::Palette(err) => Some(err),
            DitherError::ParseColor(err) => Some(err),
            DitherError::InvalidParameter(_) | DitherError::Dimension { .. } => None,
        }
    }
}

impl From<PaletteError> for DitherError {
    fn from(err: PaletteError) -> Self {
        DitherError::Palette(err)
    }
}

impl From<ParseColorError> for DitherError {
    fn from(err: ParseColorError) -> Self {
        DitherError::ParseColor(err)
    }
}
