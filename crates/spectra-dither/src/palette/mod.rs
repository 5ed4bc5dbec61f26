//! Palette types and utilities
//!
//! This module provides the [`Palette`] with its precomputed per-entry
//! descriptors, the [`DistanceMetric`] used for nearest-color search, and
//! the error types for parsing and validation.

mod error;
mod palette;

pub use error::{PaletteError, ParseColorError};
pub use palette::{DistanceMetric, Palette};
