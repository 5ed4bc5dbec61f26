//! Public API for the spectra-dither crate.
//!
//! This module provides the high-level API: [`Quantizer`] builder and
//! [`DitherError`] unified error type.

mod builder;
mod error;

pub use builder::Quantizer;
pub use error::DitherError;
