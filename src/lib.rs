//! Inkmap - photo conversion for six-color e-paper frames.
//!
//! Converts PNG photos to palette-indexed images for Spectra 6 panels and,
//! optionally, writes keep-out maps marking where overlay text must not go.
//! Quantization lives in the `spectra-dither` crate; this crate holds the
//! keep-out maps, image I/O and the batch driver.

pub mod error;
pub mod keepout;
pub mod models;
pub mod rendering;
pub mod services;
