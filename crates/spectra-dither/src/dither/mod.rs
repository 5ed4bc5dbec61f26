//! Quantization algorithms.
//!
//! This module maps continuous-tone sRGB pixels onto a small panel palette.
//!
//! # Algorithms
//!
//! - **Atkinson** (reduced): 5/8 error propagation over one row of
//!   look-ahead, the default for photographs on the panel
//! - **Floyd-Steinberg**: classic 100% propagation
//! - **Threshold**: independent nearest-color mapping, no propagation
//!
//! # Architecture
//!
//! All algorithms implement the [`Dither`] trait. [`QuantizeMode`] selects
//! one of them at runtime. Error is accumulated in sRGB space in the same
//! units the distance metric sees, so the residue that is diffused is exactly
//! `clamped working value - actual palette color`.
//!
//! # Example
//!
//! ```
//! use spectra_dither::{Dither, Palette, QuantizeMode, Srgb};
//!
//! let palette = Palette::spectra6();
//! let pixels = vec![Srgb::from_u8(200, 120, 80); 9];
//!
//! let indices = QuantizeMode::ErrorDiffusion.dither(&pixels, 3, 3, &palette);
//! assert_eq!(indices.len(), 9);
//! ```

mod atkinson;
mod floyd_steinberg;
mod kernel;
mod threshold;

use std::fmt;
use std::str::FromStr;

pub use atkinson::Atkinson;
pub use floyd_steinberg::FloydSteinberg;
pub use kernel::*;
pub use threshold::Threshold;

use crate::color::Srgb;
use crate::palette::Palette;

/// Quantization mode selection.
///
/// Parses from and displays as the kebab-case names used on the command
/// line and in configuration files.
///
/// ```
/// use spectra_dither::QuantizeMode;
///
/// let mode: QuantizeMode = "floyd-steinberg".parse().unwrap();
/// assert_eq!(mode, QuantizeMode::FloydSteinberg);
/// assert_eq!(mode.to_string(), "floyd-steinberg");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantizeMode {
    /// Reduced Atkinson error diffusion ([`Atkinson`]).
    #[default]
    ErrorDiffusion,

    /// Floyd-Steinberg error diffusion ([`FloydSteinberg`]).
    FloydSteinberg,

    /// Independent per-pixel mapping ([`Threshold`]).
    Threshold,
}

impl QuantizeMode {
    /// All modes, in declaration order.
    pub const ALL: [QuantizeMode; 3] = [
        QuantizeMode::ErrorDiffusion,
        QuantizeMode::FloydSteinberg,
        QuantizeMode::Threshold,
    ];

    /// Kebab-case name of the mode.
    pub fn name(self) -> &'static str {
        match self {
            QuantizeMode::ErrorDiffusion => "error-diffusion",
            QuantizeMode::FloydSteinberg => "floyd-steinberg",
            QuantizeMode::Threshold => "threshold",
        }
    }

    /// The diffusion kernel used by this mode, if any.
    pub fn kernel(self) -> Option<&'static Kernel> {
        match self {
            QuantizeMode::ErrorDiffusion => Some(&ATKINSON_REDUCED),
            QuantizeMode::FloydSteinberg => Some(&FLOYD_STEINBERG),
            QuantizeMode::Threshold => None,
        }
    }
}

impl Dither for QuantizeMode {
    fn dither(&self, image: &[Srgb], width: usize, height: usize, palette: &Palette) -> Vec<u8> {
        match self {
            QuantizeMode::ErrorDiffusion => Atkinson.dither(image, width, height, palette),
            QuantizeMode::FloydSteinberg => FloydSteinberg.dither(image, width, height, palette),
            QuantizeMode::Threshold => Threshold.dither(image, width, height, palette),
        }
    }
}

impl fmt::Display for QuantizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown [`QuantizeMode`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(pub String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown quantize mode '{}' (expected error-diffusion, floyd-steinberg or threshold)",
            self.0
        )
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for QuantizeMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error-diffusion" | "atkinson" => Ok(QuantizeMode::ErrorDiffusion),
            "floyd-steinberg" | "fs" => Ok(QuantizeMode::FloydSteinberg),
            "threshold" | "none" => Ok(QuantizeMode::Threshold),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Trait for quantization algorithms.
///
/// Implementors convert a continuous-tone image to palette indices.
pub trait Dither {
    /// Quantize an image to palette indices.
    ///
    /// # Arguments
    ///
    /// * `image` - Input pixels in sRGB (row-major order, `width * height` long)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `palette` - Palette to match against
    ///
    /// # Returns
    ///
    /// One palette index per pixel, in row-major order. Each index is in
    /// `0..palette.len()`.
    fn dither(&self, image: &[Srgb], width: usize, height: usize, palette: &Palette) -> Vec<u8>;
}

/// Error buffer for efficient error diffusion.
///
/// Manages a sliding window of error rows, storing only the rows that
/// the diffusion kernel can reach (determined by `max_dy`). This avoids
/// allocating a full-image floating-point working copy.
///
/// # Usage Pattern
///
/// 1. Create buffer with `new(width, row_depth)`
/// 2. For each row:
///    a. Read accumulated error with `get_accumulated(x)`
///    b. After processing pixel, distribute error with `add_error(x, dy, error)`
///    c. After row complete, call `advance_row()`
#[derive(Debug)]
pub struct ErrorBuffer {
    /// Error rows: rows[0] is current row, rows[1] is next, etc.
    rows: Vec<Vec<[f32; 3]>>,
    width: usize,
}

impl ErrorBuffer {
    /// Create a new error buffer.
    ///
    /// * `width` - Image width in pixels
    /// * `row_depth` - Number of rows to track (kernel's `max_dy + 1`)
    pub fn new(width: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth).map(|_| vec![[0.0; 3]; width]).collect(),
            width,
        }
    }

    /// Get accumulated error for a pixel in the current row.
    #[inline]
    pub fn get_accumulated(&self, x: usize) -> [f32; 3] {
        self.rows[0][x]
    }

    /// Add error to a future pixel.
    ///
    /// `row_offset` 0 is the current row. Silently ignores out-of-bounds
    /// coordinates.
    #[inline]
    pub fn add_error(&mut self, x: usize, row_offset: usize, error: [f32; 3]) {
        if x < self.width && row_offset < self.rows.len() {
            for c in 0..3 {
                self.rows[row_offset][x][c] += error[c];
            }
        }
    }

    /// Advance to the next row.
    ///
    /// Rotates the row buffer: the first row is discarded, subsequent rows
    /// shift forward, and a new zeroed row is added at the end.
    pub fn advance_row(&mut self) {
        // Rotate left: [0,1,2] -> [1,2,0]
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill([0.0; 3]);
        }
    }
}

/// Core error diffusion loop parameterized by kernel.
///
/// Strict row-major scan, left to right. For each pixel:
///
/// 1. working value = input + accumulated residue, clamped to `0.0..=1.0`
/// 2. nearest palette entry under the palette's metric (actual colors)
/// 3. residue = clamped working value - actual color of that entry
/// 4. residue * weight / divisor is added to each in-bounds kernel target
///
/// Targets are always later in scan order than the current pixel, so every
/// contribution lands before that pixel is read.
pub(crate) fn dither_with_kernel(
    image: &[Srgb],
    width: usize,
    height: usize,
    palette: &Palette,
    kernel: &Kernel,
) -> Vec<u8> {
    debug_assert_eq!(image.len(), width * height);
    let mut output = vec![0u8; width * height];
    let mut error_buf = ErrorBuffer::new(width, kernel.max_dy + 1);
    let divisor = kernel.divisor as f32;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;

            let accumulated = error_buf.get_accumulated(x);
            let pixel = Srgb::new(
                image[idx].r + accumulated[0],
                image[idx].g + accumulated[1],
                image[idx].b + accumulated[2],
            )
            .clamped();

            let (nearest_idx, _dist) = palette.find_nearest(pixel);
            output[idx] = nearest_idx as u8;

            let chosen = palette.actual(nearest_idx);
            let error = [pixel.r - chosen.r, pixel.g - chosen.g, pixel.b - chosen.b];

            for &(dx, dy, weight) in kernel.entries {
                let nx = x as i32 + dx;
                if nx < 0 || nx as usize >= width || y + dy as usize >= height {
                    continue;
                }
                let w = weight as f32 / divisor;
                error_buf.add_error(
                    nx as usize,
                    dy as usize,
                    [error[0] * w, error[1] * w, error[2] * w],
                );
            }
        }

        error_buf.advance_row();
    }

    output
}
