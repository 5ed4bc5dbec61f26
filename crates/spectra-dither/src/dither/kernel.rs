//! Error diffusion kernel definitions.
//!
//! Each kernel specifies how quantization error is distributed to
//! neighboring pixels that have not been quantized yet.

/// An error diffusion kernel.
///
/// Each entry specifies an offset `(dx, dy)` and a weight for that
/// neighbor. Every neighbor receives `error * weight / divisor`.
///
/// # Error Propagation
///
/// The total error propagated is `sum(weights) / divisor`. Floyd-Steinberg
/// propagates 100%; the reduced Atkinson kernel deliberately discards the
/// rest of the residue to limit color bleeding on a six-color panel.
///
/// # Buffer Sizing
///
/// The `max_dy` field indicates how many rows ahead the kernel reaches,
/// which determines the error buffer depth needed: `max_dy + 1` rows.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    /// (dx, dy, weight) entries for error diffusion.
    ///
    /// - `dx`: horizontal offset (positive = right)
    /// - `dy`: vertical offset (always >= 0, below the current row)
    /// - `weight`: numerator, divisor is separate
    pub entries: &'static [(i32, i32, u8)],

    /// Total divisor for normalizing weights.
    pub divisor: u8,

    /// Maximum dy value in entries.
    pub max_dy: usize,
}

impl Kernel {
    /// Fraction of the quantization error this kernel hands on to neighbors.
    pub fn propagated_fraction(&self) -> f32 {
        let sum: u32 = self.entries.iter().map(|&(_, _, w)| w as u32).sum();
        sum as f32 / self.divisor as f32
    }
}

/// Reduced Atkinson kernel used by the panel pipeline.
///
/// Four neighbors, one row of look-ahead:
///
/// ```text
///        X   1
///    1   2   1
/// ```
///
/// 1/8 + 1/8 + 1/4 + 1/8 of the residue is propagated. The classic
/// Atkinson reach of two pixels is dropped, and the remainder is discarded.
pub const ATKINSON_REDUCED: Kernel = Kernel {
    entries: &[
        (1, 0, 1),  // right
        (-1, 1, 1), // bottom-left
        (0, 1, 2),  // bottom
        (1, 1, 1),  // bottom-right
    ],
    divisor: 8,
    max_dy: 1,
};

/// Floyd-Steinberg dithering kernel.
///
/// Distributes error to 4 neighbors with 100% total propagation (16/16).
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[
        (1, 0, 7),  // right
        (-1, 1, 3), // bottom-left
        (0, 1, 5),  // bottom
        (1, 1, 1),  // bottom-right
    ],
    divisor: 16,
    max_dy: 1,
};
