//! Floyd-Steinberg error diffusion dithering algorithm.

use crate::color::Srgb;
use crate::palette::Palette;

use super::{dither_with_kernel, Dither, FLOYD_STEINBERG};

/// Floyd-Steinberg error diffusion dithering.
///
/// The classic full-error kernel:
///
/// ```text
///        X   7
///    3   5   1
/// ```
///
/// Weights: 7/16 right, 3/16 bottom-left, 5/16 bottom, 1/16 bottom-right.
/// Smoother gradients than [`Atkinson`](super::Atkinson) at the cost of more
/// color bleeding on a six-color panel.
pub struct FloydSteinberg;

impl Dither for FloydSteinberg {
    fn dither(&self, image: &[Srgb], width: usize, height: usize, palette: &Palette) -> Vec<u8> {
        dither_with_kernel(image, width, height, palette, &FLOYD_STEINBERG)
    }
}
