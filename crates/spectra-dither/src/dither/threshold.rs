//! Independent per-pixel quantization.

use crate::color::Srgb;
use crate::palette::Palette;

use super::Dither;

/// Nearest-color mapping with no error propagation.
///
/// Every pixel is clamped and matched on its own, so the output at a pixel
/// never depends on its neighbors. Fastest mode; flat areas stay flat.
pub struct Threshold;

impl Dither for Threshold {
    fn dither(&self, image: &[Srgb], width: usize, height: usize, palette: &Palette) -> Vec<u8> {
        debug_assert_eq!(image.len(), width * height);
        image
            .iter()
            .map(|&pixel| palette.find_nearest(pixel.clamped()).0 as u8)
            .collect()
    }
}
