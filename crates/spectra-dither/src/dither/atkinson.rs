//! Reduced Atkinson error diffusion.

use crate::color::Srgb;
use crate::palette::Palette;

use super::{dither_with_kernel, Dither, ATKINSON_REDUCED};

/// Error diffusion with the [`ATKINSON_REDUCED`] kernel.
///
/// Pixels are processed in strict row-major order, left to right and top to
/// bottom. Each working value is clamped to the displayable range before
/// matching, and the residue `clamped - actual` is spread over the right
/// neighbor and the three neighbors below. Residue aimed outside the image
/// is dropped.
///
/// # Example
///
/// ```
/// use spectra_dither::{Atkinson, Dither, Palette, Srgb};
///
/// let palette = Palette::spectra6();
/// let pixels = vec![Srgb::from_u8(128, 128, 128); 16];
/// let indices = Atkinson.dither(&pixels, 4, 4, &palette);
/// assert_eq!(indices.len(), 16);
/// ```
pub struct Atkinson;

impl Dither for Atkinson {
    fn dither(&self, image: &[Srgb], width: usize, height: usize, palette: &Palette) -> Vec<u8> {
        dither_with_kernel(image, width, height, palette, &ATKINSON_REDUCED)
    }
}
