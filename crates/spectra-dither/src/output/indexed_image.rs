//! IndexedImage struct with its output format methods.

use crate::palette::Palette;

/// The canonical output of the quantizer.
///
/// Stores one `u8` palette index per pixel in row-major order, along with
/// image dimensions and the palette used for quantization. Indices are
/// positional codes: index `i` always means official color `i`.
///
/// # Example
///
/// ```
/// use spectra_dither::{IndexedImage, Palette, Srgb};
///
/// let official = [Srgb::from_u8(0, 0, 0), Srgb::from_u8(255, 255, 255)];
/// let palette = Palette::new(&official, None).unwrap();
///
/// let image = IndexedImage::new(vec![0, 1, 1, 0], 2, 2, palette);
///
/// assert_eq!(image.width(), 2);
/// assert_eq!(image.indices(), &[0, 1, 1, 0]);
/// assert_eq!(image.to_rgb_official().len(), 2 * 2 * 3);
/// ```
#[derive(Debug, Clone)]
pub struct IndexedImage {
    indices: Vec<u8>,
    width: usize,
    height: usize,
    palette: Palette,
}

impl IndexedImage {
    /// Create a new `IndexedImage` from palette indices.
    ///
    /// # Panics (debug only)
    ///
    /// Debug-asserts that `indices.len() == width * height`.
    pub fn new(indices: Vec<u8>, width: usize, height: usize, palette: Palette) -> Self {
        debug_assert_eq!(
            indices.len(),
            width * height,
            "indices length ({}) must match width * height ({}x{}={})",
            indices.len(),
            width,
            height,
            width * height,
        );
        Self {
            indices,
            width,
            height,
            palette,
        }
    }

    /// Returns the palette indices as a slice.
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Consume the image and return the raw indices.
    pub fn into_indices(self) -> Vec<u8> {
        self.indices
    }

    /// Returns the image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a reference to the palette used for this image.
    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Pixel count per palette entry, indexed like the palette.
    pub fn histogram(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.palette.len()];
        for &idx in &self.indices {
            counts[idx as usize] += 1;
        }
        counts
    }

    /// Convert to RGB bytes using official panel colors.
    ///
    /// Layout is `[R, G, B, R, G, B, ...]`, length `width * height * 3`.
    pub fn to_rgb_official(&self) -> Vec<u8> {
        self.expand(|idx| self.palette.official(idx).to_bytes())
    }

    /// Convert to RGB bytes using actual (measured) colors, for previews.
    pub fn to_rgb_actual(&self) -> Vec<u8> {
        self.expand(|idx| self.palette.actual(idx).to_bytes())
    }

    fn expand(&self, color_of: impl Fn(usize) -> [u8; 3]) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.indices.len() * 3);
        for &idx in &self.indices {
            rgb.extend_from_slice(&color_of(idx as usize));
        }
        rgb
    }
}
