//! Quantizer builder -- the primary entry point for the crate.
//!
//! [`Quantizer`] pairs a [`Palette`] with a [`QuantizeMode`] and validates
//! the pixel buffer before running the selected algorithm.

use crate::api::DitherError;
use crate::color::Srgb;
use crate::dither::{Dither, QuantizeMode};
use crate::output::IndexedImage;
use crate::palette::{DistanceMetric, Palette};

/// High-level quantizer for the color panel.
///
/// # Design
///
/// - Constructor requires [`Palette`] (no invalid states)
/// - Configuration methods consume and return `self`
/// - [`quantize()`](Self::quantize) takes `&self` so the quantizer is
///   reusable across images and shareable across threads
/// - The distance metric lives on the palette, so one run never mixes metrics
///
/// # Example
///
/// ```
/// use spectra_dither::{Palette, QuantizeMode, Quantizer, Srgb};
///
/// let quantizer = Quantizer::new(Palette::spectra6()).mode(QuantizeMode::ErrorDiffusion);
///
/// let pixels = vec![Srgb::from_u8(128, 128, 128); 4];
/// let result = quantizer.quantize(&pixels, 2, 2).unwrap();
///
/// assert_eq!(result.width(), 2);
/// assert_eq!(result.height(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Quantizer {
    palette: Palette,
    mode: QuantizeMode,
}

impl Quantizer {
    /// Create a new quantizer. Default mode is [`QuantizeMode::ErrorDiffusion`].
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            mode: QuantizeMode::default(),
        }
    }

    /// Set the quantization mode.
    #[inline]
    pub fn mode(mut self, mode: QuantizeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the palette's distance metric.
    #[inline]
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.palette = self.palette.with_distance_metric(metric);
        self
    }

    /// The palette used for matching and output.
    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The configured mode.
    #[inline]
    pub fn quantize_mode(&self) -> QuantizeMode {
        self.mode
    }

    /// Quantize raw sRGB pixels into an [`IndexedImage`].
    ///
    /// Deterministic: identical input and palette always give identical
    /// indices.
    ///
    /// # Errors
    ///
    /// - [`DitherError::InvalidParameter`] if `width` or `height` is zero
    /// - [`DitherError::Dimension`] if `pixels.len() != width * height`
    pub fn quantize(
        &self,
        pixels: &[Srgb],
        width: usize,
        height: usize,
    ) -> Result<IndexedImage, DitherError> {
        if width == 0 || height == 0 {
            return Err(DitherError::InvalidParameter(format!(
                "image must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        let expected = width.checked_mul(height).ok_or_else(|| {
            DitherError::InvalidParameter(format!("image {}x{} is too large", width, height))
        })?;
        if pixels.len() != expected {
            return Err(DitherError::Dimension {
                expected,
                actual: pixels.len(),
            });
        }

        let indices = self.mode.dither(pixels, width, height, &self.palette);
        Ok(IndexedImage::new(
            indices,
            width,
            height,
            self.palette.clone(),
        ))
    }

    /// Quantize packed 8-bit RGB bytes (`[R, G, B, R, G, B, ...]`).
    ///
    /// # Errors
    ///
    /// Same as [`quantize()`](Self::quantize); a byte count that is not a
    /// multiple of three is a [`DitherError::Dimension`] error.
    pub fn quantize_rgb8(
        &self,
        rgb: &[u8],
        width: usize,
        height: usize,
    ) -> Result<IndexedImage, DitherError> {
        if rgb.len() % 3 != 0 {
            return Err(DitherError::Dimension {
                expected: width.saturating_mul(height).saturating_mul(3),
                actual: rgb.len(),
            });
        }
        let pixels: Vec<Srgb> = rgb
            .chunks_exact(3)
            .map(|c| Srgb::from_u8(c[0], c[1], c[2]))
            .collect();
        self.quantize(&pixels, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_4x4() -> Vec<Srgb> {
        (0..16)
            .map(|i| {
                let v = (i as f32 / 15.0 * 255.0) as u8;
                Srgb::from_u8(v, v, v)
            })
            .collect()
    }

    #[test]
    fn test_new_defaults() {
        let quantizer = Quantizer::new(Palette::spectra6());
        assert_eq!(quantizer.quantize_mode(), QuantizeMode::ErrorDiffusion);
        assert_eq!(quantizer.palette().distance_metric(), DistanceMetric::SPECTRA);
    }

    #[test]
    fn test_builder_chaining() {
        let quantizer = Quantizer::new(Palette::spectra6())
            .mode(QuantizeMode::Threshold)
            .metric(DistanceMetric::CieLab76);
        assert_eq!(quantizer.quantize_mode(), QuantizeMode::Threshold);
        assert_eq!(quantizer.palette().distance_metric(), DistanceMetric::CieLab76);
    }

    #[test]
    fn test_quantize_produces_valid_output() {
        let palette = Palette::spectra6();
        let quantizer = Quantizer::new(palette.clone());

        let result = quantizer.quantize(&gradient_4x4(), 4, 4).unwrap();

        assert_eq!(result.width(), 4);
        assert_eq!(result.height(), 4);
        assert_eq!(result.indices().len(), 16);
        assert!(result.indices().iter().all(|&i| (i as usize) < palette.len()));
    }

    #[test]
    fn test_quantize_reusable_and_deterministic() {
        let quantizer = Quantizer::new(Palette::spectra6_measured());
        let pixels = gradient_4x4();

        let result1 = quantizer.quantize(&pixels, 4, 4).unwrap();
        let result2 = quantizer.quantize(&pixels, 4, 4).unwrap();
        assert_eq!(result1.indices(), result2.indices());
    }

    #[test]
    fn test_zero_size_is_invalid_parameter() {
        let quantizer = Quantizer::new(Palette::spectra6());
        assert!(matches!(
            quantizer.quantize(&[], 0, 4),
            Err(DitherError::InvalidParameter(_))
        ));
        assert!(matches!(
            quantizer.quantize(&[], 4, 0),
            Err(DitherError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_length_mismatch_is_dimension_error() {
        let quantizer = Quantizer::new(Palette::spectra6());
        let pixels = vec![Srgb::from_u8(0, 0, 0); 11];
        assert!(matches!(
            quantizer.quantize(&pixels, 4, 3),
            Err(DitherError::Dimension {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn test_quantize_rgb8() {
        let quantizer = Quantizer::new(Palette::spectra6()).mode(QuantizeMode::Threshold);
        let rgb = [0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 255, 0];
        let result = quantizer.quantize_rgb8(&rgb, 2, 2).unwrap();
        assert_eq!(result.indices(), &[0, 1, 3, 5]);

        assert!(matches!(
            quantizer.quantize_rgb8(&rgb[..11], 2, 2),
            Err(DitherError::Dimension { .. })
        ));
    }
}
