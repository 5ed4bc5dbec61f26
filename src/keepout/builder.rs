//! Detections to keep-out mask.
//!
//! Box mode marks each detection's box grown by `margin` on every side.
//! Segmentation mode binarizes each instance mask at 0.5 and dilates it with
//! a `2*margin x 2*margin` rectangle. Masks are OR-ed together.

use serde::Deserialize;

use super::KeepOutMask;
use crate::error::KeepOutError;
use crate::models::{Detection, DetectorOutput, SoftMask};

/// How detections are turned into keep-out pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MaskMethod {
    /// Per-instance masks, dilated by the margin (falls back to boxes)
    #[default]
    Segmentation,
    /// Bounding boxes expanded by the margin
    Boxes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskOptions {
    pub method: MaskMethod,
    /// Pixels added around every detection
    pub margin: u32,
    /// Detections below this confidence are ignored
    pub min_confidence: f32,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            method: MaskMethod::Segmentation,
            margin: 50,
            min_confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaskBuilder {
    options: MaskOptions,
}

impl MaskBuilder {
    pub fn new(options: MaskOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MaskOptions {
        &self.options
    }

    /// Build the keep-out mask for a `width x height` image.
    ///
    /// Returns `Ok(None)` when there is nothing to mark: the detector was
    /// unavailable, or no detection passed the confidence filter. An
    /// all-clear mask is never returned for those cases.
    pub fn build(
        &self,
        output: DetectorOutput,
        width: u32,
        height: u32,
    ) -> Result<Option<KeepOutMask>, KeepOutError> {
        if width == 0 || height == 0 {
            return Err(KeepOutError::InvalidParameter(format!(
                "image must be at least 1x1, got {width}x{height}"
            )));
        }
        let min_confidence = self.options.min_confidence;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(KeepOutError::InvalidParameter(format!(
                "min_confidence must be within 0..=1, got {min_confidence}"
            )));
        }

        let want_masks = self.options.method == MaskMethod::Segmentation;
        let (detections, use_masks) = match output {
            DetectorOutput::Masks(detections) => (detections, want_masks),
            DetectorOutput::Boxes(detections) => {
                if want_masks {
                    tracing::info!("Segmentation masks unavailable, falling back to bounding boxes");
                }
                (detections, false)
            }
            DetectorOutput::Unavailable(reason) => {
                tracing::warn!(%reason, "Detector unavailable, no keep-out map");
                return Ok(None);
            }
        };

        let kept: Vec<&Detection> = detections
            .iter()
            .filter(|d| d.confidence >= min_confidence)
            .collect();
        if kept.is_empty() {
            tracing::debug!(
                total = detections.len(),
                min_confidence,
                "No detections above threshold"
            );
            return Ok(None);
        }

        let mut mask = KeepOutMask::new(width, height);
        for detection in kept {
            match (&detection.mask, use_masks) {
                (Some(soft), true) => {
                    let instance = binarize(soft, width, height)?;
                    let grown = dilate(&instance, self.options.margin)?;
                    mask.union_with(&grown)?;
                }
                (None, true) => {
                    tracing::debug!(
                        label = %detection.display_label(),
                        "Detection has no mask, using its box"
                    );
                    mark_box(&mut mask, detection, self.options.margin);
                }
                (_, false) => mark_box(&mut mask, detection, self.options.margin),
            }
            tracing::debug!(
                label = %detection.display_label(),
                confidence = detection.confidence,
                "Marked detection"
            );
        }

        tracing::info!(
            coverage = format!("{:.1}", mask.coverage()),
            "Built keep-out mask"
        );
        Ok(Some(mask))
    }
}

/// Mark `[x1 - m, x2 + m) x [y1 - m, y2 + m)`; coordinates truncate toward zero.
fn mark_box(mask: &mut KeepOutMask, detection: &Detection, margin: u32) {
    let [x1, y1, x2, y2] = detection.bbox;
    let m = margin as i64;
    mask.fill_rect(
        x1 as i64 - m,
        y1 as i64 - m,
        x2 as i64 + m,
        y2 as i64 + m,
    );
}

/// Threshold a soft mask at 0.5, resampling nearest-neighbour to the image size.
fn binarize(soft: &SoftMask, width: u32, height: u32) -> Result<KeepOutMask, KeepOutError> {
    let declared = soft.width as usize * soft.height as usize;
    if soft.data.len() != declared || declared == 0 {
        return Err(KeepOutError::Dimension(format!(
            "instance mask declares {}x{} but holds {} values",
            soft.width,
            soft.height,
            soft.data.len()
        )));
    }

    let (sw, sh) = (soft.width as u64, soft.height as u64);
    let (dw, dh) = (width as u64, height as u64);
    let mut cells = Vec::with_capacity(width as usize * height as usize);
    for y in 0..dh {
        let sy = (y * sh / dh) as usize;
        for x in 0..dw {
            let sx = (x * sw / dw) as usize;
            cells.push(soft.data[sy * soft.width as usize + sx] > 0.5);
        }
    }
    KeepOutMask::from_cells(width, height, cells)
}

/// Dilate with a `2m x 2m` rectangle anchored at `(m, m)`.
///
/// A set source pixel at `s` marks `[s - m + 1, s + m]` on each axis.
/// Separable: a horizontal pass, then a vertical pass, each a sliding count.
fn dilate(mask: &KeepOutMask, margin: u32) -> Result<KeepOutMask, KeepOutError> {
    if margin == 0 {
        return Ok(mask.clone());
    }
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let m = margin as usize;

    let mut horizontal = vec![false; w * h];
    for y in 0..h {
        let row = &mask.cells()[y * w..(y + 1) * w];
        dilate_line(w, m, |i| row[i], |i| horizontal[y * w + i] = true);
    }

    let mut cells = vec![false; w * h];
    for x in 0..w {
        dilate_line(h, m, |i| horizontal[i * w + x], |i| cells[i * w + x] = true);
    }

    KeepOutMask::from_cells(mask.width(), mask.height(), cells)
}

/// 1-D dilation of a line of `len` cells: output `i` is set when any input
/// in `[i - m, i + m - 1]` is set.
fn dilate_line(len: usize, m: usize, input: impl Fn(usize) -> bool, mut mark: impl FnMut(usize)) {
    // prefix[i] = set inputs in [0, i)
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0usize);
    for i in 0..len {
        prefix.push(prefix[i] + input(i) as usize);
    }
    for i in 0..len {
        let lo = i.saturating_sub(m);
        let hi = (i + m).min(len);
        if prefix[hi] > prefix[lo] {
            mark(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(detections: Vec<Detection>) -> DetectorOutput {
        DetectorOutput::Boxes(detections)
    }

    fn box_builder(margin: u32) -> MaskBuilder {
        MaskBuilder::new(MaskOptions {
            method: MaskMethod::Boxes,
            margin,
            ..Default::default()
        })
    }

    #[test]
    fn test_zero_detections_is_none() {
        let builder = box_builder(5);
        assert_eq!(builder.build(boxes(vec![]), 100, 100).unwrap(), None);
    }

    #[test]
    fn test_unavailable_detector_is_none() {
        let builder = MaskBuilder::default();
        let output = DetectorOutput::Unavailable("model not found".into());
        assert_eq!(builder.build(output, 100, 100).unwrap(), None);
    }

    #[test]
    fn test_low_confidence_detections_are_dropped() {
        let builder = box_builder(5);
        let output = boxes(vec![Detection::from_box(10.0, 10.0, 20.0, 20.0, 0.1)]);
        assert_eq!(builder.build(output, 100, 100).unwrap(), None);
    }

    #[test]
    fn test_box_margin_expansion() {
        let builder = box_builder(5);
        let output = boxes(vec![Detection::from_box(10.0, 10.0, 20.0, 20.0, 0.9)]);
        let mask = builder.build(output, 100, 100).unwrap().unwrap();

        // [5, 25) on both axes
        assert!(mask.get(5, 5));
        assert!(mask.get(24, 24));
        assert!(!mask.get(4, 4));
        assert!(!mask.get(25, 25));
        assert!(!mask.get(1, 1));
        assert_eq!(mask.count(), 20 * 20);
    }

    #[test]
    fn test_wider_margin_reaches_corner() {
        let builder = box_builder(7);
        let output = boxes(vec![Detection::from_box(10.0, 10.0, 20.0, 20.0, 0.9)]);
        let mask = builder.build(output, 100, 100).unwrap().unwrap();
        assert!(mask.get(3, 3));
        assert!(!mask.get(1, 1));
    }

    #[test]
    fn test_box_clamped_to_image() {
        let builder = box_builder(50);
        let output = boxes(vec![Detection::from_box(0.0, 0.0, 10.0, 10.0, 0.9)]);
        let mask = builder.build(output, 40, 30).unwrap().unwrap();
        assert_eq!(mask.count(), 40 * 30);
    }

    #[test]
    fn test_box_coordinates_truncate() {
        let builder = box_builder(0);
        let output = boxes(vec![Detection::from_box(1.9, 1.9, 3.9, 2.5, 0.9)]);
        let mask = builder.build(output, 10, 10).unwrap().unwrap();
        // [1, 3) x [1, 2)
        assert_eq!(mask.count(), 2);
        assert!(mask.get(1, 1) && mask.get(2, 1));
    }

    #[test]
    fn test_overlapping_boxes_union() {
        let builder = box_builder(0);
        let output = boxes(vec![
            Detection::from_box(0.0, 0.0, 4.0, 4.0, 0.9),
            Detection::from_box(2.0, 2.0, 6.0, 6.0, 0.8),
        ]);
        let mask = builder.build(output, 10, 10).unwrap().unwrap();
        assert_eq!(mask.count(), 16 + 16 - 4);
    }

    fn point_mask(width: u32, height: u32, x: u32, y: u32) -> SoftMask {
        let mut data = vec![0.0; (width * height) as usize];
        data[(y * width + x) as usize] = 1.0;
        SoftMask {
            width,
            height,
            data,
        }
    }

    #[test]
    fn test_segmentation_dilation_extent() {
        let builder = MaskBuilder::new(MaskOptions {
            method: MaskMethod::Segmentation,
            margin: 2,
            ..Default::default()
        });
        let det = Detection::from_box(10.0, 10.0, 11.0, 11.0, 0.9)
            .with_mask(point_mask(20, 20, 10, 10));
        let mask = builder
            .build(DetectorOutput::Masks(vec![det]), 20, 20)
            .unwrap()
            .unwrap();

        // 2m x 2m rectangle anchored at m: [s - m + 1, s + m] = [9, 12]
        assert_eq!(mask.count(), 4 * 4);
        assert!(mask.get(9, 9));
        assert!(mask.get(12, 12));
        assert!(!mask.get(8, 10));
        assert!(!mask.get(13, 10));
    }

    #[test]
    fn test_segmentation_zero_margin_is_plain_threshold() {
        let builder = MaskBuilder::new(MaskOptions {
            method: MaskMethod::Segmentation,
            margin: 0,
            ..Default::default()
        });
        let soft = SoftMask {
            width: 3,
            height: 1,
            data: vec![0.2, 0.5, 0.51],
        };
        let det = Detection::from_box(0.0, 0.0, 3.0, 1.0, 0.9).with_mask(soft);
        let mask = builder
            .build(DetectorOutput::Masks(vec![det]), 3, 1)
            .unwrap()
            .unwrap();
        assert_eq!(mask.cells(), &[false, false, true]);
    }

    #[test]
    fn test_segmentation_mask_is_resampled() {
        let builder = MaskBuilder::new(MaskOptions {
            method: MaskMethod::Segmentation,
            margin: 0,
            ..Default::default()
        });
        // 2x2 mask with the top-left quadrant set, image 4x4
        let soft = SoftMask {
            width: 2,
            height: 2,
            data: vec![1.0, 0.0, 0.0, 0.0],
        };
        let det = Detection::from_box(0.0, 0.0, 2.0, 2.0, 0.9).with_mask(soft);
        let mask = builder
            .build(DetectorOutput::Masks(vec![det]), 4, 4)
            .unwrap()
            .unwrap();
        assert_eq!(mask.count(), 4);
        assert!(mask.get(1, 1));
        assert!(!mask.get(2, 0));
    }

    #[test]
    fn test_segmentation_bad_mask_length() {
        let builder = MaskBuilder::default();
        let soft = SoftMask {
            width: 4,
            height: 4,
            data: vec![1.0; 15],
        };
        let det = Detection::from_box(0.0, 0.0, 2.0, 2.0, 0.9).with_mask(soft);
        assert!(matches!(
            builder.build(DetectorOutput::Masks(vec![det]), 4, 4),
            Err(KeepOutError::Dimension(_))
        ));
    }

    #[test]
    fn test_segmentation_falls_back_to_boxes() {
        let builder = MaskBuilder::new(MaskOptions {
            method: MaskMethod::Segmentation,
            margin: 5,
            ..Default::default()
        });
        let output = boxes(vec![Detection::from_box(10.0, 10.0, 20.0, 20.0, 0.9)]);
        let mask = builder.build(output, 100, 100).unwrap().unwrap();
        assert!(mask.get(5, 5));
        assert!(!mask.get(4, 4));
    }

    #[test]
    fn test_box_method_ignores_masks() {
        let builder = box_builder(0);
        let det = Detection::from_box(0.0, 0.0, 5.0, 5.0, 0.9).with_mask(point_mask(10, 10, 0, 0));
        let mask = builder
            .build(DetectorOutput::Masks(vec![det]), 10, 10)
            .unwrap()
            .unwrap();
        assert_eq!(mask.count(), 25);
    }

    #[test]
    fn test_invalid_parameters() {
        let builder = box_builder(5);
        assert!(matches!(
            builder.build(boxes(vec![]), 0, 10),
            Err(KeepOutError::InvalidParameter(_))
        ));

        let builder = MaskBuilder::new(MaskOptions {
            min_confidence: 1.5,
            ..Default::default()
        });
        assert!(matches!(
            builder.build(boxes(vec![]), 10, 10),
            Err(KeepOutError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_dilate_line_window() {
        let input = [false, false, false, true, false, false, false, false];
        let mut out = [false; 8];
        dilate_line(8, 2, |i| input[i], |i| out[i] = true);
        // source 3 with m = 2 marks [2, 5]
        assert_eq!(out, [false, false, true, true, true, true, false, false]);
    }
}
