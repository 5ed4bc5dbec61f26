use serde::Deserialize;

/// Per-instance soft mask in `[0, 1]`, row-major.
///
/// The declared size may differ from the image; the mask builder resamples
/// it nearest-neighbour. `data.len()` must equal `width * height`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoftMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

/// One instance reported by the external detector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in image pixel coordinates
    #[serde(rename = "box")]
    pub bbox: [f32; 4],

    pub confidence: f32,

    #[serde(default)]
    pub class_id: u32,

    /// Human-readable class name, used only in logs
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub mask: Option<SoftMask>,
}

impl Detection {
    pub fn from_box(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Self {
        Self {
            bbox: [x1, y1, x2, y2],
            confidence,
            class_id: 0,
            label: None,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: SoftMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Label for logs, falling back to the class id.
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("class {}", self.class_id))
    }
}

/// What the detector could deliver for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorOutput {
    /// Bounding boxes only (plain detection, or segmentation was not available)
    Boxes(Vec<Detection>),
    /// Every detection carries a per-instance mask
    Masks(Vec<Detection>),
    /// The detector could not be invoked at all
    Unavailable(String),
}

impl DetectorOutput {
    pub fn detections(&self) -> &[Detection] {
        match self {
            DetectorOutput::Boxes(d) | DetectorOutput::Masks(d) => d,
            DetectorOutput::Unavailable(_) => &[],
        }
    }
}

/// On-disk shape of a detector sidecar file.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionFile {
    #[serde(default)]
    pub detections: Vec<Detection>,
}
