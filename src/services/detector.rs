use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::models::{DetectionFile, DetectorOutput};

/// Source of object detections for an image.
///
/// Implementations are synchronous and never fail: anything that prevents
/// detection is reported as [`DetectorOutput::Unavailable`].
pub trait Detector: Send + Sync {
    /// Detect objects in the image at `image`. With `want_masks`, return
    /// per-instance masks when every detection carries one.
    fn detect(&self, image: &Path, want_masks: bool) -> DetectorOutput;
}

/// Reads detections written by an external detector as
/// `<stem>.detections.json`, next to the image or in a separate directory.
#[derive(Debug, Clone, Default)]
pub struct SidecarDetector {
    dir: Option<PathBuf>,
}

impl SidecarDetector {
    pub const SUFFIX: &'static str = ".detections.json";

    /// Look for sidecars next to each image
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for sidecars in `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{stem}{}", Self::SUFFIX);
        match &self.dir {
            Some(dir) => dir.join(name),
            None => image.with_file_name(name),
        }
    }
}

impl Detector for SidecarDetector {
    fn detect(&self, image: &Path, want_masks: bool) -> DetectorOutput {
        let path = self.sidecar_path(image);
        let file = match read_sidecar(&path) {
            Ok(file) => file,
            Err(e) => return DetectorOutput::Unavailable(e.to_string()),
        };

        tracing::debug!(
            path = %path.display(),
            detections = file.detections.len(),
            "Read detections"
        );

        let all_masked = file.detections.iter().all(|d| d.mask.is_some());
        if want_masks && all_masked {
            DetectorOutput::Masks(file.detections)
        } else {
            DetectorOutput::Boxes(file.detections)
        }
    }
}

fn read_sidecar(path: &Path) -> Result<DetectionFile, PipelineError> {
    let unavailable = |e: &dyn std::fmt::Display| {
        PipelineError::DetectorUnavailable(format!("{}: {e}", path.display()))
    };
    let content = std::fs::read_to_string(path).map_err(|e| unavailable(&e))?;
    serde_json::from_str(&content).map_err(|e| unavailable(&e))
}
