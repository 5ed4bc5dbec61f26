use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use spectra_dither::Quantizer;

use crate::error::PipelineError;
use crate::keepout::{self, KeepOutMask, MaskBuilder};
use crate::models::AppConfig;
use crate::rendering;
use crate::services::{Detector, SidecarDetector};

/// What one conversion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Written keep-out map, if any
    pub map: Option<MapOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOutcome {
    pub path: PathBuf,
    /// Percentage of keep-out pixels
    pub coverage: f64,
}

/// Per-image conversion: PNG in, palette-indexed PNG (and optional keep-out
/// map) out.
pub struct Converter {
    quantizer: Quantizer,
    detector: Arc<dyn Detector>,
    /// `None` disables map generation
    mask_builder: Option<MaskBuilder>,
    optimize_png: bool,
    output_dir: Option<PathBuf>,
}

impl Converter {
    pub fn new(quantizer: Quantizer, detector: Arc<dyn Detector>) -> Self {
        Self {
            quantizer,
            detector,
            mask_builder: None,
            optimize_png: true,
            output_dir: None,
        }
    }

    /// Build from configuration, reading detections from sidecar files.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let palette = config
            .build_palette()
            .map_err(spectra_dither::DitherError::from)?;
        let quantizer = Quantizer::new(palette).mode(config.quantize.mode.into());

        let mut converter = Self::new(quantizer, Arc::new(SidecarDetector::new()))
            .optimize_png(config.output.optimize_png);
        if config.keepout.enabled {
            converter = converter.keep_out(MaskBuilder::new(config.keepout.mask_options()));
        }
        if let Some(dir) = &config.output.directory {
            converter = converter.output_dir(dir);
        }
        Ok(converter)
    }

    pub fn detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn keep_out(mut self, builder: MaskBuilder) -> Self {
        self.mask_builder = Some(builder);
        self
    }

    pub fn optimize_png(mut self, enabled: bool) -> Self {
        self.optimize_png = enabled;
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    /// `<stem>_output.<ext>` in the output directory, or next to the input.
    pub fn output_path(&self, input: &Path, ext: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{stem}_output.{ext}");
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }

    /// Convert one image. Blocking; run on a blocking thread from async code.
    pub fn convert(&self, input: &Path) -> Result<ConvertOutcome, PipelineError> {
        self.convert_with_cancel(input, &AtomicBool::new(false))
    }

    /// Like [`convert`](Self::convert), but stops with
    /// [`PipelineError::Cancelled`] once `cancel` is set.
    ///
    /// All work happens before the first write; `cancel` is checked between
    /// the slow stages and once more right before writing, so a cancelled
    /// conversion leaves no files behind.
    pub fn convert_with_cancel(
        &self,
        input: &Path,
        cancel: &AtomicBool,
    ) -> Result<ConvertOutcome, PipelineError> {
        let image = rendering::load_png(input)?;
        let (width, height) = (image.width, image.height);
        check_cancel(cancel)?;

        let indexed = self
            .quantizer
            .quantize(&image.to_srgb(), width as usize, height as usize)?;
        let png_bytes = rendering::encode_indexed_png(&indexed, self.optimize_png)?;
        check_cancel(cancel)?;

        let mask = match &self.mask_builder {
            Some(builder) => self.build_mask(builder, input, width, height)?,
            None => None,
        };
        check_cancel(cancel)?;

        let output = self.output_path(input, "png");
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output, &png_bytes)?;
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            width,
            height,
            mode = %self.quantizer.quantize_mode(),
            "Converted image"
        );

        let map = match mask {
            Some(mask) => {
                let path = self.output_path(input, "map");
                keepout::write_map_file(&path, &mask)?;
                let coverage = mask.coverage();
                tracing::info!(
                    path = %path.display(),
                    coverage = format!("{coverage:.1}%"),
                    "Keep-out map written"
                );
                Some(MapOutcome { path, coverage })
            }
            None => None,
        };

        Ok(ConvertOutcome {
            input: input.to_path_buf(),
            output,
            width,
            height,
            map,
        })
    }

    fn build_mask(
        &self,
        builder: &MaskBuilder,
        input: &Path,
        width: u32,
        height: u32,
    ) -> Result<Option<KeepOutMask>, PipelineError> {
        let want_masks = builder.options().method == keepout::MaskMethod::Segmentation;
        let detections = self.detector.detect(input, want_masks);

        let mask = builder.build(detections, width, height)?;
        if mask.is_none() {
            tracing::info!(input = %input.display(), "No keep-out regions, map skipped");
        }
        Ok(mask)
    }
}

impl ConvertOutcome {
    /// Remove the files this conversion wrote. Missing files are ignored.
    pub fn remove_outputs(&self) {
        let map = self.map.as_ref().map(|m| m.path.as_path());
        for path in std::iter::once(self.output.as_path()).chain(map) {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove output");
                }
            }
        }
    }
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), PipelineError> {
    if cancel.load(Ordering::Acquire) {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}
