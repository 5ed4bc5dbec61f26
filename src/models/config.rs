use crate::error::ConfigError;
use crate::keepout::{MaskMethod, MaskOptions};
use serde::Deserialize;
use spectra_dither::{DistanceMetric, Palette, PaletteError, QuantizeMode};
use std::path::{Path, PathBuf};

/// Application configuration loaded from an optional YAML file.
///
/// Every section and field has a default, so an empty file (or no file)
/// yields a working configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub palette: PaletteConfig,
    pub quantize: QuantizeConfig,
    pub keepout: KeepOutConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

/// Panel palette as hex strings, in palette-code order.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PaletteConfig {
    /// Codes the panel controller expects
    pub official: Vec<String>,
    /// Measured appearance of the same entries (optional)
    pub actual: Option<Vec<String>>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            official: ["#000000", "#FFFFFF", "#FFFF00", "#FF0000", "#0000FF", "#00FF00"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            actual: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSetting {
    /// Reduced Atkinson error diffusion
    #[default]
    ErrorDiffusion,
    /// Floyd-Steinberg error diffusion
    FloydSteinberg,
    /// Independent nearest color per pixel
    Threshold,
}

impl From<ModeSetting> for QuantizeMode {
    fn from(m: ModeSetting) -> Self {
        match m {
            ModeSetting::ErrorDiffusion => QuantizeMode::ErrorDiffusion,
            ModeSetting::FloydSteinberg => QuantizeMode::FloydSteinberg,
            ModeSetting::Threshold => QuantizeMode::Threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
pub enum MetricSetting {
    /// Weighted RGB plus squared luma difference
    #[default]
    #[serde(rename = "luma")]
    #[value(name = "luma")]
    LumaWeighted,
    /// Squared CIE76 delta E in L*a*b*
    #[serde(rename = "cie76")]
    #[value(name = "cie76")]
    CieLab76,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct QuantizeConfig {
    pub mode: ModeSetting,
    pub metric: MetricSetting,
    /// Outer weight of the chroma term (luma metric only)
    pub chroma_weight: f32,
    /// Outer weight of the luma term (luma metric only)
    pub luma_weight: f32,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            mode: ModeSetting::default(),
            metric: MetricSetting::default(),
            chroma_weight: 1.5,
            luma_weight: 0.60,
        }
    }
}

impl QuantizeConfig {
    pub fn distance_metric(&self) -> DistanceMetric {
        match self.metric {
            MetricSetting::LumaWeighted => DistanceMetric::LumaWeighted {
                kc: self.chroma_weight,
                kl: self.luma_weight,
            },
            MetricSetting::CieLab76 => DistanceMetric::CieLab76,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KeepOutConfig {
    /// Generate `.map` files next to the converted images
    pub enabled: bool,
    pub method: MaskMethod,
    /// Pixels added around every detection
    pub margin: u32,
    /// Detections below this confidence are ignored
    pub min_confidence: f32,
}

impl Default for KeepOutConfig {
    fn default() -> Self {
        let options = MaskOptions::default();
        Self {
            enabled: false,
            method: options.method,
            margin: options.margin,
            min_confidence: options.min_confidence,
        }
    }
}

impl KeepOutConfig {
    pub fn mask_options(&self) -> MaskOptions {
        MaskOptions {
            method: self.method,
            margin: self.margin,
            min_confidence: self.min_confidence,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Images processed concurrently
    pub jobs: usize,
    /// Per-image time limit
    pub timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Re-compress output PNGs with oxipng
    pub optimize_png: bool,
    /// Output directory (default: next to each input)
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            optimize_png: true,
            directory: None,
        }
    }
}

impl AppConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load configuration from an optional file.
    ///
    /// No path or a missing file yields the defaults. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            colors = config.palette.official.len(),
            mode = ?config.quantize.mode,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Build the quantization palette described by this configuration
    pub fn build_palette(&self) -> Result<Palette, PaletteError> {
        let official: Vec<&str> = self.palette.official.iter().map(String::as_str).collect();
        let actual: Option<Vec<&str>> = self
            .palette
            .actual
            .as_ref()
            .map(|a| a.iter().map(String::as_str).collect());

        let palette = Palette::from_hex(&official, actual.as_deref())?;
        Ok(palette.with_distance_metric(self.quantize.distance_metric()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.palette.official.len(), 6);
        assert!(config.palette.actual.is_none());
        assert_eq!(config.quantize.mode, ModeSetting::ErrorDiffusion);
        assert_eq!(config.quantize.distance_metric(), DistanceMetric::SPECTRA);
        assert!(!config.keepout.enabled);
        assert_eq!(config.keepout.method, MaskMethod::Segmentation);
        assert_eq!(config.keepout.margin, 50);
        assert!((config.keepout.min_confidence - 0.3).abs() < f32::EPSILON);
        assert!(config.batch.jobs >= 1);
        assert!(config.output.optimize_png);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r##"
quantize:
  mode: floyd-steinberg
  metric: cie76
keepout:
  enabled: true
  method: boxes
  margin: 20
batch:
  jobs: 2
"##;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.quantize.mode, ModeSetting::FloydSteinberg);
        assert_eq!(config.quantize.distance_metric(), DistanceMetric::CieLab76);
        assert!(config.keepout.enabled);
        assert_eq!(config.keepout.method, MaskMethod::Boxes);
        assert_eq!(config.keepout.margin, 20);
        // Untouched fields keep their defaults
        assert!((config.keepout.min_confidence - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.batch.jobs, 2);
        assert_eq!(config.batch.timeout_secs, 300);
    }

    #[test]
    fn test_build_palette_with_measured_colors() {
        let yaml = r##"
palette:
  official: ["#000000", "#FFFFFF", "#FF0000"]
  actual: ["#0A0A0A", "#F5F5EB", "#BE3C37"]
quantize:
  metric: cie76
"##;
        let config = AppConfig::from_yaml(yaml).unwrap();
        let palette = config.build_palette().unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(palette.official(2).to_bytes(), [255, 0, 0]);
        assert_eq!(palette.actual(2).to_bytes(), [190, 60, 55]);
        assert_eq!(palette.distance_metric(), DistanceMetric::CieLab76);
    }

    #[test]
    fn test_build_palette_rejects_duplicates() {
        let mut config = AppConfig::default();
        config.palette.official = vec!["#000000".into(), "#000".into()];
        assert!(matches!(
            config.build_palette(),
            Err(PaletteError::DuplicateColor { index: 1 })
        ));
    }

    #[test]
    fn test_custom_luma_weights() {
        let config = AppConfig::from_yaml("quantize: {chroma_weight: 1.0, luma_weight: 2.0}").unwrap();
        assert_eq!(
            config.quantize.distance_metric(),
            DistanceMetric::LumaWeighted { kc: 1.0, kl: 2.0 }
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/inkmap.yaml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "keepout: {enabled: true, margin: 12}").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert!(config.keepout.enabled);
        assert_eq!(config.keepout.margin, 12);
    }

    #[test]
    fn test_load_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "quantize: [not, a, map]").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_negative_margin_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let yaml = r##"
palette:
  official: ["#000000", "#FFFFFF"]
keepout:
  enabled: true
  margin: -5
"##;
        std::fs::write(&path, yaml).unwrap();
        match AppConfig::load(Some(&path)) {
            Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file
        assert!(matches!(
            AppConfig::load(Some(dir.path())),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_mode_setting_converts() {
        assert_eq!(
            QuantizeMode::from(ModeSetting::Threshold),
            QuantizeMode::Threshold
        );
    }
}
