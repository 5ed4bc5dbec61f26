pub mod config;
pub mod detection;

pub use config::{
    AppConfig, BatchConfig, KeepOutConfig, MetricSetting, ModeSetting, OutputConfig,
    PaletteConfig, QuantizeConfig,
};
pub use detection::{Detection, DetectionFile, DetectorOutput, SoftMask};
