use spectra_dither::DitherError;
use std::path::PathBuf;
use thiserror::Error;

/// A keep-out map file violates the on-disk format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic: expected \"KOMAP\", found {found:?}")]
    BadMagic { found: String },

    #[error("unsupported map version {version} (supported: 1)")]
    UnsupportedVersion { version: u8 },

    #[error("truncated header: need 16 bytes, got {actual}")]
    TruncatedHeader { actual: usize },

    #[error("truncated bitmap: need {expected} bytes after the header, got {actual}")]
    TruncatedBitmap { expected: usize, actual: usize },

    #[error("invalid dimensions {width}x{height}: width and height must be at least 1")]
    ZeroDimension { width: u16, height: u16 },
}

#[derive(Debug, Error)]
pub enum KeepOutError {
    #[error("Map format error: {0}")]
    Format(#[from] FormatError),

    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("PNG decode error: {0}")]
    PngDecode(String),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Unsupported color type: {0}")]
    UnsupportedColor(String),

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    Dimension {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },
}

/// Failure of one image in the conversion pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Quantization error: {0}")]
    Quantize(#[from] DitherError),

    #[error("Keep-out error: {0}")]
    KeepOut(#[from] KeepOutError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("Cancelled")]
    Cancelled,
}

/// A configuration file that was asked for could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl From<FormatError> for PipelineError {
    fn from(e: FormatError) -> Self {
        PipelineError::KeepOut(KeepOutError::Format(e))
    }
}
