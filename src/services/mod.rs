pub mod batch;
pub mod detector;
pub mod pipeline;

pub use batch::{collect_inputs, run_batch, BatchFailure, BatchOptions, BatchReport};
pub use detector::{Detector, SidecarDetector};
pub use pipeline::{ConvertOutcome, Converter, MapOutcome};
