//! Multi-image conversion on tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::PipelineError;
use crate::services::{ConvertOutcome, Converter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Images converted at the same time (at least 1)
    pub jobs: usize,
    /// Per-image limit
    pub timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: PipelineError,
}

/// Results in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<ConvertOutcome>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Expand command-line inputs: files are taken as given, directories
/// contribute their `*.png` files (not recursive, sorted, skipping previous
/// `*_output.png` results).
pub fn collect_inputs(paths: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let candidate = entry?.path();
                if candidate.is_file() && is_source_png(&candidate) {
                    found.push(candidate);
                }
            }
            found.sort();
            tracing::debug!(dir = %path.display(), count = found.len(), "Collected images");
            inputs.extend(found);
        } else {
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}

fn is_source_png(path: &Path) -> bool {
    let is_png = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    let is_output = path
        .file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with("_output"));
    is_png && !is_output
}

/// Convert every input, at most `jobs` at a time.
///
/// A failing or timed-out image is logged and recorded; the rest of the
/// batch continues. A timed-out image leaves no output files behind.
pub async fn run_batch(
    converter: Arc<Converter>,
    inputs: Vec<PathBuf>,
    options: BatchOptions,
) -> BatchReport {
    let permits = Arc::new(Semaphore::new(options.jobs.max(1)));
    let mut handles = Vec::with_capacity(inputs.len());

    for input in inputs {
        let converter = converter.clone();
        let permits = permits.clone();
        let timeout = options.timeout;
        let task_input = input.clone();
        let handle = tokio::spawn(async move {
            match permits.acquire_owned().await {
                Ok(permit) => convert_one(converter, task_input, timeout, permit).await,
                Err(e) => Err(PipelineError::Worker(e.to_string())),
            }
        });
        handles.push((input, handle));
    }

    let mut report = BatchReport::default();
    for (input, handle) in handles {
        let result = handle
            .await
            .unwrap_or_else(|e| Err(PipelineError::Worker(format!("Conversion task failed: {e}"))));
        match result {
            Ok(outcome) => report.succeeded.push(outcome),
            Err(error) => {
                tracing::error!(input = %input.display(), %error, "Conversion failed");
                report.failed.push(BatchFailure { input, error });
            }
        }
    }

    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Batch finished"
    );
    report
}

/// Run one conversion on the blocking pool under `timeout`.
///
/// The permit moves into the blocking task, so it is released only when the
/// conversion has actually stopped. On timeout the conversion is cancelled
/// and awaited; anything it managed to write is removed.
async fn convert_one(
    converter: Arc<Converter>,
    input: PathBuf,
    timeout: Duration,
    permit: OwnedSemaphorePermit,
) -> Result<ConvertOutcome, PipelineError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let mut task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        converter.convert_with_cancel(&input, &flag)
    });

    match tokio::time::timeout(timeout, &mut task).await {
        Ok(joined) => joined.map_err(|e| PipelineError::Worker(format!("Convert task failed: {e}")))?,
        Err(_) => {
            cancel.store(true, Ordering::Release);
            if let Ok(Ok(outcome)) = task.await {
                // Finished between the last cancel check and now
                outcome.remove_outputs();
            }
            Err(PipelineError::Timeout {
                secs: timeout.as_secs(),
            })
        }
    }
}
