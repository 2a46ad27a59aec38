use std::path::Path;

/// Trait for reporting batch progress.
///
/// The CLI implements it with an indicatif bar. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_batch_start(&self, _label: &str, _root: &Path, _total_files: usize) {}
    fn on_file_processed(&self, _processed: usize, _total_files: usize, _path: &Path) {}
    fn on_batch_complete(&self, _label: &str, _files_processed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
