use indicatif::{ProgressBar, ProgressStyle};
use sparkify_etl::ProgressReporter;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Progress bar per batch: "song [━━━╸──] 12/71 files".
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_batch_start(&self, label: &str, _root: &Path, total_files: usize) {
        let pb = ProgressBar::new(total_files as u64);
        let style = ProgressStyle::with_template(
            "  {spinner:.cyan} {prefix} [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.set_prefix(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_file_processed(&self, processed: usize, _total_files: usize, _path: &Path) {
        let guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.as_ref() {
            pb.set_position(processed as u64);
        }
    }

    fn on_batch_complete(&self, label: &str, files_processed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m {} files complete: {} files in {:.2}s",
            label, files_processed, duration_secs
        );
    }
}
