use crate::config::AppConfig;
use crate::error::Error;
use crate::extract::{Extractor, LogExtractor, SongExtractor};
use crate::gateway::Gateway;
use crate::model::RowCounts;
use crate::progress::ProgressReporter;
use crate::scanner;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Where the batch driver places transaction boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// Each file is its own transaction.
    #[default]
    PerFile,
    /// All files under one root share a single transaction.
    PerBatch,
}

#[derive(Debug, Default, Clone)]
pub struct BatchResult {
    pub files_found: usize,
    pub files_processed: usize,
    pub commits: usize,
    pub rows: RowCounts,
    pub duration: Duration,
}

#[derive(Debug, Default, Clone)]
pub struct EtlResult {
    pub songs: BatchResult,
    pub logs: BatchResult,
}

pub struct EtlEngine {
    config: AppConfig,
}

impl EtlEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Load every song file, then every log file. Songs go first so plays can be
    /// resolved against the dimensions they populate.
    pub fn run(
        &self,
        gateway: &mut dyn Gateway,
        reporter: &dyn ProgressReporter,
    ) -> Result<EtlResult, Error> {
        let songs = self.process_songs(gateway, reporter)?;
        let logs = self.process_logs(gateway, reporter)?;
        Ok(EtlResult { songs, logs })
    }

    pub fn process_songs(
        &self,
        gateway: &mut dyn Gateway,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchResult, Error> {
        info!("Processing song data...");
        process_data(
            gateway,
            Path::new(&self.config.song_data),
            &self.config.file_pattern,
            &SongExtractor,
            self.config.commit_policy,
            reporter,
        )
    }

    pub fn process_logs(
        &self,
        gateway: &mut dyn Gateway,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchResult, Error> {
        info!("Processing log data...");
        process_data(
            gateway,
            Path::new(&self.config.log_data),
            &self.config.file_pattern,
            &LogExtractor,
            self.config.commit_policy,
            reporter,
        )
    }
}

/// Discover the files under `root` and run `extractor` over each of them in order,
/// committing as `policy` dictates. The first failure rolls back the open transaction
/// and is returned; files committed before it stay committed.
pub fn process_data(
    gateway: &mut dyn Gateway,
    root: &Path,
    file_pattern: &str,
    extractor: &dyn Extractor,
    policy: CommitPolicy,
    reporter: &dyn ProgressReporter,
) -> Result<BatchResult, Error> {
    let start = Instant::now();

    let files = scanner::find_files(root, file_pattern)?;
    let total_files = files.len();
    info!("{} files found in {}", total_files, root.display());
    reporter.on_batch_start(extractor.name(), root, total_files);

    let mut result = BatchResult {
        files_found: total_files,
        ..BatchResult::default()
    };

    if !files.is_empty() {
        if policy == CommitPolicy::PerBatch {
            gateway.begin()?;
        }

        for (index, path) in files.iter().enumerate() {
            if policy == CommitPolicy::PerFile {
                gateway.begin()?;
            }

            match extractor.extract(gateway, path) {
                Ok(rows) => result.rows += rows,
                Err(err) => {
                    error!(
                        "Failed to load {} file {}: {}",
                        extractor.name(),
                        path.display(),
                        err
                    );
                    if let Err(rollback_err) = gateway.rollback() {
                        error!("Rollback failed: {}", rollback_err);
                    }
                    return Err(err);
                }
            }

            if policy == CommitPolicy::PerFile {
                gateway.commit()?;
                result.commits += 1;
            }

            result.files_processed = index + 1;
            info!("{}/{} files processed.", result.files_processed, total_files);
            reporter.on_file_processed(result.files_processed, total_files, path);
        }

        if policy == CommitPolicy::PerBatch {
            gateway.commit()?;
            result.commits += 1;
        }
    }

    result.duration = start.elapsed();
    reporter.on_batch_complete(
        extractor.name(),
        result.files_processed,
        result.duration.as_secs_f64(),
    );
    debug!(
        "{} batch completed in {:.2}s: {} rows from {} files",
        extractor.name(),
        result.duration.as_secs_f64(),
        result.rows.total(),
        result.files_processed,
    );

    Ok(result)
}
