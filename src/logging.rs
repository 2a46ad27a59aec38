use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,sparkify_etl=info";
const DEFAULT_LOG_FILE: &str = "./logs/sparkify-etl.log";

/// Build the filter from `TRACING_LEVEL`. A bare level such as `debug` applies to this
/// crate only; anything with a `=` is taken as a full directive list.
fn filter_directives(tracing_level: Option<&str>) -> String {
    match tracing_level.map(str::trim) {
        None | Some("") => DEFAULT_FILTER.to_string(),
        Some(directives) if directives.contains('=') => directives.to_string(),
        Some(level) => format!("warn,sparkify_etl={}", level),
    }
}

/// Split a log file path into the directory the appender writes to and the file name.
fn log_file_location(log_file_path: &str) -> (PathBuf, PathBuf) {
    let path = Path::new(log_file_path);
    let file_name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sparkify-etl.log"));
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (directory, file_name)
}

pub fn init_logger() -> impl Drop {
    let directives = filter_directives(env::var("TRACING_LEVEL").ok().as_deref());
    let filter_layer = EnvFilter::new(&directives);

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (log_dir, log_file) = log_file_location(&log_file_path);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .without_time()
                .compact()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    info!("Logging to {}", log_dir.join(&log_file).display());
    debug!("Log filter: {}", directives);

    guard
}
