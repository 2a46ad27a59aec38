use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Parse error in {} line {line}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No records found in {}", .path.display())]
    EmptyFile { path: PathBuf },

    #[error("Timestamp {ts} out of range in {} line {line}", .path.display())]
    Timestamp { path: PathBuf, line: usize, ts: i64 },
}

/// Coarse classification of [`Error`] for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Connectivity,
    Io,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse { .. } | Error::EmptyFile { .. } | Error::Timestamp { .. } => {
                ErrorKind::Parse
            }
            Error::Database(_) | Error::Connection(_) | Error::Migration(_) => {
                ErrorKind::Connectivity
            }
            Error::Io(_) => ErrorKind::Io,
            Error::Config(_) | Error::Pattern(_) => ErrorKind::Config,
        }
    }
}
