pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod model;
pub mod progress;
pub mod scanner;
pub mod storage;

pub use config::AppConfig;
pub use engine::{BatchResult, CommitPolicy, EtlEngine, EtlResult};
pub use error::{Error, ErrorKind};
pub use gateway::{Gateway, SongLookup};
pub use progress::{ProgressReporter, SilentReporter};
