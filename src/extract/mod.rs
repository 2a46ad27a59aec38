pub mod events;
pub mod song;

use crate::error::Error;
use crate::gateway::Gateway;
use crate::model::RowCounts;
use std::path::Path;

/// Turns one input file into star-schema rows written through a [`Gateway`].
pub trait Extractor {
    /// Short label used in progress output.
    fn name(&self) -> &'static str;

    fn extract(&self, gateway: &mut dyn Gateway, path: &Path) -> Result<RowCounts, Error>;
}

/// Loads song metadata files into the songs and artists dimensions.
pub struct SongExtractor;

impl Extractor for SongExtractor {
    fn name(&self) -> &'static str {
        "song"
    }

    fn extract(&self, gateway: &mut dyn Gateway, path: &Path) -> Result<RowCounts, Error> {
        song::process_song_file(gateway, path)
    }
}

/// Loads activity logs into the time and users dimensions and the songplays fact table.
pub struct LogExtractor;

impl Extractor for LogExtractor {
    fn name(&self) -> &'static str {
        "log"
    }

    fn extract(&self, gateway: &mut dyn Gateway, path: &Path) -> Result<RowCounts, Error> {
        events::process_log_file(gateway, path)
    }
}

/// Numbered lines of a JSON-lines file, left as bytes so that malformed encoding
/// surfaces as a JSON parse error on the offending line.
fn lines(contents: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    contents
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .enumerate()
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}
