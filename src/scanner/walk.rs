use crate::error::Error;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use walkdir::WalkDir;

/// Recursively collect absolute paths of regular files under `root` whose file name
/// matches `file_pattern` (e.g. `*.json`). Entries are visited depth-first in file name
/// order so repeated runs see the same sequence. A missing root yields no files.
/// Wildcards do not match a leading dot, so `*.json` skips `._x.json` and similar.
pub fn find_files(root: &Path, file_pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let pattern = Pattern::new(file_pattern)?;
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    if !root.is_dir() {
        debug!("{} is not a directory, nothing to scan", root.display());
        return Ok(Vec::new());
    }
    let root = fs::canonicalize(root)?;

    let mut files = Vec::new();
    for entry_result in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                if err.io_error().map(|e| e.kind()) == Some(io::ErrorKind::PermissionDenied) {
                    error!("Access denied reading {}: {}", path, err);
                    continue;
                }
                return Err(Error::Io(io::Error::new(
                    err.io_error()
                        .map(|e| e.kind())
                        .unwrap_or(io::ErrorKind::Other),
                    format!("Error walking {}: {}", path, err),
                )));
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.matches_with(name, options));
        if matches {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
