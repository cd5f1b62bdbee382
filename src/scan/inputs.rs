use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use super::errors::{ScanError, ScanResult};

/// Expand glob patterns (including `**`) into a list of regular files.
///
/// Matches keep pattern order and the first occurrence of a path wins.
/// Entries that cannot be inspected while walking are dropped.
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> ScanResult<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = glob::glob(pattern).map_err(|source| ScanError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    if seen.insert(path.clone()) {
                        files.push(path);
                    }
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping unreadable glob match: {e}"),
            }
        }
    }

    debug!("Expanded {} patterns into {} files", patterns.len(), files.len());
    Ok(files)
}
