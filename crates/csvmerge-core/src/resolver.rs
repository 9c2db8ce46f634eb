//! Input path resolution for discovering delimited files

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension recognized when scanning a directory
const CSV_EXTENSION: &str = "csv";

/// Expand a mixed list of file and directory paths into a flat file list.
///
/// Order is preserved: each input path contributes its files in place, and
/// directories are scanned non-recursively in file-name order so the result
/// is deterministic for a given filesystem state. The list is not
/// deduplicated.
pub fn resolve_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();

        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry_path.is_file()
                && entry_path.extension().is_some_and(|ext| ext == CSV_EXTENSION)
            {
                files.push(entry_path.to_path_buf());
            }
        }
    }

    if files.is_empty() {
        return Err(Error::NoInputFiles);
    }

    Ok(files)
}
