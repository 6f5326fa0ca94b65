//! Tree walking helpers.
//!
//! Used for watch registration, subtree back-fill, and the initial
//! scan. Walk errors (permission, vanished entries) are logged and
//! the entry skipped; a mid-walk failure never aborts the walk.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// All directories under `root`, including `root` itself.
pub fn walk_dirs(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(log_walk_error)
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// All regular files under `root`.
pub fn walk_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(log_walk_error)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn log_walk_error(
    entry: Result<walkdir::DirEntry, walkdir::Error>,
) -> Option<walkdir::DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(error = %e, "Error walking directory");
            None
        }
    }
}
