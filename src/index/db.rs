//! Concurrent per-file index store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::types::{FileIndex, TokenPosition};

/// Store mapping each indexed file to its [`FileIndex`].
///
/// Queries take the read lock and never block each other; writers
/// serialize on the write lock. A per-file entry is replaced
/// wholesale, so a query observes either the old or the new index for
/// a file, never a partial mixture.
#[derive(Debug, Default)]
pub struct IndexDb {
    files: RwLock<HashMap<PathBuf, FileIndex>>,
}

impl IndexDb {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the entry for `path` unconditionally.
    pub fn create_file_index(&self, path: &Path, index: FileIndex) {
        let mut files = self.files.write();
        files.insert(path.to_path_buf(), index);
    }

    /// Install `index` only if an entry for `path` is present and its
    /// revision is not newer than `index.revision`. An update carrying
    /// a strictly older revision is dropped.
    pub fn modify_file_index(&self, path: &Path, index: FileIndex) {
        let mut files = self.files.write();
        match files.get(path) {
            Some(existing) if existing.revision <= index.revision => {
                files.insert(path.to_path_buf(), index);
            }
            Some(existing) => {
                tracing::debug!(
                    path = %path.display(),
                    stored = ?existing.revision,
                    incoming = ?index.revision,
                    "Dropping index update with stale revision"
                );
            }
            None => {
                tracing::debug!(
                    path = %path.display(),
                    "Dropping modify for path with no index entry"
                );
            }
        }
    }

    /// Remove the entry for `path` if present.
    pub fn delete_file_index(&self, path: &Path) {
        let mut files = self.files.write();
        files.remove(path);
    }

    /// Return every occurrence of `needle` across all indexed files.
    ///
    /// Exact string match, no normalization. An empty needle returns
    /// an empty list by convention.
    #[must_use]
    pub fn query(&self, needle: &str) -> Vec<TokenPosition> {
        if needle.is_empty() {
            return Vec::new();
        }

        let files = self.files.read();
        let mut positions = Vec::new();
        for index in files.values() {
            if let Some(found) = index.tokens.get(needle) {
                positions.extend(found.iter().cloned());
            }
        }
        positions
    }

    /// Number of files currently indexed.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// Number of distinct (file, token) pairs currently indexed.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.files.read().values().map(|f| f.tokens.len()).sum()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}
