//! Per-file index data types.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::tokenizer::TokenMap;

/// One occurrence of a token: the file it lives in and the half-open
/// byte range `[start, end)` within that file's contents at the
/// revision the index currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPosition {
    /// Absolute path of the file containing the occurrence.
    pub path: PathBuf,
    /// Byte offset of the first byte of the token.
    pub start: usize,
    /// Byte offset one past the last byte of the token.
    pub end: usize,
}

impl TokenPosition {
    /// Create a position for a token occurrence.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, start: usize, end: usize) -> Self {
        Self {
            path: path.into(),
            start,
            end,
        }
    }
}

/// The complete index for one file at one revision.
///
/// Built from tokenizer output; never mutated in place. Replacement
/// in the store is wholesale, so readers observe either the old or
/// the new entry.
#[derive(Debug, Clone)]
pub struct FileIndex {
    /// Token string to its occurrences, in textual order.
    pub tokens: std::collections::HashMap<String, Vec<TokenPosition>>,
    /// The instant the file contents were read. Orders replacements;
    /// this is the read time, not the filesystem mtime.
    pub revision: SystemTime,
}

impl FileIndex {
    /// Build a file index from tokenizer output, attaching `path` to
    /// every occurrence.
    #[must_use]
    pub fn from_token_map(path: &Path, map: TokenMap, revision: SystemTime) -> Self {
        let tokens = map
            .into_iter()
            .map(|(token, ranges)| {
                let positions = ranges
                    .into_iter()
                    .map(|r| TokenPosition::new(path, r.start, r.end))
                    .collect();
                (token, positions)
            })
            .collect();

        Self { tokens, revision }
    }
}
