//! Error types and Result aliases for lexwatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public constructors return `Result<T, Error>` or `Result<T>`.
//!
//! Only configuration errors are fatal. Everything the pipeline hits
//! at runtime (vanished files, encoding failures, stale reads) is
//! logged at component level and the affected event is dropped; the
//! event streams carry only successful observations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using lexwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lexwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error. The only fatal class: surfaced from
    /// constructors when the root path is missing or not a directory.
    #[error("configuration error: {0}")]
    Config(String),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// File loading error.
    #[error("loader error: {0}")]
    Loader(#[from] LoaderError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to register a directory with the watch backend.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The watch backend terminated. The watcher closes its output
    /// stream; downstream stages see end-of-stream, not an error.
    #[error("watch service closed")]
    ServiceClosed,
}

/// File loader errors. These never propagate past the loader; they
/// exist to classify what gets logged before an event is dropped.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// File contents are not valid UTF-8.
    #[error("file '{}' is not valid UTF-8", path.display())]
    Encoding { path: PathBuf },

    /// File vanished between the notification and the read.
    #[error("file '{}' vanished before it could be read", path.display())]
    Vanished { path: PathBuf },

    /// The file's mtime advanced during the read; the contents may be
    /// torn, so the read is discarded. A follow-up event repairs it.
    #[error("file '{}' changed while being read", path.display())]
    StaleRead { path: PathBuf },

    /// Any other read or stat failure.
    #[error("failed to read '{}': {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl WatcherError {
    /// Create a watch-failed error for a path.
    pub fn watch_failed(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::WatchFailed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests;
