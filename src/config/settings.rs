//! Configuration settings and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Default coalescing window and pre-read settle delay.
const DEFAULT_DELAY_BEFORE_READ: Duration = Duration::from_millis(200);

/// Main configuration for the indexing pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory to watch. Must exist and be a directory.
    pub root: PathBuf,

    /// How long the event stream must stay quiet before a batch of
    /// raw events is coalesced and read. Also the settle delay that
    /// makes the race-free read check meaningful.
    pub delay_before_read: Duration,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON logging output.
    pub log_json: bool,
}

impl Config {
    /// Create a configuration for the given root with defaults.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            delay_before_read: DEFAULT_DELAY_BEFORE_READ,
            log_level: "info".to_string(),
            log_json: false,
        }
    }

    /// Set the coalescing window.
    #[must_use]
    pub fn with_delay_before_read(mut self, delay: Duration) -> Self {
        self.delay_before_read = delay;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the root is missing or not a
    /// directory, or if any setting is out of range.
    pub fn validate(&self) -> Result<()> {
        validate_root(&self.root)?;

        if self.delay_before_read.is_zero() {
            return Err(Error::config("delay_before_read cannot be zero"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}

/// Check that a root path exists and is a directory.
///
/// # Errors
///
/// Returns `Error::Config` otherwise.
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(Error::config(format!(
            "root '{}' does not exist",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(Error::config(format!(
            "root '{}' is not a directory",
            root.display()
        )));
    }
    Ok(())
}
