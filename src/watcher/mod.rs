//! Recursive file system watching.
//!
//! This module provides:
//! - Raw file event types shared by the pipeline
//! - Tree walking helpers for registration and scanning
//! - [`FileWatcher`]: per-directory watch registration with dynamic
//!   re-registration and subtree back-fill

mod events;
mod walk;
#[allow(clippy::module_inception)]
mod watcher;

pub use events::{EventKind, FileEvent};
pub use walk::{walk_dirs, walk_files};
pub use watcher::{FileWatcher, WatcherHandle};
