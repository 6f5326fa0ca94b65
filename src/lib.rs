//! lexwatch: a live in-memory token index over a watched directory
//! tree.
//!
//! # Architecture
//!
//! Data flows upward through four stages:
//!
//! ```text
//! filesystem -> watcher -> loader -> indexer -> IndexDb <- queries
//! ```
//!
//! - [`watcher`]: recursive directory watching with dynamic
//!   re-registration and subtree back-fill
//! - [`loader`]: event coalescing and race-free file reads
//! - [`index`]: the concurrently queryable per-file inverted index
//! - [`indexer`]: initial scan and pipeline glue
//! - [`tokenizer`]: the pluggable text-to-tokens contract
//! - [`config`], [`error`], [`observability`]: settings, error
//!   hierarchy, logging setup
//!
//! # Example
//!
//! ```rust,ignore
//! use lexwatch::{Config, Indexer};
//!
//! #[tokio::main]
//! async fn main() -> lexwatch::Result<()> {
//!     let indexer = Indexer::start(&Config::new("/some/dir"))?;
//!     indexer.wait_for_initial_scan().await;
//!     for hit in indexer.query("needle") {
//!         println!("{}:{}..{}", hit.path.display(), hit.start, hit.end);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod loader;
pub mod observability;
pub mod tokenizer;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
pub use index::{FileIndex, IndexDb, TokenPosition};
pub use indexer::Indexer;
