//! Configuration management for lexwatch.
//!
//! Settings come from command-line arguments (wired up in main.rs)
//! with environment-variable fallbacks.

mod settings;

pub use settings::{validate_root, Config};
