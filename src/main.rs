//! lexwatch: watch a directory tree and keep a queryable token index
//! of its files.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lexwatch::observability::init_tracing;
use lexwatch::{Config, Indexer, Result};

/// Poll cadence of the demo loop.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Watch a directory tree and keep a live token index of its files.
#[derive(Parser, Debug)]
#[command(name = "lexwatch")]
#[command(version)]
#[command(about = "Live token index over a watched directory tree")]
struct Cli {
    /// Directory to watch.
    #[arg(value_name = "DIR")]
    root: PathBuf,

    /// Token to poll; its current hit count is printed when it
    /// changes.
    #[arg(short, long)]
    query: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LEXWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output.
    #[arg(long, env = "LEXWATCH_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => {
            // --help / --version
            let _ = e.print();
            std::process::exit(0);
        }
    };

    init_tracing(&cli.log_level, cli.log_json);

    let mut config = Config::new(&cli.root);
    config.log_level = cli.log_level.clone();
    config.log_json = cli.log_json;

    let indexer = Indexer::start(&config)?;
    indexer.wait_for_initial_scan().await;

    let db = indexer.db();
    tracing::info!(
        root = %cli.root.display(),
        files = db.file_count(),
        "Initial scan complete, watching for changes"
    );

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut last: Option<(usize, usize, Option<usize>)> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let files = db.file_count();
                let tokens = db.token_count();
                let hits = cli.query.as_deref().map(|q| db.query(q).len());

                let current = (files, tokens, hits);
                if last.as_ref() != Some(&current) {
                    match (&cli.query, hits) {
                        (Some(q), Some(n)) => {
                            println!("{files} files, {tokens} tokens indexed; '{q}': {n} hits");
                        }
                        _ => println!("{files} files, {tokens} tokens indexed"),
                    }
                    last = Some(current);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    indexer.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_minimal() {
        let cli = Cli::try_parse_from(["lexwatch", "/some/dir"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("/some/dir"));
        assert!(cli.query.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.log_json);
    }

    #[test]
    fn test_cli_parsing_with_query() {
        let cli = Cli::try_parse_from(["lexwatch", "/some/dir", "--query", "needle"]).unwrap();
        assert_eq!(cli.query.as_deref(), Some("needle"));
    }

    #[test]
    fn test_cli_requires_directory_argument() {
        assert!(Cli::try_parse_from(["lexwatch"]).is_err());
    }

    #[test]
    fn test_cli_rejects_extra_positionals() {
        assert!(Cli::try_parse_from(["lexwatch", "/a", "/b"]).is_err());
    }

    #[test]
    fn test_cli_log_options() {
        let cli = Cli::try_parse_from(["lexwatch", "/d", "--log-level", "debug", "--log-json"])
            .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(cli.log_json);
    }
}
