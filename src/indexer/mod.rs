//! Pipeline assembly: initial scan plus live index maintenance.
//!
//! The [`Indexer`] owns the whole pipeline. It walks the tree once to
//! seed the index, signals scan completion, then consumes the loader
//! stream indefinitely, dispatching each loaded event to the store.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::watch;

use crate::config::Config;
use crate::index::{FileIndex, IndexDb, TokenPosition};
use crate::loader::FileLoader;
use crate::tokenizer::{Tokenizer, WhitespaceTokenizer};
use crate::watcher::{walk_files, EventKind, WatcherHandle};
use crate::Result;

/// Live token index over a watched directory tree.
///
/// Queries may be issued from any thread at any time; during the
/// initial scan they observe a monotonically growing partial view.
pub struct Indexer {
    db: Arc<IndexDb>,
    scan_done: watch::Receiver<bool>,
    close_handle: WatcherHandle,
}

impl Indexer {
    /// Start the pipeline with the default whitespace tokenizer.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configured root is missing or
    /// not a directory, and `Error::Watcher` if watch registration
    /// fails.
    pub fn start(config: &Config) -> Result<Self> {
        Self::with_tokenizer(config, Arc::new(WhitespaceTokenizer))
    }

    /// Start the pipeline with a caller-supplied tokenizer.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Indexer::start`].
    pub fn with_tokenizer(config: &Config, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        config.validate()?;

        let loader = FileLoader::spawn(&config.root, config.delay_before_read)?;
        let close_handle = loader.watcher_handle();
        let db = Arc::new(IndexDb::new());
        let (scan_tx, scan_done) = watch::channel(false);

        let root = config.root.clone();
        let task_db = Arc::clone(&db);
        tokio::spawn(async move {
            let scan_root = root.clone();
            let scan_db = Arc::clone(&task_db);
            let scan_tokenizer = Arc::clone(&tokenizer);
            let scan = tokio::task::spawn_blocking(move || {
                initial_scan(&scan_root, &scan_db, scan_tokenizer.as_ref());
            })
            .await;
            if let Err(e) = scan {
                tracing::error!(error = %e, "Initial scan task failed");
            }

            // Completes exactly once, whether or not individual files
            // could be read.
            let _ = scan_tx.send(true);

            pump(loader, &task_db, tokenizer.as_ref()).await;
        });

        Ok(Self {
            db,
            scan_done,
            close_handle,
        })
    }

    /// Wait until the initial scan has finished. Completes
    /// immediately when called afterwards; any number of callers may
    /// wait.
    pub async fn wait_for_initial_scan(&self) {
        let mut rx = self.scan_done.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Return every current occurrence of `token`.
    #[must_use]
    pub fn query(&self, token: &str) -> Vec<TokenPosition> {
        self.db.query(token)
    }

    /// Shared handle to the underlying store.
    #[must_use]
    pub fn db(&self) -> Arc<IndexDb> {
        Arc::clone(&self.db)
    }

    /// Shut the pipeline down: loader and watcher stop, the pump task
    /// exits once the stream drains. Idempotent.
    pub fn close(&self) {
        self.close_handle.close();
    }
}

impl Drop for Indexer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Walk the tree once and seed the index from every readable UTF-8
/// regular file.
fn initial_scan(root: &Path, db: &IndexDb, tokenizer: &dyn Tokenizer) {
    tracing::info!(root = %root.display(), "Starting initial scan");
    let mut indexed = 0usize;
    let mut skipped = 0usize;

    for path in walk_files(root) {
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                skipped += 1;
                continue;
            }
        };
        let read_at = SystemTime::now();
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                tracing::debug!(path = %path.display(), "Skipping non-UTF-8 file");
                skipped += 1;
                continue;
            }
        };

        let index = FileIndex::from_token_map(&path, tokenizer.tokenize(&text), read_at);
        db.create_file_index(&path, index);
        indexed += 1;
    }

    tracing::info!(
        root = %root.display(),
        indexed,
        skipped,
        "Initial scan complete"
    );
}

/// Consume the loader stream, dispatching each event to the store.
async fn pump(mut loader: FileLoader, db: &IndexDb, tokenizer: &dyn Tokenizer) {
    while let Some(loaded) = loader.recv().await {
        match loaded.kind() {
            EventKind::Deleted => db.delete_file_index(loaded.path()),
            EventKind::Created | EventKind::Modified => {
                let (Some(text), Some(read_at)) = (loaded.text.as_deref(), loaded.read_at) else {
                    tracing::warn!(path = %loaded.path().display(), "Loaded event without text");
                    continue;
                };
                let index =
                    FileIndex::from_token_map(loaded.path(), tokenizer.tokenize(text), read_at);
                if loaded.kind() == EventKind::Created {
                    db.create_file_index(loaded.path(), index);
                } else {
                    db.modify_file_index(loaded.path(), index);
                }
            }
        }
    }
    tracing::debug!("Indexer pump exiting");
}
