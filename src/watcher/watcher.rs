//! Recursive directory watcher.
//!
//! The OS watch backend only watches individual directories, so the
//! watcher registers every directory under the root separately and
//! keeps that registration current: when a subdirectory appears or
//! disappears, the whole tree is re-registered, and a freshly created
//! subtree is back-filled with synthetic Created events for the
//! regular files already inside it.
//!
//! Directory events are consumed internally; the output stream
//! carries events for regular files only.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread;

use notify::event::{ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;

use super::events::FileEvent;
use super::walk::{walk_dirs, walk_files};
use crate::config::validate_root;
use crate::error::WatcherError;
use crate::Result;

/// Capacity of the file event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Poll interval requested from the backend. Only poll-based
/// platforms honor it; inotify-style backends push immediately.
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

/// Messages consumed by the worker thread.
enum WorkerMsg {
    Event(notify::Event),
    BackendError(notify::Error),
    Shutdown,
}

/// Handle for shutting the watcher down from another owner.
#[derive(Clone)]
pub struct WatcherHandle {
    tx: std_mpsc::Sender<WorkerMsg>,
}

impl WatcherHandle {
    /// Ask the worker to stop. The output stream ends shortly after.
    pub fn close(&self) {
        let _ = self.tx.send(WorkerMsg::Shutdown);
    }
}

/// Recursive watcher over a root directory.
///
/// Emits a [`FileEvent`] for every create/modify/delete of a regular
/// file under the root, for the lifetime of the watcher.
pub struct FileWatcher {
    events: mpsc::Receiver<FileEvent>,
    handle: WatcherHandle,
    _worker: thread::JoinHandle<()>,
}

impl FileWatcher {
    /// Start watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `root` does not exist or is not a
    /// directory, and `Error::Watcher` if the backend cannot be
    /// created or the initial registration fails.
    pub fn spawn(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        validate_root(&root)?;

        let (worker_tx, worker_rx) = std_mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let backend_tx = worker_tx.clone();
        let mut backend = RecommendedWatcher::new(
            move |result: std::result::Result<notify::Event, notify::Error>| {
                let msg = match result {
                    Ok(event) => WorkerMsg::Event(event),
                    Err(e) => WorkerMsg::BackendError(e),
                };
                let _ = backend_tx.send(msg);
            },
            notify::Config::default().with_poll_interval(POLL_INTERVAL),
        )
        .map_err(|e| WatcherError::watch_failed(&root, e.to_string()))?;

        let mut watched_dirs = HashSet::new();
        for dir in walk_dirs(&root) {
            backend
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|e| WatcherError::watch_failed(&dir, e.to_string()))?;
            watched_dirs.insert(dir);
        }
        tracing::info!(
            root = %root.display(),
            dirs = watched_dirs.len(),
            "Watching directory tree"
        );

        let worker = thread::Builder::new()
            .name("lexwatch-watcher".to_string())
            .spawn(move || {
                Worker {
                    backend,
                    root,
                    watched_dirs,
                    needs_reregister: false,
                    events_tx,
                }
                .run(&worker_rx);
            })
            .map_err(crate::Error::Io)?;

        Ok(Self {
            events: events_rx,
            handle: WatcherHandle { tx: worker_tx },
            _worker: worker,
        })
    }

    /// Receive the next file event.
    ///
    /// Returns `None` once the watcher has been closed or the backend
    /// has terminated.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.events.recv().await
    }

    /// Stop the watcher. Idempotent.
    pub fn close(&self) {
        self.handle.close();
    }

    /// A cloneable handle that can close this watcher after the
    /// watcher itself has been moved into a consumer task.
    #[must_use]
    pub fn handle(&self) -> WatcherHandle {
        self.handle.clone()
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

/// State owned by the worker thread.
struct Worker {
    backend: RecommendedWatcher,
    root: PathBuf,
    watched_dirs: HashSet<PathBuf>,
    needs_reregister: bool,
    events_tx: mpsc::Sender<FileEvent>,
}

impl Worker {
    fn run(mut self, rx: &std_mpsc::Receiver<WorkerMsg>) {
        'outer: while let Ok(first) = rx.recv() {
            // Drain whatever else already arrived so re-registration
            // happens once per batch, not once per event.
            let mut batch = vec![first];
            while let Ok(msg) = rx.try_recv() {
                batch.push(msg);
            }

            for msg in batch {
                match msg {
                    WorkerMsg::Shutdown => break 'outer,
                    WorkerMsg::BackendError(e) => {
                        tracing::error!(error = %e, "Watch backend failed, closing stream");
                        break 'outer;
                    }
                    WorkerMsg::Event(event) => {
                        if !self.handle_event(&event) {
                            break 'outer;
                        }
                    }
                }
            }

            if self.needs_reregister {
                self.reregister();
                self.needs_reregister = false;
            }
        }

        tracing::debug!(root = %self.root.display(), "Watcher worker exiting");
        // Dropping the backend releases every watch registration.
    }

    /// Process one raw backend event. Returns false when the output
    /// channel is closed and the worker should exit.
    fn handle_event(&mut self, event: &notify::Event) -> bool {
        use notify::EventKind as Raw;

        // Renames surface as paired Name events; the pipeline models
        // them as delete-then-create.
        if let Raw::Modify(ModifyKind::Name(mode)) = event.kind {
            return self.handle_rename(mode, &event.paths);
        }

        for path in &event.paths {
            let forwarded = match event.kind {
                Raw::Create(_) => self.on_created_or_modified(path, true),
                Raw::Modify(_) => self.on_created_or_modified(path, false),
                Raw::Remove(_) => self.on_deleted(path),
                _ => true,
            };
            if !forwarded {
                return false;
            }
        }
        true
    }

    fn handle_rename(&mut self, mode: RenameMode, paths: &[PathBuf]) -> bool {
        match mode {
            RenameMode::From => paths.iter().all(|p| self.on_deleted(p)),
            RenameMode::To => paths.iter().all(|p| self.on_created_or_modified(p, true)),
            RenameMode::Both if paths.len() >= 2 => {
                self.on_deleted(&paths[0]) && self.on_created_or_modified(&paths[1], true)
            }
            // Ambiguous rename: classify each path by what is on disk.
            _ => paths.iter().all(|p| {
                if p.exists() {
                    self.on_created_or_modified(p, true)
                } else {
                    self.on_deleted(p)
                }
            }),
        }
    }

    /// Handle a create/modify for `path`, probing the filesystem to
    /// classify directory vs regular file.
    fn on_created_or_modified(&mut self, path: &Path, created: bool) -> bool {
        let metadata = match std::fs::metadata(path) {
            Ok(md) => md,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Created and deleted faster than we could stat it.
                tracing::debug!(path = %path.display(), "Event target vanished before stat");
                return true;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to stat event target");
                return true;
            }
        };

        if metadata.is_dir() {
            if created {
                self.on_dir_created(path);
            }
            return true;
        }
        if !metadata.is_file() {
            return true;
        }

        let mtime = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "No mtime for event target");
                return true;
            }
        };

        let event = if created {
            FileEvent::created(path, mtime)
        } else {
            FileEvent::modified(path, mtime)
        };
        self.forward(event)
    }

    fn on_deleted(&mut self, path: &Path) -> bool {
        // The target is gone from disk; it was a directory iff we had
        // a watch registered for it.
        if self.watched_dirs.contains(path) {
            tracing::debug!(path = %path.display(), "Watched directory removed");
            self.needs_reregister = true;
            return true;
        }
        self.forward(FileEvent::deleted(path))
    }

    /// A new directory appeared: back-fill Created events for every
    /// regular file already inside it, then re-register the tree so
    /// the new directories get their own watches.
    fn on_dir_created(&mut self, dir: &Path) {
        self.needs_reregister = true;

        for file in walk_files(dir) {
            let mtime = match std::fs::metadata(&file).and_then(|md| md.modified()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!(path = %file.display(), error = %e, "Skipping back-fill entry");
                    continue;
                }
            };
            tracing::debug!(path = %file.display(), "Back-filling created file");
            if !self.forward(FileEvent::created(&file, mtime)) {
                return;
            }
        }
    }

    fn forward(&self, event: FileEvent) -> bool {
        if self.events_tx.blocking_send(event).is_err() {
            tracing::debug!("Event channel closed, stopping watcher worker");
            return false;
        }
        true
    }

    /// Tear down every registration and rebuild it from a fresh walk.
    fn reregister(&mut self) {
        for dir in self.watched_dirs.drain() {
            if let Err(e) = self.backend.unwatch(&dir) {
                tracing::debug!(path = %dir.display(), error = %e, "Unwatch failed during re-registration");
            }
        }

        for dir in walk_dirs(&self.root) {
            match self.backend.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    self.watched_dirs.insert(dir);
                }
                Err(e) => {
                    // The directory may have vanished between the walk
                    // and the registration.
                    tracing::debug!(path = %dir.display(), error = %e, "Watch failed during re-registration");
                }
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            dirs = self.watched_dirs.len(),
            "Re-registered directory tree"
        );
    }
}
