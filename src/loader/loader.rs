//! Debounced, race-checked file loading.
//!
//! Filesystem mtime resolution can be coarser than write cadence, so
//! mtime alone cannot prove a read did not overlap a write. The
//! loader waits out a quiet window, reads the file, then re-stats it:
//! only when the mtime is unchanged from the triggering event is the
//! read accepted. A newer mtime means another event is on its way and
//! will trigger a fresh read, so the possibly-torn contents are
//! simply discarded.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::queue::EventQueue;
use crate::error::LoaderError;
use crate::watcher::{EventKind, FileEvent, FileWatcher, WatcherHandle};
use crate::Result;

/// Capacity of the loaded event channel.
const LOADED_CHANNEL_CAPACITY: usize = 256;

/// A file event with its loaded contents.
///
/// `text` and `read_at` are present exactly when the kind is Created
/// or Modified; a Deleted event carries neither.
#[derive(Debug, Clone)]
pub struct LoadedFileEvent {
    /// The underlying (coalesced) file event.
    pub event: FileEvent,
    /// Full UTF-8 contents read from the file.
    pub text: Option<String>,
    /// Wall-clock instant at which the read completed. Becomes the
    /// index revision downstream.
    pub read_at: Option<SystemTime>,
}

impl LoadedFileEvent {
    /// Kind of the underlying event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event.kind
    }

    /// Path of the underlying event.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.event.path
    }
}

/// Loader stage: owns a [`FileWatcher`] and turns its raw events into
/// [`LoadedFileEvent`]s whose text is guaranteed not to interleave
/// concurrent writes.
pub struct FileLoader {
    loaded: mpsc::Receiver<LoadedFileEvent>,
    watcher_handle: WatcherHandle,
}

impl FileLoader {
    /// Start watching and loading under `root`.
    ///
    /// `delay_before_read` is both the coalescing window and the
    /// settle delay before each read pass.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `root` is missing or not a
    /// directory, and `Error::Watcher` if watch registration fails.
    pub fn spawn(root: impl AsRef<Path>, delay_before_read: Duration) -> Result<Self> {
        let watcher = FileWatcher::spawn(root)?;
        let watcher_handle = watcher.handle();
        let (tx, rx) = mpsc::channel(LOADED_CHANNEL_CAPACITY);

        tokio::spawn(dispatch(watcher, tx, delay_before_read));

        Ok(Self {
            loaded: rx,
            watcher_handle,
        })
    }

    /// Receive the next loaded event.
    ///
    /// Returns `None` once the loader has been closed or the watcher
    /// stream has ended.
    pub async fn recv(&mut self) -> Option<LoadedFileEvent> {
        self.loaded.recv().await
    }

    /// Stop the loader; cascades to the inner watcher. Idempotent.
    pub fn close(&self) {
        self.watcher_handle.close();
    }

    /// Handle that closes the pipeline from an outer owner.
    #[must_use]
    pub fn watcher_handle(&self) -> WatcherHandle {
        self.watcher_handle.clone()
    }
}

impl Drop for FileLoader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Dispatcher loop: accumulate events while they keep arriving,
/// process the coalesced batch once the stream has been quiet for the
/// whole window.
async fn dispatch(
    mut watcher: FileWatcher,
    tx: mpsc::Sender<LoadedFileEvent>,
    delay_before_read: Duration,
) {
    let mut queue = EventQueue::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let quiet = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            maybe = watcher.recv() => match maybe {
                Some(event) => {
                    queue.push(event);
                    deadline = Some(Instant::now() + delay_before_read);
                }
                None => break,
            },
            () = quiet => {
                deadline = None;
                for event in queue.drain() {
                    if !process(&tx, event).await {
                        return;
                    }
                }
            }
        }
    }

    // Upstream closed: flush what is pending, then end the stream.
    for event in queue.drain() {
        if !process(&tx, event).await {
            return;
        }
    }
    tracing::debug!("Loader dispatcher exiting");
}

/// Load (or pass through) one event and forward the result. Returns
/// false when the output channel is closed.
async fn process(tx: &mpsc::Sender<LoadedFileEvent>, event: FileEvent) -> bool {
    let loaded = match event.kind {
        EventKind::Deleted => Some(LoadedFileEvent {
            event,
            text: None,
            read_at: None,
        }),
        EventKind::Created | EventKind::Modified => match load(event).await {
            Ok(loaded) => Some(loaded),
            Err(LoaderError::Vanished { path }) => {
                tracing::debug!(path = %path.display(), "File vanished before read");
                None
            }
            Err(LoaderError::StaleRead { path }) => {
                tracing::debug!(path = %path.display(), "Read overlapped a write, awaiting retrigger");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unreadable file event");
                None
            }
        },
    };

    match loaded {
        Some(loaded) => tx.send(loaded).await.is_ok(),
        None => true,
    }
}

/// The race-free read protocol: read, note the completion instant,
/// re-stat, and accept only if the mtime matches the event's.
async fn load(event: FileEvent) -> std::result::Result<LoadedFileEvent, LoaderError> {
    let path = event.path.clone();
    let Some(expected_mtime) = event.mtime else {
        return Err(LoaderError::ReadFailed {
            path,
            reason: "event carries no mtime".to_string(),
        });
    };

    let bytes = tokio::fs::read(&path).await.map_err(|e| read_error(&path, &e))?;
    let read_at = SystemTime::now();

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| read_error(&path, &e))?;
    let mtime_after = metadata.modified().map_err(|e| LoaderError::ReadFailed {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    if mtime_after > expected_mtime {
        // A write completed during (or just after) the read; the
        // follow-up event triggers a fresh read.
        return Err(LoaderError::StaleRead { path });
    }
    if mtime_after < expected_mtime {
        // mtime never moves backwards for a stable inode; this can
        // only be a rename-over. Discard; a Modified event follows.
        debug_assert!(
            mtime_after >= expected_mtime,
            "mtime moved backwards for {}",
            path.display()
        );
        tracing::warn!(path = %path.display(), "File mtime moved backwards, dropping read");
        return Err(LoaderError::StaleRead { path });
    }

    let text = String::from_utf8(bytes).map_err(|_| LoaderError::Encoding { path })?;

    Ok(LoadedFileEvent {
        event,
        text: Some(text),
        read_at: Some(read_at),
    })
}

fn read_error(path: &Path, e: &std::io::Error) -> LoaderError {
    if e.kind() == std::io::ErrorKind::NotFound {
        LoaderError::Vanished {
            path: path.to_path_buf(),
        }
    } else {
        LoaderError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(10);
    const DELAY: Duration = Duration::from_millis(100);

    async fn next_loaded(loader: &mut FileLoader) -> LoadedFileEvent {
        timeout(WAIT, loader.recv())
            .await
            .expect("timed out waiting for loaded event")
            .expect("loader stream ended")
    }

    async fn wait_for_path(loader: &mut FileLoader, path: &Path) -> LoadedFileEvent {
        loop {
            let loaded = next_loaded(loader).await;
            if loaded.path() == path {
                return loaded;
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_created_file_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let mut loader = FileLoader::spawn(tmp.path(), DELAY).unwrap();

        let path = tmp.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();

        let loaded = wait_for_path(&mut loader, &path).await;
        assert_eq!(loaded.text.as_deref(), Some("hello world"));
        assert!(loaded.read_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deleted_file_passes_through_unread() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        fs::write(&path, "short lived").unwrap();

        let mut loader = FileLoader::spawn(tmp.path(), DELAY).unwrap();
        fs::remove_file(&path).unwrap();

        let loaded = wait_for_path(&mut loader, &path).await;
        assert_eq!(loaded.kind(), EventKind::Deleted);
        assert!(loaded.text.is_none());
        assert!(loaded.read_at.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_non_utf8_file_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let mut loader = FileLoader::spawn(tmp.path(), DELAY).unwrap();

        let binary = tmp.path().join("blob.bin");
        fs::write(&binary, [0xFF, 0xFE, 0x00, 0x80]).unwrap();

        // The marker written afterwards must be the next thing the
        // loader emits; the binary file is logged and dropped.
        tokio::time::sleep(DELAY * 3).await;
        let marker = tmp.path().join("marker.txt");
        fs::write(&marker, "valid").unwrap();

        let loaded = next_loaded(&mut loader).await;
        assert_eq!(loaded.path(), marker);
        assert_eq!(loaded.text.as_deref(), Some("valid"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rapid_writes_coalesce_to_final_contents() {
        let tmp = TempDir::new().unwrap();
        let mut loader = FileLoader::spawn(tmp.path(), DELAY).unwrap();

        let path = tmp.path().join("f.txt");
        for i in 0..10 {
            fs::write(&path, format!("version {i}")).unwrap();
        }

        // Whatever got coalesced, the last accepted read must be the
        // final contents, whole.
        let mut last_text = None;
        loop {
            match timeout(Duration::from_secs(2), loader.recv()).await {
                Ok(Some(loaded)) if loaded.path() == path => {
                    last_text = loaded.text;
                }
                _ => break,
            }
        }
        assert_eq!(last_text.as_deref(), Some("version 9"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_close_cascades_and_ends_stream() {
        let tmp = TempDir::new().unwrap();
        let mut loader = FileLoader::spawn(tmp.path(), DELAY).unwrap();

        loader.close();
        let end = timeout(WAIT, loader.recv()).await.unwrap();
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_newer_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.txt");
        fs::write(&path, "contents").unwrap();

        // Pretend the triggering event saw an older mtime than the
        // file now has.
        let actual = fs::metadata(&path).unwrap().modified().unwrap();
        let stale_event = FileEvent::modified(&path, actual - Duration::from_secs(5));

        let result = load(stale_event).await;
        assert!(matches!(result, Err(LoaderError::StaleRead { .. })));
    }

    #[tokio::test]
    async fn test_load_accepts_matching_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.txt");
        fs::write(&path, "contents").unwrap();

        let mtime = fs::metadata(&path).unwrap().modified().unwrap();
        let event = FileEvent::modified(&path, mtime);

        let loaded = load(event).await.unwrap();
        assert_eq!(loaded.text.as_deref(), Some("contents"));
    }

    #[tokio::test]
    async fn test_load_vanished_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone.txt");
        let event = FileEvent::created(&path, SystemTime::now());

        let result = load(event).await;
        assert!(matches!(result, Err(LoaderError::Vanished { .. })));
    }
}
