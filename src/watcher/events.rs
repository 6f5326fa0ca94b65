//! Raw file system event types.

use std::path::PathBuf;
use std::time::SystemTime;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File appeared under the root.
    Created,
    /// File contents changed.
    Modified,
    /// File was removed.
    Deleted,
}

/// A raw file system event for a regular file.
///
/// `mtime` is the modification time reported by the OS at the moment
/// the event was observed; it is present for Created and Modified and
/// absent for Deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: EventKind,
    pub path: PathBuf,
    pub mtime: Option<SystemTime>,
}

impl FileEvent {
    /// A creation event with the file's observed mtime.
    #[must_use]
    pub fn created(path: impl Into<PathBuf>, mtime: SystemTime) -> Self {
        Self {
            kind: EventKind::Created,
            path: path.into(),
            mtime: Some(mtime),
        }
    }

    /// A modification event with the file's observed mtime.
    #[must_use]
    pub fn modified(path: impl Into<PathBuf>, mtime: SystemTime) -> Self {
        Self {
            kind: EventKind::Modified,
            path: path.into(),
            mtime: Some(mtime),
        }
    }

    /// A deletion event. Deleted files have no mtime.
    #[must_use]
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: EventKind::Deleted,
            path: path.into(),
            mtime: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_carries_mtime() {
        let now = SystemTime::now();
        let event = FileEvent::created("/root/a.txt", now);
        assert_eq!(event.kind, EventKind::Created);
        assert_eq!(event.path, PathBuf::from("/root/a.txt"));
        assert_eq!(event.mtime, Some(now));
    }

    #[test]
    fn test_deleted_has_no_mtime() {
        let event = FileEvent::deleted("/root/a.txt");
        assert_eq!(event.kind, EventKind::Deleted);
        assert!(event.mtime.is_none());
    }
}
