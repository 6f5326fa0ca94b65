//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::path::Path;

    #[test]
    fn test_error_display() {
        let err = Error::config("root does not exist");
        assert_eq!(
            err.to_string(),
            "configuration error: root does not exist"
        );
    }

    #[test]
    fn test_watcher_error_watch_failed() {
        let err = WatcherError::watch_failed(Path::new("/tmp/gone"), "permission denied");
        assert_eq!(
            err.to_string(),
            "failed to watch path '/tmp/gone': permission denied"
        );
    }

    #[test]
    fn test_watcher_error_conversion() {
        let watch_err = WatcherError::ServiceClosed;
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::Watcher(_)));
    }

    #[test]
    fn test_loader_error_encoding() {
        let err = LoaderError::Encoding {
            path: PathBuf::from("/data/blob.bin"),
        };
        assert_eq!(err.to_string(), "file '/data/blob.bin' is not valid UTF-8");
    }

    #[test]
    fn test_loader_error_vanished() {
        let err = LoaderError::Vanished {
            path: PathBuf::from("/data/tmp.txt"),
        };
        assert_eq!(
            err.to_string(),
            "file '/data/tmp.txt' vanished before it could be read"
        );
    }

    #[test]
    fn test_loader_error_stale_read() {
        let err = LoaderError::StaleRead {
            path: PathBuf::from("/data/busy.log"),
        };
        assert_eq!(
            err.to_string(),
            "file '/data/busy.log' changed while being read"
        );
    }

    #[test]
    fn test_loader_error_conversion() {
        let load_err = LoaderError::ReadFailed {
            path: PathBuf::from("/data/f"),
            reason: "interrupted".to_string(),
        };
        let err: Error = load_err.into();
        assert!(matches!(err, Error::Loader(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_internal() {
        let err = Error::internal("pump task ended unexpectedly");
        assert_eq!(
            err.to_string(),
            "internal error: pump task ended unexpectedly"
        );
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Internal("something went wrong".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Internal"));
        assert!(debug_str.contains("something went wrong"));
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<i32> {
            Err(Error::config("inner error"))
        }

        fn outer() -> Result<i32> {
            let _ = inner()?;
            Ok(0)
        }

        let result = outer();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "configuration error: inner error"
        );
    }
}
