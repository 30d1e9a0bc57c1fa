//! End-to-end: asset source through the controller to a reader

use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::time::Duration;

use tempfile::{NamedTempFile, TempDir};

use shmcast::{
    segment, AssetSource, LifecycleController, SegmentManager, SegmentReader, ShmCastError,
    Strategy,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_sees_published_assets() {
        let assets = TempDir::new().unwrap();
        fs::write(assets.path().join("motd"), b"welcome").unwrap();
        fs::write(assets.path().join("version"), b"1.2.3").unwrap();

        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 81).unwrap();
        let source = AssetSource::new().with_paths([assets.path().to_path_buf()]);
        let mut controller =
            LifecycleController::new(SegmentManager::new(), key, Strategy::Framed, source)
                .with_poll_interval(Duration::from_millis(1));
        controller.start().unwrap();

        // the reader derives the same key on its own
        let reader = SegmentReader::new(anchor.path(), 81, Strategy::Framed).unwrap();
        assert_eq!(reader.key(), key);
        let mapping = reader.read().unwrap();
        assert_eq!(mapping.len(), 2);
        let motd_key = assets.path().join("motd").as_os_str().as_bytes().to_vec();
        assert_eq!(mapping[&motd_key], b"welcome");

        controller.shutdown();
        let err = reader.read().unwrap_err();
        assert!(matches!(err, ShmCastError::SegmentNotFound { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_reload_propagates_new_file_contents() {
        let assets = TempDir::new().unwrap();
        let file = assets.path().join("counter");
        fs::write(&file, b"one").unwrap();

        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 82).unwrap();
        let source = AssetSource::new().with_paths([assets.path().to_path_buf()]);
        let mut controller =
            LifecycleController::new(SegmentManager::new(), key, Strategy::Framed, source)
                .with_poll_interval(Duration::from_millis(1));
        controller.start().unwrap();

        let reader = SegmentReader::new(anchor.path(), 82, Strategy::Framed).unwrap();
        let file_key = file.as_os_str().as_bytes().to_vec();
        let before = reader.read().unwrap();
        assert_eq!(before[&file_key], b"one");

        fs::write(&file, b"two, and longer than before").unwrap();
        controller.reload().unwrap();

        let after = reader.read().unwrap();
        assert_eq!(after[&file_key], b"two, and longer than before");

        controller.shutdown();
    }

    #[test]
    fn test_torn_or_truncated_segment_reads_as_retryable() {
        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 83).unwrap();
        let manager = SegmentManager::new();

        // a writer crashed mid-write: count says one record, bytes end early
        let mut torn = 1u64.to_le_bytes().to_vec();
        torn.push(200);
        let handle = manager.create_or_replace(key, &torn).unwrap();

        let reader = SegmentReader::new(anchor.path(), 83, Strategy::Framed).unwrap();
        let err = reader.read().unwrap_err();
        assert!(matches!(err, ShmCastError::MalformedSegment { .. }));
        assert!(err.is_retryable());

        manager.delete(key).unwrap();
        manager.close(handle);
    }
}
