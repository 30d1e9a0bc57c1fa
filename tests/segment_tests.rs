//! Integration tests for key derivation and segment lifecycle
//!
//! These talk to the real System V shm facility. Every test derives its
//! key from its own temp file and removes the segment before returning,
//! so parallel tests never share a segment.

use tempfile::NamedTempFile;

use shmcast::{segment, SegmentManager, ShmCastError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let anchor = NamedTempFile::new().unwrap();
        let a = segment::derive(anchor.path(), 17).unwrap();
        let b = segment::derive(anchor.path(), 17).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derivation_separates_project_ids() {
        let anchor = NamedTempFile::new().unwrap();
        let sample: Vec<_> = [1u8, 2, 3, 50, 100, 200, 255]
            .iter()
            .map(|&id| segment::derive(anchor.path(), id).unwrap())
            .collect();
        for (i, a) in sample.iter().enumerate() {
            for b in &sample[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_derivation_separates_anchors() {
        let first = NamedTempFile::new().unwrap();
        let second = NamedTempFile::new().unwrap();
        assert_ne!(
            segment::derive(first.path(), 17).unwrap(),
            segment::derive(second.path(), 17).unwrap()
        );
    }

    #[test]
    fn test_missing_anchor_is_an_identity_error() {
        let err = segment::derive("/no/such/anchor/file", 17).unwrap_err();
        assert!(matches!(err, ShmCastError::Identity { .. }));
    }

    #[test]
    fn test_create_write_read_delete() {
        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 31).unwrap();
        let manager = SegmentManager::new();
        let payload = b"the payload readers should see".to_vec();

        let handle = manager.create_or_replace(key, &payload).unwrap();
        assert_eq!(handle.key(), key);
        assert_eq!(handle.size(), payload.len());

        let seen = manager.read(key).unwrap();
        assert!(seen.len() >= payload.len());
        assert_eq!(&seen[..payload.len()], &payload[..]);

        manager.delete(key).unwrap();
        manager.close(handle);
        assert!(matches!(
            manager.read(key).unwrap_err(),
            ShmCastError::SegmentNotFound { .. }
        ));
    }

    #[test]
    fn test_replace_resizes_the_segment() {
        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 32).unwrap();
        let manager = SegmentManager::new();

        let first = manager
            .create_or_replace(key, b"a much longer initial payload than the second")
            .unwrap();
        manager.close(first);

        let second = manager.create_or_replace(key, b"short").unwrap();
        assert_eq!(second.size(), 5);
        let seen = manager.read(key).unwrap();
        assert_eq!(&seen[..5], b"short");

        manager.delete(key).unwrap();
        manager.close(second);
    }

    #[test]
    fn test_read_without_publisher_is_not_found() {
        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 33).unwrap();
        let err = SegmentManager::new().read(key).unwrap_err();
        assert!(matches!(err, ShmCastError::SegmentNotFound { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 34).unwrap();
        let manager = SegmentManager::new();

        // nothing published yet
        manager.delete(key).unwrap();

        let handle = manager.create_or_replace(key, b"payload").unwrap();
        manager.delete(key).unwrap();
        manager.delete(key).unwrap();
        manager.close(handle);
    }

    #[test]
    fn test_zero_sized_payload_is_rejected() {
        let anchor = NamedTempFile::new().unwrap();
        let key = segment::derive(anchor.path(), 35).unwrap();
        let err = SegmentManager::new().create_or_replace(key, &[]).unwrap_err();
        assert!(matches!(err, ShmCastError::InvalidParameter { .. }));
    }
}
