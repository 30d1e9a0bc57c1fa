//! Error types and handling for shmcast

use std::path::PathBuf;

use nix::errno::Errno;

use crate::segment::SegmentKey;

/// Result type alias for shmcast operations
pub type Result<T> = std::result::Result<T, ShmCastError>;

/// Errors produced by the publisher and reader sides of the crate
#[derive(Debug, thiserror::Error)]
pub enum ShmCastError {
    /// A record key exceeds the one-byte length prefix of the wire format
    #[error("record key is {length} bytes, the wire format allows at most {max}: {key}")]
    KeyTooLong {
        key: String,
        length: usize,
        max: usize,
    },

    /// The segment bytes do not form a valid record stream
    #[error("malformed segment: {message}")]
    MalformedSegment { message: String },

    /// No segment is published under the derived key
    #[error("no segment published under key {key}")]
    SegmentNotFound { key: SegmentKey },

    /// The OS refused to create or replace a segment
    #[error("failed to create segment {key} ({op})")]
    SegmentCreateFailed {
        key: SegmentKey,
        op: &'static str,
        #[source]
        source: Errno,
    },

    /// Failure while the data source assembled its records
    #[error("data source failure: {message}")]
    DataSource {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The segment identity anchor could not be resolved
    #[error("segment anchor unavailable: {path}")]
    Identity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameters or configuration
    #[error("invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// I/O errors outside the segment itself (config files, asset files)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Encode/parse failures of the non-canonical value strategies
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Unexpected platform-level failures
    #[error("platform error: {message}")]
    Platform { message: String },
}

impl ShmCastError {
    /// Create a key-length error, truncating unprintable or oversized keys
    pub fn key_too_long(key: &[u8]) -> Self {
        let printable: String = String::from_utf8_lossy(key).chars().take(48).collect();
        Self::KeyTooLong {
            key: printable,
            length: key.len(),
            max: crate::codec::framed::MAX_KEY_LEN,
        }
    }

    /// Create a malformed-segment error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSegment {
            message: message.into(),
        }
    }

    /// Create a segment-not-found error
    pub fn segment_not_found(key: SegmentKey) -> Self {
        Self::SegmentNotFound { key }
    }

    /// Create a segment-creation error from a failed syscall
    pub fn segment_create(key: SegmentKey, op: &'static str, source: Errno) -> Self {
        Self::SegmentCreateFailed { key, op, source }
    }

    /// Create a data source error
    pub fn data_source(message: impl Into<String>, source: Option<std::io::Error>) -> Self {
        Self::DataSource {
            message: message.into(),
            source,
        }
    }

    /// Create an identity error for an unusable anchor path
    pub fn identity(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Identity {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    /// Whether a reader should treat this error as "try again later"
    /// rather than a permanent failure
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SegmentNotFound { .. } | Self::MalformedSegment { .. }
        )
    }
}

impl From<std::io::Error> for ShmCastError {
    fn from(err: std::io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for ShmCastError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for ShmCastError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization(format!("TOML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ShmCastError::key_too_long(&[b'k'; 300]);
        assert!(matches!(err, ShmCastError::KeyTooLong { length: 300, .. }));

        let err = ShmCastError::malformed("short read");
        assert!(matches!(err, ShmCastError::MalformedSegment { .. }));

        let err = ShmCastError::invalid_parameter("size", "must be nonzero");
        assert!(matches!(err, ShmCastError::InvalidParameter { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ShmCastError::malformed("need 8 bytes, 3 remain");
        let display = format!("{}", err);
        assert!(display.contains("malformed segment"));
        assert!(display.contains("need 8 bytes"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ShmCastError::malformed("torn read").is_retryable());
        assert!(!ShmCastError::invalid_parameter("x", "y").is_retryable());
    }
}
