//! Reader-side glue: attach, copy out, decode
//!
//! Readers are independent processes with no channel to the publisher
//! beyond the segment itself. There is no cross-process synchronization:
//! a read racing a reload may find no segment, a fresh but unwritten one,
//! or a torn payload. Both `SegmentNotFound` and `MalformedSegment`
//! therefore mean "retry later", never "give up"; see
//! [`ShmCastError::is_retryable`].

use std::path::Path;

use crate::codec::{AssetMap, Strategy};
use crate::config::PublisherConfig;
use crate::error::Result;
#[allow(unused_imports)] // doc link target
use crate::error::ShmCastError;
use crate::segment::{self, SegmentKey, SegmentManager};

/// Read-only consumer of a published segment
#[derive(Debug, Clone)]
pub struct SegmentReader {
    manager: SegmentManager,
    key: SegmentKey,
    strategy: Strategy,
}

impl SegmentReader {
    /// Reader deriving its key from an anchor path and project id
    pub fn new(anchor_path: impl AsRef<Path>, project_id: u8, strategy: Strategy) -> Result<Self> {
        Ok(Self {
            manager: SegmentManager::new(),
            key: segment::derive(anchor_path, project_id)?,
            strategy,
        })
    }

    /// Reader sharing a publisher's configuration
    pub fn from_config(config: &PublisherConfig) -> Result<Self> {
        Ok(Self {
            manager: SegmentManager::new(),
            key: config.segment_key()?,
            strategy: config.settings.strategy,
        })
    }

    /// The derived key this reader attaches to
    pub fn key(&self) -> SegmentKey {
        self.key
    }

    /// Copy out the raw segment bytes without decoding
    pub fn read_raw(&self) -> Result<Vec<u8>> {
        self.manager.read(self.key)
    }

    /// Read and decode the published mapping
    pub fn read(&self) -> Result<AssetMap> {
        let bytes = self.read_raw()?;
        self.strategy.decode(&bytes)
    }
}
