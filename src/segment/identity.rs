//! Segment key derivation
//!
//! Publisher and readers never exchange the key directly; both derive it
//! from the same anchor file and project id, the way `ftok(3)` combines a
//! path's device/inode numbers with a one-byte project id.

use std::fmt;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::error::{Result, ShmCastError};

/// Identity of a shared memory segment, usable as a `key_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentKey(i32);

impl SegmentKey {
    /// Wrap a raw `key_t` value
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw `key_t` value passed to the shm syscalls
    pub fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

/// Derive the segment key from an anchor path and project id.
///
/// Deterministic: the same `(anchor, project_id)` pair always yields the
/// same key on the same filesystem, and differing project ids always yield
/// differing keys since the id occupies the top byte. The anchor must
/// resolve to an existing file; a missing anchor is an identity failure,
/// not a segment one.
pub fn derive(anchor_path: impl AsRef<Path>, project_id: u8) -> Result<SegmentKey> {
    let anchor = anchor_path.as_ref();
    let canonical =
        fs::canonicalize(anchor).map_err(|source| ShmCastError::identity(anchor, source))?;
    let meta =
        fs::metadata(&canonical).map_err(|source| ShmCastError::identity(&canonical, source))?;

    // the ftok(3) bit mix: project id, low device byte, low 16 inode bits
    let key = ((project_id as u32) << 24)
        | (((meta.dev() as u32) & 0xff) << 16)
        | ((meta.ino() as u32) & 0xffff);

    // key 0 is IPC_PRIVATE and never names a shared segment
    if key == 0 {
        return Err(ShmCastError::invalid_parameter(
            "project_id",
            "derived key collides with IPC_PRIVATE; pick a nonzero project id",
        ));
    }

    Ok(SegmentKey(key as i32))
}
