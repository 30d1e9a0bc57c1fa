//! Segment lifecycle operations
//!
//! A [`SegmentManager`] is the only way the rest of the crate touches the
//! OS primitive. The publisher keeps one [`SegmentHandle`] attached for as
//! long as the segment is live; readers attach, copy out, and detach within
//! a single [`SegmentManager::read`] call.

use std::ptr;

use log::{debug, warn};
use nix::errno::Errno;

use crate::error::{Result, ShmCastError};

use super::identity::SegmentKey;
use super::shmop;

/// Default segment permissions, owner read/write only
pub const DEFAULT_SEGMENT_MODE: u32 = 0o600;

/// An attached, writable shared memory segment owned by the publisher
#[derive(Debug)]
pub struct SegmentHandle {
    id: libc::c_int,
    key: SegmentKey,
    size: usize,
    addr: *mut u8,
}

impl SegmentHandle {
    /// The derived key this segment is published under
    pub fn key(&self) -> SegmentKey {
        self.key
    }

    /// The OS segment identifier
    pub fn id(&self) -> libc::c_int {
        self.id
    }

    /// Exact payload size the segment was created with
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for SegmentHandle {
    fn drop(&mut self) {
        if let Err(errno) = shmop::detach(self.addr) {
            warn!("failed to detach segment {}: {}", self.key, errno);
        }
    }
}

// The handle owns its mapping exclusively; the raw pointer is never shared.
unsafe impl Send for SegmentHandle {}

/// Create/read/delete operations on shared memory segments
///
/// Assumes a single publisher per derived key; concurrent publishers
/// targeting the same key race on the delete/create window and are
/// unsupported.
#[derive(Debug, Clone)]
pub struct SegmentManager {
    mode: u32,
}

impl SegmentManager {
    /// Manager with the default 0600 segment permissions
    pub fn new() -> Self {
        Self {
            mode: DEFAULT_SEGMENT_MODE,
        }
    }

    /// Manager with explicit segment permissions
    pub fn with_mode(mode: u32) -> Self {
        Self { mode }
    }

    /// Publish `payload` under `key`, replacing any previous segment.
    ///
    /// The old segment is deleted first; the new one is created sized
    /// exactly `payload.len()` and fully written at offset 0 before this
    /// returns. Segments are never resized in place, since a new payload
    /// may have a different size.
    pub fn create_or_replace(&self, key: SegmentKey, payload: &[u8]) -> Result<SegmentHandle> {
        if payload.is_empty() {
            return Err(ShmCastError::invalid_parameter(
                "payload",
                "segments cannot be zero-sized",
            ));
        }

        self.delete(key)?;

        let id = shmop::create_exclusive(key, payload.len(), self.mode)
            .map_err(|errno| ShmCastError::segment_create(key, "shmget", errno))?;
        let addr = match shmop::attach(id, false) {
            Ok(addr) => addr,
            Err(errno) => {
                // never leave a segment nobody can find a handle to
                let _ = shmop::remove(id);
                return Err(ShmCastError::segment_create(key, "shmat", errno));
            }
        };

        unsafe {
            ptr::copy_nonoverlapping(payload.as_ptr(), addr, payload.len());
        }
        debug!(
            "wrote {} bytes into segment {} (id {})",
            payload.len(),
            key,
            id
        );

        Ok(SegmentHandle {
            id,
            key,
            size: payload.len(),
            addr,
        })
    }

    /// Copy out the current bytes of the segment published under `key`.
    ///
    /// Attaches read-only, copies the whole OS-reported size, detaches.
    /// The segment is not modified. There is no cross-process ordering
    /// guarantee: a read racing a publisher's delete/create window may see
    /// a missing segment or a torn payload; decode failures downstream are
    /// retryable for exactly that reason.
    pub fn read(&self, key: SegmentKey) -> Result<Vec<u8>> {
        let id = shmop::open_existing(key).map_err(|errno| self.map_lookup_errno(key, errno))?;
        let size = shmop::stat_size(id).map_err(|errno| self.map_lookup_errno(key, errno))?;
        let addr =
            shmop::attach(id, true).map_err(|errno| self.map_lookup_errno(key, errno))?;

        let mut out = vec![0u8; size];
        unsafe {
            ptr::copy_nonoverlapping(addr as *const u8, out.as_mut_ptr(), size);
        }

        if let Err(errno) = shmop::detach(addr) {
            warn!("failed to detach segment {} after read: {}", key, errno);
        }
        Ok(out)
    }

    /// Mark the segment published under `key` for destruction.
    ///
    /// Idempotent: deleting a key with no live segment succeeds.
    pub fn delete(&self, key: SegmentKey) -> Result<()> {
        let id = match shmop::open_existing(key) {
            Ok(id) => id,
            Err(Errno::ENOENT) => return Ok(()),
            Err(errno) => {
                return Err(ShmCastError::platform(format!(
                    "shmget failed while deleting segment {}: {}",
                    key, errno
                )))
            }
        };
        match shmop::remove(id) {
            Ok(()) => {
                debug!("removed segment {} (id {})", key, id);
                Ok(())
            }
            // already torn down by someone else between lookup and removal
            Err(Errno::EINVAL) | Err(Errno::EIDRM) => Ok(()),
            Err(errno) => Err(ShmCastError::platform(format!(
                "shmctl(IPC_RMID) failed on segment {}: {}",
                key, errno
            ))),
        }
    }

    /// Detach from the segment without deleting it
    pub fn close(&self, handle: SegmentHandle) {
        debug!("detaching from segment {} (id {})", handle.key(), handle.id());
        drop(handle);
    }

    /// A segment that vanished between syscalls reads as not-found, not as
    /// a platform fault
    fn map_lookup_errno(&self, key: SegmentKey, errno: Errno) -> ShmCastError {
        match errno {
            Errno::ENOENT | Errno::EINVAL | Errno::EIDRM => ShmCastError::segment_not_found(key),
            other => ShmCastError::platform(format!(
                "shm syscall failed on segment {}: {}",
                key, other
            )),
        }
    }
}

impl Default for SegmentManager {
    fn default() -> Self {
        Self::new()
    }
}
