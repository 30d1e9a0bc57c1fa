//! Thin checked wrappers around the System V shared memory syscalls
//!
//! Every wrapper maps a `-1` return to the current `Errno`; taxonomy
//! decisions (not-found vs create-failed vs platform) live in the manager.

use std::ptr;

use nix::errno::Errno;

use super::identity::SegmentKey;

pub(crate) type OsResult<T> = std::result::Result<T, Errno>;

/// `shmget` with IPC_CREAT|IPC_EXCL: fresh segment sized exactly `size`
pub(crate) fn create_exclusive(key: SegmentKey, size: usize, mode: u32) -> OsResult<libc::c_int> {
    let flags = libc::IPC_CREAT | libc::IPC_EXCL | mode as libc::c_int;
    let id = unsafe { libc::shmget(key.as_raw(), size, flags) };
    if id == -1 {
        return Err(Errno::last());
    }
    Ok(id)
}

/// `shmget` without creation flags: resolve an existing segment id
pub(crate) fn open_existing(key: SegmentKey) -> OsResult<libc::c_int> {
    let id = unsafe { libc::shmget(key.as_raw(), 0, 0) };
    if id == -1 {
        return Err(Errno::last());
    }
    Ok(id)
}

/// `shmctl(IPC_STAT)`: the OS-reported segment size
pub(crate) fn stat_size(id: libc::c_int) -> OsResult<usize> {
    let mut ds: libc::shmid_ds = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::shmctl(id, libc::IPC_STAT, &mut ds) };
    if rc == -1 {
        return Err(Errno::last());
    }
    Ok(ds.shm_segsz as usize)
}

/// `shmctl(IPC_RMID)`: mark the segment for destruction
pub(crate) fn remove(id: libc::c_int) -> OsResult<()> {
    let rc = unsafe { libc::shmctl(id, libc::IPC_RMID, ptr::null_mut()) };
    if rc == -1 {
        return Err(Errno::last());
    }
    Ok(())
}

/// `shmat`: map the segment into this process
pub(crate) fn attach(id: libc::c_int, readonly: bool) -> OsResult<*mut u8> {
    let flags = if readonly { libc::SHM_RDONLY } else { 0 };
    let addr = unsafe { libc::shmat(id, ptr::null(), flags) };
    if addr as isize == -1 {
        return Err(Errno::last());
    }
    Ok(addr as *mut u8)
}

/// `shmdt`: unmap a previously attached segment
pub(crate) fn detach(addr: *mut u8) -> OsResult<()> {
    let rc = unsafe { libc::shmdt(addr as *const libc::c_void) };
    if rc == -1 {
        return Err(Errno::last());
    }
    Ok(())
}
