//! Advisory inter-process lock on the region's sibling `.lock` file.
//!
//! A single exclusive `flock` serializes every read and write of the mapped
//! region across processes. The kernel drops the lock when the holder's
//! file descriptor closes, so a crashed or killed holder never wedges the
//! region.
//!
//! `flock` locks belong to the open file description, not the thread: two
//! threads sharing one `RegionLock` would both "hold" it at once. The
//! store therefore serializes its own threads with an in-process mutex
//! before ever touching this lock.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Handle on the lock file. Acquire per operation; the guard unlocks on
/// drop.
pub struct RegionLock {
    file: File,
}

impl RegionLock {
    /// Open (creating if absent) the lock file. The file itself stays
    /// zero bytes; only its lock state matters.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(RegionLock { file })
    }

    /// Block until the exclusive lock is held.
    pub fn acquire(&self) -> io::Result<LockGuard<'_>> {
        flock_retry(&self.file, libc::LOCK_EX)?;
        Ok(LockGuard { file: &self.file })
    }

    /// Non-blocking acquire; `None` when another process holds the lock.
    pub fn try_acquire(&self) -> io::Result<Option<LockGuard<'_>>> {
        match flock_retry(&self.file, libc::LOCK_EX | libc::LOCK_NB) {
            Ok(()) => Ok(Some(LockGuard { file: &self.file })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Holds the exclusive region lock; dropping it unlocks.
pub struct LockGuard<'a> {
    file: &'a File,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // Unlock cannot meaningfully fail; the fd-close fallback covers the
        // pathological cases anyway.
        let _ = flock_retry(self.file, libc::LOCK_UN);
    }
}

fn flock_retry(file: &File, op: libc::c_int) -> io::Result<()> {
    loop {
        // SAFETY: the fd is valid for the lifetime of `file`, and flock has
        // no memory-safety preconditions.
        let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}
