//! Advisory lock on the data directory.
//!
//! Every `vg` command reads `scene.yaml` and `views.yaml`, changes them, and
//! writes them back. Holding one `flock` for the whole command keeps two
//! invocations from interleaving those writes.

use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

const LOCK_FILE: &str = "vg.lock";

/// Exclusive hold on a data directory. Released when dropped.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Takes the lock without waiting. Fails with `WouldBlock` if another
    /// process holds it.
    pub fn try_acquire(base_path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(base_path.join(LOCK_FILE))?;

        let lock = Self { file };
        lock.lock_nonblocking()?;
        log::debug!("acquired {}", base_path.join(LOCK_FILE).display());
        Ok(lock)
    }

    #[cfg(unix)]
    fn lock_nonblocking(&self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        let busy = err.kind() == io::ErrorKind::WouldBlock
            || matches!(
                err.raw_os_error(),
                Some(code) if code == libc::EWOULDBLOCK || code == libc::EAGAIN
            );
        if busy {
            Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "data directory is locked by another vg process",
            ))
        } else {
            Err(err)
        }
    }

    #[cfg(not(unix))]
    fn lock_nonblocking(&self) -> io::Result<()> {
        let _ = &self.file;
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for FileLock {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;

        // errors are irrelevant here, the fd closes right after
        unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
    }
}
