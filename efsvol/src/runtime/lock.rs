//! Registry lock preventing two driver processes from sharing a mount root.
//!
//! Uses `flock` so the lock disappears with the process, even on a crash,
//! and a restarted driver can reclaim the root immediately.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use efsvol_shared::errors::{EfsvolError, EfsvolResult};

/// Guard holding an exclusive lock on `<root>/.lock`.
///
/// Released when dropped.
#[derive(Debug)]
pub struct RegistryLock {
    #[allow(dead_code)] // Held for lifetime, not directly accessed
    file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Try to take the lock without blocking.
    ///
    /// Fails if another registry already owns the root.
    pub fn acquire(lock_path: &Path) -> EfsvolResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| EfsvolError::Storage(format!("failed to open lock file: {}", e)))?;

        use std::os::unix::io::AsRawFd;

        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };

        if result != 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::WouldBlock {
                return Err(EfsvolError::Config(format!(
                    "Another volume driver is already using mount dir: {}",
                    lock_path.parent().unwrap_or(lock_path).display()
                )));
            }
            return Err(EfsvolError::Storage(format!(
                "failed to acquire lock: {}",
                err
            )));
        }

        tracing::debug!(lock_path = %lock_path.display(), "Acquired registry lock");

        Ok(RegistryLock {
            file,
            path: lock_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        let fd = self.file.as_raw_fd();
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }

        tracing::debug!(lock_path = %self.path.display(), "Released registry lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".lock");

        let _lock1 = RegistryLock::acquire(&path).unwrap();
        let err = RegistryLock::acquire(&path).unwrap_err();

        assert!(err.to_string().contains("Another volume driver"));
    }

    #[test]
    fn test_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".lock");

        {
            let lock = RegistryLock::acquire(&path).unwrap();
            assert_eq!(lock.path(), path);
        }

        let _again = RegistryLock::acquire(&path).unwrap();
    }

    #[test]
    fn test_independent_roots() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();

        let _lock1 = RegistryLock::acquire(&dir1.path().join(".lock")).unwrap();
        let _lock2 = RegistryLock::acquire(&dir2.path().join(".lock")).unwrap();
    }
}
