use std::path::Path;

use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use nix::sys::stat::{Mode, umask};

/// Relaxes the process umask to `0` and restores the previous mask on drop.
///
/// The umask is process-wide; hold the guard only while the registry's
/// exclusive lock is held so two relax/restore pairs never interleave.
#[derive(Debug)]
pub struct UmaskGuard {
    previous: Mode,
}

impl UmaskGuard {
    pub fn relax() -> Self {
        let previous = umask(Mode::empty());
        tracing::trace!(previous = format!("{:04o}", previous.bits()), "Relaxed umask");
        Self { previous }
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        umask(self.previous);
        tracing::trace!(restored = format!("{:04o}", self.previous.bits()), "Restored umask");
    }
}

/// `Ok(false)` only when the path is definitely absent.
///
/// Any other stat failure is surfaced, since it says nothing about whether
/// the mount is still there.
pub fn path_exists(path: &Path) -> EfsvolResult<bool> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(EfsvolError::Storage(format!(
            "failed to stat {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_umask_restored_on_drop() {
        let original = umask(Mode::from_bits_truncate(0o022));

        {
            let _guard = UmaskGuard::relax();
            let inside = umask(Mode::empty());
            assert_eq!(inside.bits(), 0);
        }

        let after = umask(original);
        assert_eq!(after.bits(), 0o022);
    }

    #[test]
    fn test_path_exists() {
        let temp_dir = TempDir::new().unwrap();
        assert!(path_exists(temp_dir.path()).unwrap());
        assert!(!path_exists(&temp_dir.path().join("missing")).unwrap());
    }
}
