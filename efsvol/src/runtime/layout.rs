use std::path::{Path, PathBuf};

use efsvol_shared::constants::files;
use efsvol_shared::errors::{EfsvolError, EfsvolResult};

// ============================================================================
// FILESYSTEM LAYOUT (mount root)
// ============================================================================

/// Paths derived from the mount root.
///
/// ```text
/// <root>/
///   .lock                  process exclusivity lock
///   .logs/                 daily log files
///   efs-broker-state.json  persisted registry
///   <volume-name>/         mount path of each volume
/// ```
#[derive(Clone, Debug)]
pub struct DriverLayout {
    root: PathBuf,
}

impl DriverLayout {
    /// Build a layout, resolving `root` against the current directory.
    pub fn new(root: &Path) -> EfsvolResult<Self> {
        let root = std::path::absolute(root).map_err(|e| {
            EfsvolError::Config(format!(
                "cannot resolve mount dir {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join(files::STATE_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(files::LOCK_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(files::LOGS_DIR)
    }

    /// Deterministic mount path for a volume: `<root>/<name>`.
    ///
    /// Callers validate `name` first (see [`validate_volume_name`]).
    pub fn mount_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create the root directory.
    pub fn prepare(&self) -> EfsvolResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            EfsvolError::Storage(format!(
                "failed to create mount dir {}: {}",
                self.root.display(),
                e
            ))
        })
    }
}

/// Reject names that would escape the root or collide with driver files.
pub fn validate_volume_name(name: &str) -> EfsvolResult<()> {
    if name.is_empty() {
        return Err(EfsvolError::missing_volume_name());
    }

    if name.contains('/') || name.contains('\0') || name.starts_with('.') || name == files::STATE_FILE
    {
        return Err(EfsvolError::InvalidArgument(format!(
            "Invalid volume name '{}'",
            name
        )));
    }

    Ok(())
}
