//! Durable registry state.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use efsvol_shared::errors::{EfsvolError, EfsvolResult};

use super::record::VolumeRecord;

pub type VolumeMap = BTreeMap<String, VolumeRecord>;

/// JSON state file holding the whole volume map.
///
/// Writes replace the file atomically (temp file in the same directory,
/// fsync, rename), so a crash mid-write leaves the previous state intact.
#[derive(Clone, Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted map. A missing file is an empty map.
    pub fn load(&self) -> EfsvolResult<VolumeMap> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(state_file = %self.path.display(), "No state file, starting empty");
                return Ok(VolumeMap::new());
            }
            Err(e) => {
                return Err(EfsvolError::Storage(format!(
                    "failed to read state file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let volumes: VolumeMap = serde_json::from_slice(&data).map_err(|e| {
            EfsvolError::Storage(format!(
                "failed to decode state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::info!(
            state_file = %self.path.display(),
            volumes = volumes.len(),
            "Loaded state"
        );
        Ok(volumes)
    }

    /// Replace the persisted map with `volumes`.
    pub fn save(&self, volumes: &VolumeMap) -> EfsvolResult<()> {
        let data = serde_json::to_vec(volumes)?;

        let dir = self.path.parent().ok_or_else(|| {
            EfsvolError::Internal(format!("state file {} has no parent", self.path.display()))
        })?;

        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            EfsvolError::Storage(format!(
                "failed to create temp state file in {}: {}",
                dir.display(),
                e
            ))
        })?;

        staged
            .write_all(&data)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| {
                EfsvolError::Storage(format!("failed to write temp state file: {}", e))
            })?;

        staged.persist(&self.path).map_err(|e| {
            tracing::error!(state_file = %self.path.display(), error = %e, "failed-to-write-state-file");
            EfsvolError::Storage(format!(
                "failed to replace state file {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        tracing::debug!(state_file = %self.path.display(), volumes = volumes.len(), "State saved");
        Ok(())
    }
}
