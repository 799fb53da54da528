//! Reference-counted volume registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use tokio::sync::{RwLock, RwLockWriteGuard};

use super::record::{VolumeInfo, VolumeRecord};
use super::store::{StateStore, VolumeMap};
use crate::mounter::{Invoker, MountExecutor};
use crate::runtime::{DriverLayout, DriverOptions, RegistryLock, validate_volume_name};
use crate::util::{UmaskGuard, path_exists};

/// Thread-safe registry of volumes and their mount reference counts.
///
/// Cloning is cheap; all clones share the same state.
///
/// # Locking
///
/// One `RwLock` guards the map. Lookups take it shared. Every mutation
/// takes it exclusively and keeps it across the whole check, physical
/// mount/unmount, persist and swap sequence. Two first-time mounts of the
/// same volume therefore serialize and only one of them reaches the host;
/// the price is that physical mount latency is serialized registry-wide.
///
/// # Persistence
///
/// Mutations are applied to a staged copy of the map, the copy is written
/// to the state file, and only then does it replace the live map. A reader
/// never sees state that is not on disk.
#[derive(Clone)]
pub struct VolumeRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    volumes: RwLock<VolumeMap>,
    layout: DriverLayout,
    store: StateStore,
    executor: MountExecutor,
    _lock: RegistryLock,
}

impl VolumeRegistry {
    /// Open the registry rooted at `options.mount_dir`.
    ///
    /// Creates the root, takes the process lock, restores the state file
    /// (if any) and probes every volume the state claims is mounted.
    ///
    /// # Errors
    ///
    /// - Another registry already owns the root
    /// - The state file exists but cannot be read or decoded
    pub async fn open(options: &DriverOptions, invoker: Arc<dyn Invoker>) -> EfsvolResult<Self> {
        let layout = DriverLayout::new(&options.mount_dir)?;
        layout.prepare()?;

        let lock = RegistryLock::acquire(&layout.lock_file())?;
        let store = StateStore::new(layout.state_file());
        let volumes = store.load()?;
        let executor = MountExecutor::new(invoker, options);

        tracing::info!(
            mount_dir = %layout.root().display(),
            volumes = volumes.len(),
            availability_zone = ?options.availability_zone,
            "Volume registry opened"
        );

        let registry = Self {
            inner: Arc::new(RegistryInner {
                volumes: RwLock::new(volumes),
                layout,
                store,
                executor,
                _lock: lock,
            }),
        };

        registry.verify_mounts().await;
        Ok(registry)
    }

    pub fn layout(&self) -> &DriverLayout {
        &self.inner.layout
    }

    /// Cancel in-flight mount commands; later commands fail immediately.
    pub fn shutdown(&self) {
        tracing::info!("Cancelling in-flight mount commands");
        self.inner.executor.shutdown_token().cancel();
    }

    /// Register a volume. Idempotent: an existing name is left untouched,
    /// including its remote address.
    pub async fn create(
        &self,
        name: &str,
        remote_address: &str,
        az_map: BTreeMap<String, String>,
    ) -> EfsvolResult<()> {
        validate_volume_name(name)?;
        if remote_address.is_empty() {
            return Err(EfsvolError::missing_ip());
        }

        let mut volumes = self.inner.volumes.write().await;

        if let Some(existing) = volumes.get(name) {
            if existing.remote_address != remote_address {
                tracing::debug!(
                    volume = %name,
                    stored = %existing.remote_address,
                    requested = %remote_address,
                    "Volume exists, keeping stored address"
                );
            }
            return Ok(());
        }

        tracing::info!(volume = %name, remote_address, "Creating volume");

        let mut staged = volumes.clone();
        staged.insert(
            name.to_string(),
            VolumeRecord::new(name.to_string(), remote_address.to_string(), az_map),
        );

        self.persist(&staged).map_err(|e| {
            EfsvolError::Storage(format!("persist state failed when creating: {}", e))
        })?;
        *volumes = staged;
        Ok(())
    }

    /// Take one logical mount; physically mounts on the first one.
    ///
    /// Returns the mount path. A failed physical mount leaves the record
    /// and the state file untouched, so the call can simply be retried.
    pub async fn mount(&self, name: &str) -> EfsvolResult<PathBuf> {
        validate_volume_name(name)?;

        let mut volumes = self.inner.volumes.write().await;
        let record = volumes
            .get(name)
            .ok_or_else(|| EfsvolError::not_created(name))?
            .clone();

        let mount_path = self.inner.layout.mount_path(name);
        let physical = !record.is_mounted();

        tracing::info!(
            volume = %name,
            mount_path = %mount_path.display(),
            count = record.mount_count,
            "Mounting volume"
        );

        if physical {
            self.physical_mount(&record.source(), &mount_path, &record.az_map)
                .await
                .map_err(|e| EfsvolError::Mount(format!("Error mounting volume: {}", e)))?;
        }

        let mut staged = volumes.clone();
        if let Some(vol) = staged.get_mut(name) {
            vol.mark_mounted(&mount_path);
        }

        if let Err(e) = self.persist(&staged) {
            if physical {
                // Nothing records this mount; take it down rather than leak it.
                if let Err(rollback) = self.physical_unmount(name, &mount_path).await {
                    tracing::error!(
                        volume = %name,
                        error = %rollback,
                        "Rollback unmount failed, host mount is now untracked"
                    );
                }
            }
            return Err(EfsvolError::Storage(format!(
                "persist state failed when mounting: {}",
                e
            )));
        }

        *volumes = staged;
        tracing::info!(
            volume = %name,
            count = record.mount_count + 1,
            "Volume mounted"
        );
        Ok(mount_path)
    }

    /// Release one logical mount; physically unmounts on the last one.
    pub async fn unmount(&self, name: &str) -> EfsvolResult<()> {
        validate_volume_name(name)?;

        let mut volumes = self.inner.volumes.write().await;
        let record = volumes
            .get(name)
            .ok_or_else(|| EfsvolError::volume_not_found(name))?
            .clone();

        let mount_path = record.mount_path.clone().ok_or_else(|| {
            tracing::error!(volume = %name, "failed-mountpoint-not-assigned");
            EfsvolError::not_mounted()
        })?;

        let physical = record.mount_count == 1;
        if physical {
            self.physical_unmount(name, &mount_path).await?;
        }

        let mut staged = volumes.clone();
        if let Some(vol) = staged.get_mut(name) {
            vol.mark_unmounted();
        }

        if let Err(e) = self.persist(&staged) {
            if physical {
                // The host mount is gone; keep memory in step with the host
                // so a later Mount mounts again instead of reusing the path.
                tracing::error!(
                    volume = %name,
                    "State file is behind the host after unmount"
                );
                *volumes = staged;
            }
            return Err(EfsvolError::Storage(format!(
                "failed to persist state when unmounting: {}",
                e
            )));
        }
        *volumes = staged;

        tracing::info!(
            volume = %name,
            count = record.mount_count.saturating_sub(1),
            "Volume unmounted"
        );
        Ok(())
    }

    /// Delete a volume, forcing one physical unmount if it is mounted.
    ///
    /// Outstanding logical mounts beyond the first are dropped with the
    /// record; their holders are not notified.
    pub async fn remove(&self, name: &str) -> EfsvolResult<()> {
        validate_volume_name(name)?;

        let mut volumes = self.inner.volumes.write().await;
        let record = volumes.get(name).cloned().ok_or_else(|| {
            tracing::error!(volume = %name, "failed-volume-removal");
            EfsvolError::volume_not_found(name)
        })?;

        if let Some(mount_path) = &record.mount_path {
            if record.mount_count > 1 {
                tracing::warn!(
                    volume = %name,
                    count = record.mount_count,
                    "Removing volume with outstanding mounts"
                );
            }
            self.physical_unmount(name, mount_path).await?;
        }

        tracing::info!(volume = %name, "Removing volume");

        let mut staged = volumes.clone();
        staged.remove(name);

        if let Err(e) = self.persist(&staged) {
            if record.mount_path.is_some() {
                // Unmounted but not removed: keep the record, released, so
                // Remove can be retried without another physical unmount.
                tracing::error!(
                    volume = %name,
                    "State file is behind the host after forced unmount"
                );
                if let Some(vol) = volumes.get_mut(name) {
                    vol.release_all();
                }
            }
            return Err(EfsvolError::Storage(format!(
                "failed to persist state when removing: {}",
                e
            )));
        }
        *volumes = staged;
        Ok(())
    }

    /// Mount path of a mounted volume.
    pub async fn path(&self, name: &str) -> EfsvolResult<PathBuf> {
        validate_volume_name(name)?;

        let volumes = self.inner.volumes.read().await;
        let record = volumes
            .get(name)
            .ok_or_else(|| EfsvolError::volume_not_found(name))?;

        record.mount_path.clone().ok_or_else(|| {
            tracing::error!(volume = %name, "failed-mountpoint-not-assigned");
            EfsvolError::not_mounted()
        })
    }

    /// Copy of one volume's record.
    pub async fn get(&self, name: &str) -> EfsvolResult<VolumeRecord> {
        validate_volume_name(name)?;

        let volumes = self.inner.volumes.read().await;
        volumes
            .get(name)
            .cloned()
            .ok_or_else(|| EfsvolError::volume_not_found(name))
    }

    /// Snapshot of all volumes, ordered by name.
    pub async fn list(&self) -> Vec<VolumeInfo> {
        let volumes = self.inner.volumes.read().await;
        volumes.values().map(VolumeRecord::to_info).collect()
    }

    /// Probe every volume the registry believes is mounted.
    ///
    /// Returns the names whose mount path does not look mounted. Purely
    /// diagnostic: nothing is changed.
    pub async fn verify_mounts(&self) -> Vec<String> {
        let mounted: Vec<VolumeRecord> = {
            let volumes = self.inner.volumes.read().await;
            volumes.values().filter(|v| v.is_mounted()).cloned().collect()
        };

        let mut drifted = Vec::new();
        for record in mounted {
            if !record.is_consistent() {
                tracing::warn!(
                    volume = %record.name,
                    count = record.mount_count,
                    "Restored record has a mount count but no mount path"
                );
            }

            let path = record
                .mount_path
                .clone()
                .unwrap_or_else(|| self.inner.layout.mount_path(&record.name));
            let expected = self.inner.layout.mount_path(&record.name);
            if path != expected {
                tracing::warn!(
                    volume = %record.name,
                    stored = %path.display(),
                    expected = %expected.display(),
                    "Stored mount path differs from the layout"
                );
            }

            let default_source = record.source();
            let source = self
                .inner
                .executor
                .select_source(&default_source, &record.az_map);
            if !self.inner.executor.check(&path, source).await {
                tracing::warn!(
                    volume = %record.name,
                    mount_path = %path.display(),
                    count = record.mount_count,
                    "Volume recorded as mounted but mount path is not mounted"
                );
                drifted.push(record.name);
            }
        }
        drifted
    }

    /// Exclusive access for maintenance paths that must not overlap a
    /// lifecycle mutation.
    pub(crate) async fn lock_exclusive(&self) -> RwLockWriteGuard<'_, VolumeMap> {
        self.inner.volumes.write().await
    }

    /// mkdir + mount with a relaxed umask, restored on every exit path.
    pub(crate) async fn physical_mount(
        &self,
        source: &str,
        mount_path: &Path,
        az_map: &BTreeMap<String, String>,
    ) -> EfsvolResult<()> {
        let _umask = UmaskGuard::relax();

        std::fs::create_dir_all(mount_path).map_err(|e| {
            tracing::error!(mount_path = %mount_path.display(), error = %e, "create-mountdir-failed");
            EfsvolError::Storage(format!(
                "failed to create mount dir {}: {}",
                mount_path.display(),
                e
            ))
        })?;

        if let Err(e) = self.inner.executor.mount(source, mount_path, az_map).await {
            // Leave no empty directory behind for a mount that never happened.
            let _ = std::fs::remove_dir(mount_path);
            return Err(e);
        }
        Ok(())
    }

    /// Existence check, unmount, then remove the mount directory.
    pub(crate) async fn physical_unmount(&self, name: &str, mount_path: &Path) -> EfsvolResult<()> {
        let exists = path_exists(mount_path).map_err(|e| {
            tracing::error!(mount_path = %mount_path.display(), error = %e, "failed-retrieving-mount-info");
            EfsvolError::Inconsistent("Error establishing whether volume exists".to_string())
        })?;

        if !exists {
            let msg = format!(
                "Volume {} does not exist (path: {}), nothing to do!",
                name,
                mount_path.display()
            );
            tracing::error!(volume = %name, "failed-mountpoint-not-found");
            return Err(EfsvolError::Inconsistent(msg));
        }

        tracing::info!(mount_path = %mount_path.display(), "Unmounting volume folder");

        self.inner
            .executor
            .unmount(mount_path)
            .await
            .map_err(|e| EfsvolError::Unmount(format!("Error unmounting volume: {}", e)))?;

        std::fs::remove_dir(mount_path).map_err(|e| {
            tracing::error!(mount_path = %mount_path.display(), error = %e, "remove-mountdir-failed");
            EfsvolError::Unmount(format!("Error removing mountpoint: {}", e))
        })?;

        tracing::info!(volume = %name, "Unmounted volume");
        Ok(())
    }

    fn persist(&self, volumes: &VolumeMap) -> EfsvolResult<()> {
        self.inner.store.save(volumes).inspect_err(|e| {
            tracing::error!(error = %e, "persist-state-failed");
        })
    }
}
