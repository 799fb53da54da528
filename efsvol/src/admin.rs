//! Administrative volume tools.
//!
//! Served on a separate endpoint to trusted callers only. Nothing here is a
//! lifecycle transition: the registry's map and state file are never
//! modified.

use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;

use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use tracing::Instrument;

use crate::driver::{ErrorResponse, OpenPermsRequest};
use crate::runtime::validate_volume_name;
use crate::volumes::{VolumeRegistry, export_source};

/// Mode applied to a volume's root by [`VolTools::open_permissions`].
const OPEN_MODE: u32 = 0o777;

#[derive(Clone)]
pub struct VolTools {
    registry: VolumeRegistry,
}

impl VolTools {
    pub fn new(registry: VolumeRegistry) -> Self {
        Self { registry }
    }

    pub async fn open_perms(&self, request: OpenPermsRequest) -> ErrorResponse {
        let span = tracing::info_span!("open-perms", volume = %request.name);
        async {
            tracing::info!("start");

            let result = if request.name.is_empty() {
                Err(EfsvolError::missing_volume_name())
            } else if let Some(ip) = request.opts.ip.as_deref() {
                self.open_permissions(&request.name, ip).await
            } else {
                tracing::info!("mount-config-missing-ip");
                Err(EfsvolError::missing_ip())
            };

            tracing::info!("end");
            ErrorResponse::from_result(result)
        }
        .instrument(span)
        .await
    }

    /// Mount `remote_address` at the volume's path, make the export root
    /// world-writable, and unmount again.
    ///
    /// Refuses while the registry holds the volume mounted, since the
    /// trailing unmount would pull the export out from under its users.
    pub async fn open_permissions(&self, name: &str, remote_address: &str) -> EfsvolResult<()> {
        validate_volume_name(name)?;
        if remote_address.is_empty() {
            return Err(EfsvolError::missing_ip());
        }

        // Held throughout: the umask relaxation and the mount path must not
        // overlap a lifecycle call.
        let volumes = self.registry.lock_exclusive().await;

        if volumes.get(name).is_some_and(|v| v.is_mounted()) {
            return Err(EfsvolError::InvalidArgument(format!(
                "Volume '{}' is currently mounted",
                name
            )));
        }

        let mount_path = self.registry.layout().mount_path(name);
        tracing::info!(mount_path = %mount_path.display(), "Mounting volume");

        self.registry
            .physical_mount(&export_source(remote_address), &mount_path, &BTreeMap::new())
            .await
            .map_err(|e| EfsvolError::Mount(format!("Error mounting volume: {}", e)))?;

        if let Err(e) =
            std::fs::set_permissions(&mount_path, std::fs::Permissions::from_mode(OPEN_MODE))
        {
            tracing::error!(error = %e, "volume-chmod-failed");
            if let Err(unmount_err) = self.registry.physical_unmount(name, &mount_path).await {
                tracing::error!(error = %unmount_err, "Cleanup unmount failed");
            }
            return Err(EfsvolError::Storage(format!(
                "Error chmoding volume: {}",
                e
            )));
        }

        tracing::info!("Permissions opened");
        self.registry.physical_unmount(name, &mount_path).await
    }
}
