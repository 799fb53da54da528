//! Shared constants
//!
//! Values here end up on the wire or on disk, so changing one is a
//! compatibility break for existing state files and callers.

/// Mount command defaults.
pub mod mount {
    use std::time::Duration;

    /// Filesystem type passed to `mount -t`.
    pub const FS_TYPE: &str = "nfs4";

    /// Fixed NFS options. `actimeo=0` disables attribute caching, which
    /// otherwise serves stale attributes across clients.
    pub const MOUNT_OPTIONS: &str =
        "vers=4.0,rsize=1048576,wsize=1048576,timeo=600,retrans=2,actimeo=0";

    /// Suffix appended to a remote address to form the export source.
    pub const EXPORT_ROOT_SUFFIX: &str = ":/";

    /// Upper bound for a physical mount or unmount command.
    pub const MOUNT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Upper bound for the diagnostic mount probe.
    pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

    pub const MOUNT_PROGRAM: &str = "mount";
    pub const UNMOUNT_PROGRAM: &str = "umount";
    pub const CHECK_PROGRAM: &str = "mountpoint";
}

/// Names of files kept under the mount root.
pub mod files {
    /// Persisted registry state.
    pub const STATE_FILE: &str = "efs-broker-state.json";

    /// Process exclusivity lock.
    pub const LOCK_FILE: &str = ".lock";

    /// Log directory.
    pub const LOGS_DIR: &str = ".logs";
}

/// Environment variables understood by the driver.
pub mod envs {
    pub const MOUNT_DIR: &str = "EFSVOL_MOUNT_DIR";
    pub const AVAILABILITY_ZONE: &str = "EFSVOL_AVAILABILITY_ZONE";
}

/// Protocol-level values.
pub mod protocol {
    /// Capability scope reported to the volume manager.
    pub const SCOPE_LOCAL: &str = "local";

    /// Plugin interface advertised on activation.
    pub const IMPLEMENTS_VOLUME_DRIVER: &str = "VolumeDriver";

    pub const DEFAULT_MOUNT_DIR: &str = "/tmp/volumes";
}
