//! Configuration for the volume driver.

use std::path::PathBuf;
use std::time::Duration;

use efsvol_shared::constants::{envs, mount, protocol};
use serde::{Deserialize, Serialize};

/// Options used when opening a volume registry.
///
/// Every field has a default, so a partial JSON document (or
/// `DriverOptions::default()`) is enough to get a working driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverOptions {
    /// Root under which every volume is mounted at `<mount_dir>/<name>`.
    /// The state file and the process lock also live here.
    #[serde(default = "default_mount_dir")]
    pub mount_dir: PathBuf,

    /// Availability zone this host runs in.
    ///
    /// Looked up in a volume's availability-zone source map on mount;
    /// `None` means the map is never consulted.
    #[serde(default = "default_availability_zone")]
    pub availability_zone: Option<String>,

    /// Filesystem type passed to `mount -t`.
    #[serde(default = "default_fs_type")]
    pub fs_type: String,

    /// Option string passed to `mount -o`.
    #[serde(default = "default_mount_options")]
    pub mount_options: String,

    /// Deadline for a physical mount or unmount.
    #[serde(default = "default_mount_timeout", with = "duration_secs")]
    pub mount_timeout: Duration,

    /// Deadline for the diagnostic mount probe.
    #[serde(default = "default_check_timeout", with = "duration_secs")]
    pub check_timeout: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            mount_dir: default_mount_dir(),
            availability_zone: default_availability_zone(),
            fs_type: default_fs_type(),
            mount_options: default_mount_options(),
            mount_timeout: default_mount_timeout(),
            check_timeout: default_check_timeout(),
        }
    }
}

impl DriverOptions {
    /// Options rooted at `mount_dir`, everything else defaulted.
    pub fn with_mount_dir(mount_dir: impl Into<PathBuf>) -> Self {
        Self {
            mount_dir: mount_dir.into(),
            ..Default::default()
        }
    }
}

fn default_mount_dir() -> PathBuf {
    std::env::var(envs::MOUNT_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(protocol::DEFAULT_MOUNT_DIR))
}

fn default_availability_zone() -> Option<String> {
    std::env::var(envs::AVAILABILITY_ZONE)
        .ok()
        .filter(|az| !az.is_empty())
}

fn default_fs_type() -> String {
    mount::FS_TYPE.to_string()
}

fn default_mount_options() -> String {
    mount::MOUNT_OPTIONS.to_string()
}

fn default_mount_timeout() -> Duration {
    mount::MOUNT_TIMEOUT
}

fn default_check_timeout() -> Duration {
    mount::CHECK_TIMEOUT
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_fixed_mount_settings() {
        let options = DriverOptions::with_mount_dir("/srv/volumes");
        assert_eq!(options.mount_dir, PathBuf::from("/srv/volumes"));
        assert_eq!(options.fs_type, "nfs4");
        assert_eq!(
            options.mount_options,
            "vers=4.0,rsize=1048576,wsize=1048576,timeo=600,retrans=2,actimeo=0"
        );
        assert_eq!(options.mount_timeout, Duration::from_secs(60));
        assert_eq!(options.check_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let options: DriverOptions = serde_json::from_str(
            r#"{"mount_dir": "/var/vols", "availability_zone": "us-east-1a", "mount_timeout": 10}"#,
        )
        .unwrap();

        assert_eq!(options.mount_dir, PathBuf::from("/var/vols"));
        assert_eq!(options.availability_zone.as_deref(), Some("us-east-1a"));
        assert_eq!(options.mount_timeout, Duration::from_secs(10));
        assert_eq!(options.fs_type, "nfs4");
    }

    #[test]
    fn test_round_trips_timeouts_as_seconds() {
        let options = DriverOptions::with_mount_dir("/x");
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["check_timeout"], 5);
    }
}
