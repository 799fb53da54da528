//! Volume record and its on-disk encoding.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use efsvol_shared::constants::mount;
use serde::{Deserialize, Serialize};

/// One logical volume.
///
/// Invariant: `mount_count > 0` exactly when `mount_path` is set. The
/// physical mount exists on the host iff `mount_count > 0`.
///
/// Field names follow the state file format (`Name`, `Ip`, `Mountpoint`,
/// `MountCount`), where an unmounted volume stores an empty `Mountpoint`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    #[serde(rename = "Name")]
    pub name: String,

    /// Remote address the export is mounted from; immutable after create.
    #[serde(rename = "Ip")]
    pub remote_address: String,

    #[serde(rename = "Mountpoint", default, with = "empty_path")]
    pub mount_path: Option<PathBuf>,

    #[serde(rename = "MountCount", default)]
    pub mount_count: u32,

    /// Zone → alternate source overrides.
    #[serde(
        rename = "AzMap",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub az_map: BTreeMap<String, String>,
}

impl VolumeRecord {
    pub fn new(name: String, remote_address: String, az_map: BTreeMap<String, String>) -> Self {
        Self {
            name,
            remote_address,
            mount_path: None,
            mount_count: 0,
            az_map,
        }
    }

    /// Mount source for the remote address, e.g. `10.0.0.1:/`.
    pub fn source(&self) -> String {
        export_source(&self.remote_address)
    }

    pub fn is_mounted(&self) -> bool {
        self.mount_count > 0
    }

    /// Whether the record satisfies the count/path invariant.
    pub fn is_consistent(&self) -> bool {
        (self.mount_count > 0) == self.mount_path.is_some()
    }

    /// Record one more logical mount at `path`.
    pub(crate) fn mark_mounted(&mut self, path: &Path) {
        self.mount_path = Some(path.to_path_buf());
        self.mount_count += 1;
    }

    /// Drop one logical mount; clears the path on the last one.
    pub(crate) fn mark_unmounted(&mut self) {
        self.mount_count = self.mount_count.saturating_sub(1);
        if self.mount_count == 0 {
            self.mount_path = None;
        }
    }

    /// Drop every logical mount at once.
    pub(crate) fn release_all(&mut self) {
        self.mount_count = 0;
        self.mount_path = None;
    }

    /// Public projection handed to protocol callers.
    pub fn to_info(&self) -> VolumeInfo {
        VolumeInfo {
            name: self.name.clone(),
            mount_path: self.mount_path.clone(),
            mount_count: self.mount_count,
        }
    }
}

/// Root export of `remote_address`.
pub fn export_source(remote_address: &str) -> String {
    format!("{}{}", remote_address, mount::EXPORT_ROOT_SUFFIX)
}

/// Public fields of a volume.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Mountpoint", default, with = "empty_path")]
    pub mount_path: Option<PathBuf>,

    #[serde(rename = "MountCount", default)]
    pub mount_count: u32,
}

/// `None` ⇔ `""` on the wire.
mod empty_path {
    use std::path::PathBuf;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(path) => serializer.serialize_str(&path.to_string_lossy()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|s| !s.is_empty()).map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> VolumeRecord {
        VolumeRecord::new("v1".into(), "10.0.0.1".into(), BTreeMap::new())
    }

    #[test]
    fn test_source_appends_export_root() {
        assert_eq!(record().source(), "10.0.0.1:/");
    }

    #[test]
    fn test_mount_bookkeeping() {
        let mut vol = record();
        assert!(vol.is_consistent());

        vol.mark_mounted(Path::new("/tmp/volumes/v1"));
        vol.mark_mounted(Path::new("/tmp/volumes/v1"));
        assert_eq!(vol.mount_count, 2);
        assert!(vol.is_consistent());

        vol.mark_unmounted();
        assert_eq!(vol.mount_count, 1);
        assert_eq!(vol.mount_path, Some(PathBuf::from("/tmp/volumes/v1")));

        vol.mark_unmounted();
        assert_eq!(vol.mount_count, 0);
        assert_eq!(vol.mount_path, None);
        assert!(vol.is_consistent());
    }

    #[test]
    fn test_release_all() {
        let mut vol = record();
        vol.mark_mounted(Path::new("/tmp/volumes/v1"));
        vol.mark_mounted(Path::new("/tmp/volumes/v1"));

        vol.release_all();
        assert_eq!(vol.mount_count, 0);
        assert_eq!(vol.mount_path, None);
        assert!(vol.is_consistent());
    }

    #[test]
    fn test_state_file_field_names() {
        let mut vol = record();
        vol.mark_mounted(Path::new("/tmp/volumes/v1"));

        let value = serde_json::to_value(&vol).unwrap();
        assert_eq!(
            value,
            json!({
                "Name": "v1",
                "Ip": "10.0.0.1",
                "Mountpoint": "/tmp/volumes/v1",
                "MountCount": 1
            })
        );
    }

    #[test]
    fn test_unmounted_encodes_empty_mountpoint() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["Mountpoint"], "");
        assert!(value.get("AzMap").is_none());
    }

    #[test]
    fn test_decodes_minimal_record() {
        let vol: VolumeRecord =
            serde_json::from_value(json!({"Name": "v1", "Ip": "10.0.0.1", "Mountpoint": ""}))
                .unwrap();
        assert_eq!(vol, record());
    }

    #[test]
    fn test_az_map_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("us-east-1a".to_string(), "fs-a.efs".to_string());
        let vol = VolumeRecord::new("v1".into(), "10.0.0.1".into(), map.clone());

        let decoded: VolumeRecord =
            serde_json::from_str(&serde_json::to_string(&vol).unwrap()).unwrap();
        assert_eq!(decoded.az_map, map);
    }
}
