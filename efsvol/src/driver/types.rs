//! Wire types of the volume plugin protocol.
//!
//! Field names match the plugin protocol (`Name`, `Opts`, `Mountpoint`,
//! `Err`, ...). Every response carries either its payload or a non-empty
//! `Err`, never both.

use std::collections::BTreeMap;
use std::path::Path;

use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::volumes::VolumeInfo;

/// Decode a request body, rejecting missing or mistyped fields up front.
pub fn decode_request<T: DeserializeOwned>(body: &[u8]) -> EfsvolResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| EfsvolError::InvalidArgument(format!("Malformed request: {}", e)))
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOpts {
    /// Remote address of the export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Availability zone → alternate mount source.
    #[serde(rename = "az-map", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub az_map: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Opts", default)]
    pub opts: CreateOpts,
}

/// Request naming a single volume (mount, unmount, path, remove, get).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRequest {
    #[serde(rename = "Name", default)]
    pub name: String,
}

impl VolumeRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

pub type MountRequest = VolumeRequest;
pub type UnmountRequest = VolumeRequest;
pub type PathRequest = VolumeRequest;
pub type RemoveRequest = VolumeRequest;
pub type GetRequest = VolumeRequest;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPermsOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Administrative request: open a volume's root directory to everyone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPermsRequest {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Opts", default)]
    pub opts: OpenPermsOpts,
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Err", default)]
    pub err: String,
}

impl ErrorResponse {
    pub fn from_result(result: EfsvolResult<()>) -> Self {
        match result {
            Ok(()) => Self::default(),
            Err(e) => Self { err: e.to_string() },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_empty()
    }
}

/// Response to Mount and Path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountResponse {
    #[serde(rename = "Mountpoint", default)]
    pub mountpoint: String,
    #[serde(rename = "Err", default)]
    pub err: String,
}

impl MountResponse {
    pub fn from_result<P: AsRef<Path>>(result: EfsvolResult<P>) -> Self {
        match result {
            Ok(path) => Self {
                mountpoint: path.as_ref().to_string_lossy().into_owned(),
                err: String::new(),
            },
            Err(e) => Self {
                mountpoint: String::new(),
                err: e.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_empty()
    }
}

pub type PathResponse = MountResponse;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(rename = "Volume", default)]
    pub volume: VolumeInfo,
    #[serde(rename = "Err", default)]
    pub err: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(rename = "Volumes", default)]
    pub volumes: Vec<VolumeInfo>,
    #[serde(rename = "Err", default)]
    pub err: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityInfo {
    #[serde(rename = "Scope")]
    pub scope: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    #[serde(rename = "Capabilities")]
    pub capabilities: CapabilityInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateResponse {
    #[serde(rename = "Implements")]
    pub implements: Vec<String>,
}
