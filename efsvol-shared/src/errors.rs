//! Error types for the volume driver.
//!
//! Every variant renders to the exact string handed back to protocol
//! callers, so `Display` output is part of the wire contract.

use thiserror::Error;

pub type EfsvolResult<T> = Result<T, EfsvolError>;

#[derive(Error, Debug)]
pub enum EfsvolError {
    /// A required request field is missing or malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// The volume is unknown, or has never been mounted.
    #[error("{0}")]
    NotFound(String),

    /// The external mount command failed.
    #[error("{0}")]
    Mount(String),

    /// The external unmount command, or cleanup after it, failed.
    #[error("{0}")]
    Unmount(String),

    /// Host state disagrees with the registry (e.g. the mount path vanished).
    #[error("{0}")]
    Inconsistent(String),

    /// Persistence or local filesystem failure.
    #[error("{0}")]
    Storage(String),

    /// The invoker could not run a command to completion.
    #[error("{0}")]
    Execution(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EfsvolError {
    pub fn missing_volume_name() -> Self {
        EfsvolError::InvalidArgument("Missing mandatory 'volume_name'".to_string())
    }

    pub fn missing_ip() -> Self {
        EfsvolError::InvalidArgument("Missing mandatory 'ip' field in 'Opts'".to_string())
    }

    pub fn volume_not_found(name: &str) -> Self {
        EfsvolError::NotFound(format!("Volume '{}' not found", name))
    }

    pub fn not_created(name: &str) -> Self {
        EfsvolError::NotFound(format!(
            "Volume '{}' must be created before being mounted",
            name
        ))
    }

    pub fn not_mounted() -> Self {
        EfsvolError::NotFound("Volume not previously mounted".to_string())
    }
}

impl From<serde_json::Error> for EfsvolError {
    fn from(err: serde_json::Error) -> Self {
        EfsvolError::Storage(format!("invalid state encoding: {}", err))
    }
}
