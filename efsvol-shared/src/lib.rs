//! efsvol shared - types used by the driver library, its CLI and test helpers
//!
//! This crate contains the error type and the constants that must be
//! identical on every side of the driver: filesystem type, fixed mount
//! options, state file naming and the protocol messages callers match on.

pub mod constants;
pub mod errors;

pub use errors::{EfsvolError, EfsvolResult};
