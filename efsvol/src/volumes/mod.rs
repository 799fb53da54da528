//! Volume lifecycle management.
//!
//! # Overview
//!
//! - **VolumeRegistry**: the create/mount/unmount/remove state machine
//! - **VolumeRecord**: one volume, its remote address and mount count
//! - **StateStore**: the JSON state file the registry is restored from
//!
//! Per volume:
//!
//! ```text
//! absent --create--> created(0) --mount--> mounted(1) --mount--> mounted(N+1)
//!                        ^                    |                      |
//!                        +------unmount-------+       unmount -> mounted(N-1)
//! created(0) | mounted(N) --remove--> absent   (forces one physical unmount)
//! ```
//!
//! Only the `0 → 1` and `1 → 0` transitions touch the host.

mod record;
mod registry;
mod store;

pub use record::{VolumeInfo, VolumeRecord, export_source};
pub use registry::VolumeRegistry;
pub use store::{StateStore, VolumeMap};
