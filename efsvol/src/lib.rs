//! efsvol - reference-counted NFS/EFS volume driver.
//!
//! Tracks which volumes exist, how many consumers hold each one mounted
//! and where, and delegates the actual `mount`/`umount` calls to an
//! [`Invoker`](mounter::Invoker).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use efsvol::{DriverOptions, ProcessInvoker, VolumeDriver, VolumeRegistry};
//! use efsvol::driver::{CreateOpts, CreateRequest, VolumeRequest};
//!
//! # async fn run() -> efsvol::EfsvolResult<()> {
//! let options = DriverOptions::with_mount_dir("/var/vcap/data/volumes/efs");
//! let registry = VolumeRegistry::open(&options, Arc::new(ProcessInvoker::new())).await?;
//! let driver = VolumeDriver::new(registry);
//!
//! driver
//!     .create(CreateRequest {
//!         name: "v1".into(),
//!         opts: CreateOpts { ip: Some("10.0.0.1".into()), ..Default::default() },
//!     })
//!     .await;
//! let mounted = driver.mount(VolumeRequest::new("v1")).await;
//! println!("{}", mounted.mountpoint);
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod driver;
pub mod mounter;
pub mod runtime;
pub mod util;
pub mod volumes;

pub use admin::VolTools;
pub use driver::VolumeDriver;
pub use efsvol_shared::{EfsvolError, EfsvolResult};
pub use mounter::{InvokeContext, Invoker, MountExecutor, ProcessInvoker};
pub use runtime::{DriverLayout, DriverOptions, init_logging_for};
pub use volumes::{VolumeInfo, VolumeRecord, VolumeRegistry};
