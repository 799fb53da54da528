use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use efsvol::{DriverLayout, DriverOptions, ProcessInvoker, VolumeDriver, VolumeRegistry};
use tracing_appender::non_blocking::WorkerGuard;

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalFlags {
    /// Root directory for volume mounts and driver state
    #[arg(long, global = true, env = "EFSVOL_MOUNT_DIR")]
    pub mount_dir: Option<PathBuf>,

    /// Availability zone of this host, used to pick a zone-local mount source
    #[arg(long, global = true, env = "EFSVOL_AVAILABILITY_ZONE")]
    pub availability_zone: Option<String>,

    /// Also write logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// An open driver plus the log writer that must outlive it.
pub struct Session {
    pub driver: VolumeDriver,
    _log_guard: WorkerGuard,
}

impl GlobalFlags {
    pub fn driver_options(&self) -> DriverOptions {
        let mut options = DriverOptions::default();
        if let Some(dir) = &self.mount_dir {
            options.mount_dir = dir.clone();
        }
        if let Some(az) = self.availability_zone.as_ref().filter(|az| !az.is_empty()) {
            options.availability_zone = Some(az.clone());
        }
        options
    }

    /// Open the registry under the configured mount dir.
    ///
    /// Logging is initialized first so registry restore is captured too.
    pub async fn open(&self) -> anyhow::Result<Session> {
        let options = self.driver_options();

        let layout = DriverLayout::new(&options.mount_dir)?;
        layout.prepare()?;
        let log_guard = efsvol::init_logging_for(&layout, self.verbose)?;

        let registry = VolumeRegistry::open(&options, Arc::new(ProcessInvoker::new())).await?;

        Ok(Session {
            driver: VolumeDriver::new(registry),
            _log_guard: log_guard,
        })
    }
}
