//! Tracing setup for driver processes.

use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use super::layout::DriverLayout;

const LOG_FILE_PREFIX: &str = "efsvol.log";

/// Install a subscriber writing to `<root>/.logs/efsvol.log.<date>`.
///
/// Respects `RUST_LOG`, defaulting to `info`. With `echo_stderr` set, the
/// same events are also written to stderr. Keep the returned guard alive
/// for the life of the process or buffered lines are lost.
///
/// A subscriber that is already installed (e.g. by a test harness) is left
/// in place.
pub fn init_logging_for(layout: &DriverLayout, echo_stderr: bool) -> EfsvolResult<WorkerGuard> {
    let logs_dir = layout.logs_dir();
    std::fs::create_dir_all(&logs_dir).map_err(|e| {
        EfsvolError::Storage(format!(
            "failed to create logs dir {}: {}",
            logs_dir.display(),
            e
        ))
    })?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false);

    let stderr_layer = echo_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
