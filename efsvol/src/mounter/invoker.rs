//! Seam between the driver and the operating system's mount tooling.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Execution bounds for a single invocation.
#[derive(Clone, Debug)]
pub struct InvokeContext {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl InvokeContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Same timeout, cancelled together with `parent`.
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: parent.child_token(),
        }
    }
}

/// Runs an external command.
///
/// Implementations must honour `ctx.timeout` and `ctx.cancel`. On success
/// the combined output is returned; any failure (spawn error, non-zero
/// exit, timeout, cancellation) is an error whose message carries that
/// output for diagnostics.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, ctx: &InvokeContext, program: &str, args: &[String])
    -> EfsvolResult<Vec<u8>>;
}

/// [`Invoker`] backed by real child processes.
#[derive(Clone, Debug, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(
        &self,
        ctx: &InvokeContext,
        program: &str,
        args: &[String],
    ) -> EfsvolResult<Vec<u8>> {
        tracing::debug!(program, ?args, timeout = ?ctx.timeout, "Invoking command");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EfsvolError::Execution(format!("failed to run {}: {}", program, e)))?;

        // Dropping the wait future kills the child (kill_on_drop).
        let output = tokio::select! {
            result = tokio::time::timeout(ctx.timeout, child.wait_with_output()) => match result {
                Ok(output) => output.map_err(|e| {
                    EfsvolError::Execution(format!("failed to wait for {}: {}", program, e))
                })?,
                Err(_) => {
                    return Err(EfsvolError::Execution(format!(
                        "{} timed out after {:?}",
                        program, ctx.timeout
                    )));
                }
            },
            _ = ctx.cancel.cancelled() => {
                return Err(EfsvolError::Execution(format!("{} cancelled", program)));
            }
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if !output.status.success() {
            return Err(EfsvolError::Execution(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&combined).trim()
            )));
        }

        Ok(combined)
    }
}
