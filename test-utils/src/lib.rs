//! Shared fixtures for efsvol integration tests.
//!
//! [`FakeInvoker`] stands in for the host's `mount`/`umount`/`mountpoint`
//! binaries: it records every call and fails on demand. [`TestRegistry`]
//! opens a registry over a throwaway mount dir wired to that invoker.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use efsvol::mounter::{InvokeContext, Invoker};
use efsvol::runtime::DriverOptions;
use efsvol::volumes::VolumeRegistry;
use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use parking_lot::Mutex;
use tempfile::TempDir;

// ============================================================================
// FAKE INVOKER
// ============================================================================

/// One recorded command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

#[derive(Default)]
pub struct FakeInvoker {
    calls: Mutex<Vec<Invocation>>,
    failures: Mutex<HashMap<String, String>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every later call to `program` fail with `message`.
    pub fn fail(&self, program: &str, message: &str) {
        self.failures
            .lock()
            .insert(program.to_string(), message.to_string());
    }

    pub fn succeed(&self, program: &str) {
        self.failures.lock().remove(program);
    }

    /// Sleep before answering, so concurrent callers overlap.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls_for(program).len()
    }

    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl Invoker for FakeInvoker {
    async fn invoke(
        &self,
        ctx: &InvokeContext,
        program: &str,
        args: &[String],
    ) -> EfsvolResult<Vec<u8>> {
        self.calls.lock().push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
            timeout: ctx.timeout,
        });

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = ctx.cancel.cancelled() => {
                    return Err(EfsvolError::Execution(format!("{} cancelled", program)));
                }
            }
        }

        let failure = self.failures.lock().get(program).cloned();
        match failure {
            Some(message) => Err(EfsvolError::Execution(message)),
            None => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// REGISTRY FIXTURE
// ============================================================================

/// Registry over an isolated mount dir, cleaned up on drop.
pub struct TestRegistry {
    pub registry: VolumeRegistry,
    pub invoker: Arc<FakeInvoker>,
    pub options: DriverOptions,
    temp_dir: TempDir,
}

impl TestRegistry {
    pub async fn new() -> Self {
        Self::with_invoker(FakeInvoker::new()).await
    }

    pub async fn with_invoker(invoker: Arc<FakeInvoker>) -> Self {
        Self::configured(invoker, |_| {}).await
    }

    /// Like [`TestRegistry::with_invoker`], with a hook to adjust options
    /// before the registry opens.
    pub async fn configured(
        invoker: Arc<FakeInvoker>,
        configure: impl FnOnce(&mut DriverOptions),
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut options = DriverOptions::with_mount_dir(temp_dir.path().join("volumes"));
        configure(&mut options);
        let registry = VolumeRegistry::open(&options, invoker.clone())
            .await
            .expect("Failed to open registry");
        Self {
            registry,
            invoker,
            options,
            temp_dir,
        }
    }

    /// Drop the registry and open a fresh one over the same mount dir.
    pub async fn restart(self) -> Self {
        let Self {
            registry,
            invoker,
            options,
            temp_dir,
        } = self;
        drop(registry);

        let registry = VolumeRegistry::open(&options, invoker.clone())
            .await
            .expect("Failed to reopen registry");
        Self {
            registry,
            invoker,
            options,
            temp_dir,
        }
    }

    pub fn mount_dir(&self) -> &Path {
        self.registry.layout().root()
    }

    pub fn mount_path(&self, name: &str) -> PathBuf {
        self.registry.layout().mount_path(name)
    }

    pub fn state_file(&self) -> PathBuf {
        self.registry.layout().state_file()
    }

    /// Make every later state file write fail.
    ///
    /// Puts a non-empty directory where the state file goes, so the atomic
    /// rename over it is refused.
    pub fn block_state_writes(&self) {
        let state_file = self.state_file();
        match std::fs::remove_file(&state_file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => panic!("Failed to remove state file: {e}"),
        }
        std::fs::create_dir(&state_file).expect("Failed to create blocking dir");
        std::fs::write(state_file.join("blocker"), b"").expect("Failed to fill blocking dir");
    }

    /// Undo [`TestRegistry::block_state_writes`].
    pub fn unblock_state_writes(&self) {
        std::fs::remove_dir_all(self.state_file()).expect("Failed to remove blocking dir");
    }

    /// Parsed state file, or `None` if it was never written.
    pub fn state_json(&self) -> Option<serde_json::Value> {
        let bytes = std::fs::read(self.state_file()).ok()?;
        Some(serde_json::from_slice(&bytes).expect("State file is not valid JSON"))
    }
}
