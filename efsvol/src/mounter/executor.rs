//! Builds mount/unmount command lines and runs them through an [`Invoker`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use efsvol_shared::constants::mount;
use efsvol_shared::errors::{EfsvolError, EfsvolResult};
use tokio_util::sync::CancellationToken;

use super::invoker::{InvokeContext, Invoker};
use crate::runtime::DriverOptions;

/// Executes physical mounts and unmounts.
///
/// Holds no per-volume state; the registry decides *whether* a physical
/// operation happens, the executor only decides *how*.
#[derive(Clone)]
pub struct MountExecutor {
    invoker: Arc<dyn Invoker>,
    fs_type: String,
    mount_options: String,
    availability_zone: Option<String>,
    mount_timeout: Duration,
    check_timeout: Duration,
    shutdown: CancellationToken,
}

impl MountExecutor {
    pub fn new(invoker: Arc<dyn Invoker>, options: &DriverOptions) -> Self {
        Self {
            invoker,
            fs_type: options.fs_type.clone(),
            mount_options: options.mount_options.clone(),
            availability_zone: options.availability_zone.clone(),
            mount_timeout: options.mount_timeout,
            check_timeout: options.check_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelling every in-flight command when triggered.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Pick the mount source: the zone-local entry from `az_map` when this
    /// host's zone has one, `source` otherwise.
    pub fn select_source<'a>(&self, source: &'a str, az_map: &'a BTreeMap<String, String>) -> &'a str {
        self.availability_zone
            .as_deref()
            .and_then(|az| az_map.get(az))
            .map(String::as_str)
            .unwrap_or(source)
    }

    /// Arguments for `mount`: `-t <fs> -o <options> <source> <target>`.
    pub fn mount_args(&self, source: &str, target: &Path) -> Vec<String> {
        vec![
            "-t".to_string(),
            self.fs_type.clone(),
            "-o".to_string(),
            self.mount_options.clone(),
            source.to_string(),
            target.to_string_lossy().into_owned(),
        ]
    }

    pub async fn mount(
        &self,
        source: &str,
        target: &Path,
        az_map: &BTreeMap<String, String>,
    ) -> EfsvolResult<()> {
        let source = self.select_source(source, az_map);
        let args = self.mount_args(source, target);

        tracing::info!(source, target = %target.display(), "Mounting export");

        let ctx = InvokeContext::child_of(&self.shutdown, self.mount_timeout);
        self.invoker
            .invoke(&ctx, mount::MOUNT_PROGRAM, &args)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!(source, target = %target.display(), error = %e, "mount failed");
                EfsvolError::Mount(e.to_string())
            })
    }

    pub async fn unmount(&self, target: &Path) -> EfsvolResult<()> {
        let args = vec![target.to_string_lossy().into_owned()];

        tracing::info!(target = %target.display(), "Unmounting export");

        let ctx = InvokeContext::child_of(&self.shutdown, self.mount_timeout);
        self.invoker
            .invoke(&ctx, mount::UNMOUNT_PROGRAM, &args)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!(target = %target.display(), error = %e, "umount failed");
                EfsvolError::Unmount(e.to_string())
            })
    }

    /// Best-effort probe: does `target` look like a live mount?
    ///
    /// Never fails; any error reads as "not mounted".
    pub async fn check(&self, target: &Path, source: &str) -> bool {
        let args = vec!["-q".to_string(), target.to_string_lossy().into_owned()];
        let ctx = InvokeContext::child_of(&self.shutdown, self.check_timeout);

        match self.invoker.invoke(&ctx, mount::CHECK_PROGRAM, &args).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(
                    target = %target.display(),
                    source,
                    error = %e,
                    "Mount check failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(Duration, String, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl Invoker for Recorder {
        async fn invoke(
            &self,
            ctx: &InvokeContext,
            program: &str,
            args: &[String],
        ) -> EfsvolResult<Vec<u8>> {
            self.calls
                .lock()
                .unwrap()
                .push((ctx.timeout, program.to_string(), args.to_vec()));
            if self.fail {
                Err(EfsvolError::Execution("exit status 32: access denied".into()))
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn executor(recorder: Arc<Recorder>, az: Option<&str>) -> MountExecutor {
        let mut options = DriverOptions::with_mount_dir("/tmp/volumes");
        options.fs_type = "my-fs".to_string();
        options.mount_options = "my-mount-options".to_string();
        options.availability_zone = az.map(str::to_string);
        MountExecutor::new(recorder, &options)
    }

    fn az_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_mount_uses_configured_type_and_options() {
        let recorder = Arc::new(Recorder::default());
        let executor = executor(recorder.clone(), Some("my-az"));

        executor
            .mount("source", Path::new("target"), &BTreeMap::new())
            .await
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        let (timeout, program, args) = &calls[0];
        assert_eq!(program, "mount");
        assert_eq!(
            args,
            &["-t", "my-fs", "-o", "my-mount-options", "source", "target"]
        );
        assert_eq!(*timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_mount_prefers_matching_az_source() {
        let recorder = Arc::new(Recorder::default());
        let executor = executor(recorder.clone(), Some("my-az"));
        let map = az_map(&[("my-az", "my-source"), ("other-az", "other-source")]);

        executor.mount("source", Path::new("target"), &map).await.unwrap();

        assert_eq!(recorder.calls.lock().unwrap()[0].2[4], "my-source");
    }

    #[tokio::test]
    async fn test_mount_falls_back_without_matching_az() {
        let recorder = Arc::new(Recorder::default());
        let executor = executor(recorder.clone(), Some("my-az"));
        let map = az_map(&[("not-my-az", "not-my-source"), ("other-az", "other-source")]);

        executor.mount("source", Path::new("target"), &map).await.unwrap();

        assert_eq!(recorder.calls.lock().unwrap()[0].2[4], "source");
    }

    #[tokio::test]
    async fn test_mount_ignores_map_without_host_zone() {
        let recorder = Arc::new(Recorder::default());
        let executor = executor(recorder.clone(), None);
        let map = az_map(&[("my-az", "my-source")]);

        executor.mount("source", Path::new("target"), &map).await.unwrap();

        assert_eq!(recorder.calls.lock().unwrap()[0].2[4], "source");
    }

    #[tokio::test]
    async fn test_mount_failure_carries_output() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let executor = executor(recorder, None);

        let err = executor
            .mount("source", Path::new("target"), &BTreeMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EfsvolError::Mount(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[tokio::test]
    async fn test_unmount_args() {
        let recorder = Arc::new(Recorder::default());
        let executor = executor(recorder.clone(), None);

        executor.unmount(Path::new("target")).await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].1, "umount");
        assert_eq!(calls[0].2, vec!["target".to_string()]);
    }

    #[tokio::test]
    async fn test_unmount_failure() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let executor = executor(recorder, None);

        let err = executor.unmount(Path::new("target")).await.unwrap_err();
        assert!(matches!(err, EfsvolError::Unmount(_)));
    }

    #[tokio::test]
    async fn test_check_uses_short_timeout() {
        let recorder = Arc::new(Recorder::default());
        let executor = executor(recorder.clone(), None);

        assert!(executor.check(Path::new("target"), "source").await);

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].0, Duration::from_secs(5));
        assert_eq!(calls[0].1, "mountpoint");
    }

    #[tokio::test]
    async fn test_check_reports_failure_as_false() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let executor = executor(recorder, None);

        assert!(!executor.check(Path::new("target"), "source").await);
    }
}
