#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub struct TestContext {
    pub cmd: Command,
    pub mount_dir: PathBuf,
    // Dropped after the test, taking the mount dir with it
    _temp_dir: TempDir,
}

impl TestContext {
    /// A fresh command against the same mount dir.
    pub fn new_cmd(&self) -> Command {
        command_for(&self.mount_dir)
    }

    pub fn create(&self, name: &str, ip: &str) {
        self.new_cmd()
            .args(["create", name, "--ip", ip])
            .assert()
            .success();
    }

    pub fn state_file(&self) -> PathBuf {
        self.mount_dir.join("efs-broker-state.json")
    }
}

fn command_for(mount_dir: &Path) -> Command {
    let bin_path = env!("CARGO_BIN_EXE_efsvol");
    let mut cmd = Command::new(bin_path);
    // You can override this with .timeout(Duration::from_secs(N))
    cmd.timeout(Duration::from_secs(30));
    cmd.env_remove("EFSVOL_AVAILABILITY_ZONE");
    cmd.arg("--mount-dir").arg(mount_dir);
    cmd
}

pub fn efsvol() -> TestContext {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mount_dir = temp_dir.path().join("volumes");

    TestContext {
        cmd: command_for(&mount_dir),
        mount_dir,
        _temp_dir: temp_dir,
    }
}
