use clap::Args;
use efsvol::VolumeDriver;
use efsvol::driver::VolumeRequest;

#[derive(Args, Debug)]
pub struct MountArgs {
    /// Name of the volume(s) to mount
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UnmountArgs {
    /// Name of the volume(s) to unmount
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute_mount(args: MountArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    super::for_each_target(args.targets, "mount", |target| async move {
        let response = driver.mount(VolumeRequest::new(target)).await;
        super::check(response.err)?;
        Ok(response.mountpoint)
    })
    .await
}

pub async fn execute_unmount(args: UnmountArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    super::for_each_target(args.targets, "unmount", |target| async move {
        super::check(driver.unmount(VolumeRequest::new(target.clone())).await.err)?;
        Ok(target)
    })
    .await
}
