use clap::Args;
use efsvol::VolumeDriver;
use efsvol::driver::VolumeRequest;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Remove every volume
    #[arg(short, long, conflicts_with = "targets")]
    pub all: bool,

    /// Name of the volume(s) to remove
    #[arg(required_unless_present = "all", num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: RmArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    let targets = if args.all {
        driver.list().await.volumes.into_iter().map(|v| v.name).collect()
    } else {
        args.targets
    };

    super::for_each_target(targets, "remove", |target| async move {
        super::check(driver.remove(VolumeRequest::new(target.clone())).await.err)?;
        Ok(target)
    })
    .await
}
