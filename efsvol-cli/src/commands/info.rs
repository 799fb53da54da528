use clap::Args;
use efsvol::VolumeDriver;
use efsvol::driver::VolumeRequest;

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Name of the volume
    pub name: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Name of the volume
    pub name: String,
}

pub async fn execute_path(args: PathArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    let response = driver.path(VolumeRequest::new(args.name)).await;
    super::check(response.err)?;
    println!("{}", response.mountpoint);
    Ok(())
}

/// Prints the full stored record, remote address and zone map included.
pub async fn execute_inspect(args: InspectArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    let record = driver.registry().get(&args.name).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
