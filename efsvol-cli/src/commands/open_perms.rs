use clap::Args;
use efsvol::driver::{OpenPermsOpts, OpenPermsRequest};
use efsvol::{VolTools, VolumeDriver};

#[derive(Args, Debug)]
pub struct OpenPermsArgs {
    /// Name used for the temporary mount path
    pub name: String,

    /// Address of the NFS server exporting the volume
    #[arg(long)]
    pub ip: String,
}

pub async fn execute(args: OpenPermsArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    let tools = VolTools::new(driver.registry().clone());
    let request = OpenPermsRequest {
        name: args.name.clone(),
        opts: OpenPermsOpts { ip: Some(args.ip) },
    };

    super::check(tools.open_perms(request).await.err)?;
    println!("{}", args.name);
    Ok(())
}
