use clap::{Args, ValueEnum};
use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};
use efsvol::VolumeDriver;
use efsvol::volumes::VolumeInfo;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only print volume names
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

pub async fn execute(args: ListArgs, driver: &VolumeDriver) -> anyhow::Result<()> {
    let response = driver.list().await;
    super::check(response.err)?;

    if args.quiet {
        for volume in &response.volumes {
            println!("{}", volume.name);
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response.volumes)?),
        OutputFormat::Table => println!("{}", render_table(&response.volumes)),
    }
    Ok(())
}

fn render_table(volumes: &[VolumeInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec!["NAME", "MOUNTPOINT", "MOUNTS"]);

    for volume in volumes {
        let mountpoint = volume
            .mount_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            volume.name.clone(),
            mountpoint,
            volume.mount_count.to_string(),
        ]);
    }
    table
}
