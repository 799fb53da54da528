//! `efsvol` command-line interface.
//!
//! Drives the volume registry directly: every invocation opens the state
//! under `--mount-dir`, performs one command, and persists before exiting.

mod cli;
mod commands;

use clap::{Parser, Subcommand};

use crate::cli::GlobalFlags;
use crate::commands::{create, info, list, mount, open_perms, plugin, rm};

#[derive(Parser, Debug)]
#[command(name = "efsvol", version, about = "Reference-counted NFS/EFS volume driver")]
struct Cli {
    #[command(flatten)]
    global: GlobalFlags,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a volume backed by a remote export
    Create(create::CreateArgs),
    /// Take a mount reference, mounting on the first one
    Mount(mount::MountArgs),
    /// Release a mount reference, unmounting on the last one
    Unmount(mount::UnmountArgs),
    /// Remove volumes, unmounting them first if needed
    Rm(rm::RmArgs),
    /// Print the mount path of a mounted volume
    Path(info::PathArgs),
    /// Print the stored record of a volume
    Inspect(info::InspectArgs),
    /// List volumes
    #[command(alias = "list")]
    Ls(list::ListArgs),
    /// Print the driver's capabilities
    Capabilities,
    /// Print the plugin interfaces the driver implements
    Activate,
    /// Make a remote export's root world-writable
    OpenPerms(open_perms::OpenPermsArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let session = cli.global.open().await?;

    // Ctrl-C cancels an in-flight mount command instead of leaving it hung.
    let registry = session.driver.registry().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted");
            registry.shutdown();
        }
    });

    let driver = &session.driver;
    match cli.command {
        Command::Create(args) => create::execute(args, driver).await,
        Command::Mount(args) => mount::execute_mount(args, driver).await,
        Command::Unmount(args) => mount::execute_unmount(args, driver).await,
        Command::Rm(args) => rm::execute(args, driver).await,
        Command::Path(args) => info::execute_path(args, driver).await,
        Command::Inspect(args) => info::execute_inspect(args, driver).await,
        Command::Ls(args) => list::execute(args, driver).await,
        Command::Capabilities => plugin::execute_capabilities(driver),
        Command::Activate => plugin::execute_activate(driver),
        Command::OpenPerms(args) => open_perms::execute(args, driver).await,
    }
}
