//! Foundry — per-project container provisioning CLI.
//!
//! # Usage
//!
//! ```text
//! foundry run [--workspace workspace.yaml] [--dry-run] [--output pipeline-output.json]
//! foundry status [--json]
//! ```
//!
//! Backend selection is environment-driven (see `settings`): a lock
//! directory enables the real lease lock, a state URL selects the HTTP
//! state store, and hub credentials are required for any non-dry run.

mod commands;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run::RunArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "foundry",
    version,
    about = "Provision per-project containers and sync template trees",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the provisioning pipeline for the configured project.
    Run(RunArgs),

    /// Show provisioned projects recorded in the state document.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
