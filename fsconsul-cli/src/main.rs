//! fsconsul: mirror Consul KV subtrees onto the local filesystem.
//!
//! # Usage
//!
//! ```text
//! fsconsul run [--config <path>] [--log-format text|json]
//! fsconsul check [--config <path>] [--json]
//! fsconsul purge --prefix <prefix> [--config <path>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, purge::PurgeArgs, run::RunArgs};

#[derive(Parser, Debug)]
#[command(
    name = "fsconsul",
    version,
    about = "Mirror Consul key/value prefixes into local directories",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch every configured mapping until interrupted.
    Run(RunArgs),

    /// Validate the config and print the normalized mappings.
    Check(CheckArgs),

    /// Delete every key under a prefix in the configured store.
    Purge(PurgeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Purge(args) => args.run(),
    }
}
