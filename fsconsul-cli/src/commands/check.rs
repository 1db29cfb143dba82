//! `fsconsul check`: validate a config without touching the store.

use anyhow::{Context, Result};
use clap::Args;

use super::ConfigArg;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Emit the normalized config as JSON. The token is never printed.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;

        if self.json {
            let rendered =
                serde_json::to_string_pretty(&config).context("failed to serialize config")?;
            println!("{rendered}");
            return Ok(());
        }

        let connection = &config.connection;
        let dc = if connection.datacenter.is_empty() {
            "<agent default>"
        } else {
            connection.datacenter.as_str()
        };
        println!("store: {} (dc: {dc})", connection.address);
        for mapping in &config.mappings {
            match mapping.on_change_command() {
                Some(command) => println!("  {mapping}  [onchange: {command}]"),
                None => println!("  {mapping}"),
            }
        }
        println!("{} mapping(s) OK", config.mappings.len());
        Ok(())
    }
}
