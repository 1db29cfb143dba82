pub mod check;
pub mod purge;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use fsconsul_core::{config, WatchConfig};

/// `--config` shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConfigArg {
    /// Config file (JSON, or YAML for .yaml/.yml). Defaults to
    /// `<config dir>/fsconsul/config.json`.
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConfigArg {
    pub fn load(&self) -> Result<WatchConfig> {
        match &self.config {
            Some(path) => load_from(path),
            None => config::load_config().context("failed to load the default config"),
        }
    }
}

fn load_from(path: &Path) -> Result<WatchConfig> {
    config::load_config_at(path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}
