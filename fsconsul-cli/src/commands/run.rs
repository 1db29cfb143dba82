//! `fsconsul run`: foreground sync engine.

use anyhow::{Context, Result};
use clap::Args;

use fsconsul_daemon::{start_blocking, LogFormat};

use super::ConfigArg;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Log output format.
    #[arg(long, value_name = "FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load()?;
        let report =
            start_blocking(config, self.log_format).context("sync engine exited with error")?;
        if !report.failed.is_empty() {
            eprintln!("{} mapping(s) failed:", report.failed.len());
            for failure in &report.failed {
                eprintln!("  {failure}");
            }
        }
        Ok(())
    }
}
