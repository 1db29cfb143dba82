//! `fsconsul purge`: administrative tree delete.

use anyhow::{Context, Result};
use clap::Args;

use fsconsul_core::KeyPrefix;
use fsconsul_daemon::{init_tracing, LogFormat};
use fsconsul_store::{ConsulStore, KvStore};

use super::ConfigArg;

#[derive(Args, Debug)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Key prefix whose whole subtree is removed.
    #[arg(long)]
    pub prefix: String,
}

impl PurgeArgs {
    pub fn run(self) -> Result<()> {
        init_tracing(LogFormat::Text);
        let config = self.config.load()?;
        let prefix = KeyPrefix::parse(&self.prefix).context("invalid --prefix")?;
        let store = ConsulStore::new(config.connection).context("invalid store connection")?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        runtime
            .block_on(store.delete_tree(prefix.as_str()))
            .with_context(|| format!("failed to delete keys under '{prefix}'"))?;

        println!("deleted keys under '{prefix}'");
        Ok(())
    }
}
