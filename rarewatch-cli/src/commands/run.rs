//! `rarewatch run` — the polling daemon in the foreground.

use anyhow::{Context, Result};
use clap::Args;

use rarewatch_daemon::{start_blocking, Config};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Write announcements to the log instead of the chat channel.
    #[arg(long)]
    pub log_only: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = Config::from_env().context("invalid configuration")?;
        start_blocking(config, self.log_only).context("daemon exited with error")
    }
}
