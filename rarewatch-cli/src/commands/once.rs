//! `rarewatch once` — a single update cycle.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;

use rarewatch_daemon::{once_blocking, Config, OnceMode, OnceOutcome};

use super::print_announcement;

#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Fetch and reconcile, but neither save nor announce.
    #[arg(long)]
    pub dry_run: bool,

    /// Write announcements to the log instead of the chat channel.
    #[arg(long)]
    pub log_only: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl OnceArgs {
    pub fn run(self) -> Result<()> {
        let config = Config::from_env().context("invalid configuration")?;
        let mode = if self.dry_run {
            OnceMode::DryRun
        } else {
            OnceMode::Commit
        };
        let outcome = once_blocking(config, mode, self.log_only).context("update cycle failed")?;

        match outcome {
            OnceOutcome::Preview(announcements) => {
                if self.json {
                    let payload = json!({ "dry_run": true, "announcements": announcements });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&payload)
                            .context("failed to serialize preview JSON")?
                    );
                    return Ok(());
                }
                if announcements.is_empty() {
                    println!("Nothing new to announce.");
                    return Ok(());
                }
                println!("{} pending announcement(s) (dry run):", announcements.len());
                for announcement in &announcements {
                    print_announcement(announcement);
                }
            }
            OnceOutcome::Cycle(report) => {
                if self.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report)
                            .context("failed to serialize cycle JSON")?
                    );
                    return Ok(());
                }
                println!(
                    "{} creations fetched | {} announced | {} failed",
                    report.fetched,
                    report.announced.to_string().green(),
                    report.failed_notifications.to_string().red(),
                );
            }
        }
        Ok(())
    }
}
