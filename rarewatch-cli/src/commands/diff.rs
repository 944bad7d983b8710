//! `rarewatch diff <snapshot>` — what a snapshot file would announce.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;

use rarewatch_core::SnapshotStore;
use rarewatch_notify::Announcement;
use rarewatch_sync::{reconcile_with, DiffStrategy};

use super::{print_announcement, state_store};

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Snapshot JSON to compare (bare creation array or stored document).
    pub snapshot: PathBuf,

    /// Snapshot to compare against (defaults to the configured state file).
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// How new actions are told apart from known ones.
    #[arg(long, default_value_t = DiffStrategy::Positional)]
    pub strategy: DiffStrategy,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        if !self.snapshot.exists() {
            bail!("snapshot file {} does not exist", self.snapshot.display());
        }
        let fresh = SnapshotStore::new(&self.snapshot)
            .load()
            .with_context(|| format!("failed to read {}", self.snapshot.display()))?;

        let store = state_store(self.state)?;
        let previous = store
            .load()
            .with_context(|| format!("failed to read {}", store.path().display()))?;

        let reconciliation = reconcile_with(&previous, &fresh, self.strategy);
        let announcements: Vec<Announcement> = reconciliation
            .actions
            .iter()
            .map(|new| Announcement::new(new.creation, new.action))
            .collect();

        if self.json {
            let payload = json!({
                "strategy": self.strategy,
                "summary": reconciliation.summary,
                "announcements": announcements,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize diff JSON")?
            );
            return Ok(());
        }

        if announcements.is_empty() {
            println!("No new actions.");
        } else {
            for announcement in &announcements {
                print_announcement(announcement);
            }
        }

        let summary = &reconciliation.summary;
        println!(
            "{} new action(s) | {} new creation(s) | {} grown | {} shrunk | {} dropped",
            summary.new_actions, summary.unseen, summary.grown, summary.shrunk, summary.dropped,
        );
        Ok(())
    }
}
