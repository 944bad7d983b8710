pub mod check;
pub mod diff;
pub mod once;
pub mod run;
pub mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use rarewatch_core::SnapshotStore;
use rarewatch_daemon::config::{load_dotenv, resolve_state_path};
use rarewatch_notify::Announcement;

/// `--state` if given, else the configured/default snapshot file.
pub(crate) fn state_store(state: Option<PathBuf>) -> Result<SnapshotStore> {
    let path = match state {
        Some(path) => path,
        None => {
            load_dotenv();
            resolve_state_path(|key| std::env::var(key).ok())
                .context("could not determine snapshot location")?
        }
    };
    Ok(SnapshotStore::new(path))
}

pub(crate) fn print_announcement(announcement: &Announcement) {
    println!(
        "{} {} {}",
        "+".green().bold(),
        announcement.creation_name.bold(),
        announcement.description,
    );
    println!("    {}", announcement.creation_url.bright_black());
    if let Some(url) = &announcement.transaction_url {
        println!("    {}", url.bright_black());
    }
}
