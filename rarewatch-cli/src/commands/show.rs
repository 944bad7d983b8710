//! `rarewatch show` — inspect the stored snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use rarewatch_core::Creation;

use super::state_store;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Snapshot file to read (defaults to the configured state file).
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Emit the stored document as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct CreationRow {
    #[tabled(rename = "creation")]
    name: String,
    #[tabled(rename = "actions")]
    actions: usize,
    #[tabled(rename = "last action")]
    last_action: String,
    #[tabled(rename = "image")]
    image: String,
}

impl ShowArgs {
    pub fn run(self) -> Result<()> {
        let store = state_store(self.state)?;
        if !store.path().exists() {
            println!("No snapshot stored at {}.", store.path().display());
            return Ok(());
        }

        let document = store
            .load_document()
            .with_context(|| format!("failed to read {}", store.path().display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&document)
                    .context("failed to serialize snapshot JSON")?
            );
            return Ok(());
        }

        println!(
            "rarewatch v{} | {} creations | {} actions | saved {}",
            env!("CARGO_PKG_VERSION"),
            document.creations.len(),
            document.creations.action_count(),
            format_saved_at(document.saved_at),
        );
        if document.creations.is_empty() {
            println!("Snapshot is empty.");
            return Ok(());
        }

        let rows: Vec<CreationRow> = document.creations.iter().map(row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn row(creation: &Creation) -> CreationRow {
    CreationRow {
        name: creation.name.clone(),
        actions: creation.actions.len(),
        last_action: creation
            .last_action()
            .map(|action| action.description.clone())
            .unwrap_or_else(|| "-".to_string()),
        image: if creation.image_url().is_some() {
            "yes".green().to_string()
        } else {
            "missing".yellow().to_string()
        },
    }
}

fn format_saved_at(saved_at: Option<DateTime<Utc>>) -> String {
    let Some(saved_at) = saved_at else {
        return "at an unknown time".to_string();
    };
    let age = Utc::now().signed_duration_since(saved_at);
    let ago = if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m ago", age.num_minutes())
    } else {
        "just now".to_string()
    };
    format!("{} ({ago})", saved_at.to_rfc3339())
}
