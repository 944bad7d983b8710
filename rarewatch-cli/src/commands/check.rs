//! `rarewatch check` — validate configuration without starting anything.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use rarewatch_daemon::Config;

#[derive(Args, Debug)]
pub struct CheckArgs {}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "setting")]
    name: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let config = Config::from_env().context("invalid configuration")?;

        let document = config
            .store()
            .load_document()
            .with_context(|| format!("state file {} is unreadable", config.state_path.display()))?;
        let state = if document.creations.is_empty() && document.saved_at.is_none() {
            "no snapshot yet".to_string()
        } else {
            format!(
                "{} creations, {} actions",
                document.creations.len(),
                document.creations.action_count()
            )
        };

        let rows = vec![
            setting("discord token", "<redacted>".to_string()),
            setting("channel", config.channel_id.to_string()),
            setting("server", config.server_id.to_string()),
            setting("artist", config.artist.to_string()),
            setting(
                "update interval",
                format!("{} min", config.update_interval.as_secs() / 60),
            ),
            setting("debug", config.debug.to_string()),
            setting("state file", config.state_path.display().to_string()),
            setting("state", state),
            setting(
                "log file",
                config
                    .log_path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "off".to_string()),
            ),
            setting("scraper", config.scraper.display().to_string()),
            setting("diff strategy", config.diff_strategy.to_string()),
            setting("fetch concurrency", config.fetch_concurrency.to_string()),
        ];
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("{}", "configuration ok".green());
        Ok(())
    }
}

fn setting(name: &'static str, value: String) -> SettingRow {
    SettingRow { name, value }
}
