//! Startup configuration, read from the environment (and `.env`).
//!
//! Every value is validated up front; any missing or invalid setting is a
//! fatal misconfiguration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use rarewatch_core::{ArtistId, SnapshotStore};
use rarewatch_source::provider::DEFAULT_CONCURRENCY;
use rarewatch_source::scraper::DEFAULT_SCRAPER;
use rarewatch_sync::DiffStrategy;

pub const DISCORD_BOT_TOKEN: &str = "DISCORD_BOT_TOKEN";
pub const DISCORD_CHANNEL_ID: &str = "DISCORD_CHANNEL_ID";
pub const DISCORD_SERVER_ID: &str = "DISCORD_SERVER_ID";
pub const SUPERRARE_ARTIST: &str = "SUPERRARE_ARTIST";
pub const UPDATE_INTERVAL: &str = "UPDATE_INTERVAL";
pub const DEBUG: &str = "DEBUG";
pub const RAREWATCH_STATE: &str = "RAREWATCH_STATE";
pub const RAREWATCH_SCRAPER: &str = "RAREWATCH_SCRAPER";
pub const RAREWATCH_DIFF: &str = "RAREWATCH_DIFF";
pub const RAREWATCH_FETCH_CONCURRENCY: &str = "RAREWATCH_FETCH_CONCURRENCY";
pub const RAREWATCH_LOG_JSON: &str = "RAREWATCH_LOG_JSON";
pub const RAREWATCH_LOG: &str = "RAREWATCH_LOG";

/// Log file name, placed next to the state file unless `RAREWATCH_LOG` says otherwise.
pub const LOG_FILE_NAME: &str = "rarewatch.log";

/// Poll interval when `UPDATE_INTERVAL` is unset, in minutes.
pub const DEFAULT_UPDATE_MINUTES: u64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot determine home directory; set RAREWATCH_STATE or $HOME")]
    HomeNotFound,
}

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub channel_id: u64,
    pub server_id: u64,
    pub artist: ArtistId,
    pub update_interval: Duration,
    pub debug: bool,
    pub log_json: bool,
    /// `None` when file logging is switched off.
    pub log_path: Option<PathBuf>,
    pub state_path: PathBuf,
    pub scraper: PathBuf,
    pub diff_strategy: DiffStrategy,
    pub fetch_concurrency: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("server_id", &self.server_id)
            .field("artist", &self.artist.0)
            .field("update_interval", &self.update_interval)
            .field("debug", &self.debug)
            .field("log_json", &self.log_json)
            .field("log_path", &self.log_path)
            .field("state_path", &self.state_path)
            .field("scraper", &self.scraper)
            .field("diff_strategy", &self.diff_strategy)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish()
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get(DISCORD_BOT_TOKEN).ok_or(ConfigError::Missing(DISCORD_BOT_TOKEN))?;
        let channel_id = snowflake(DISCORD_CHANNEL_ID, get(DISCORD_CHANNEL_ID))?;
        let server_id = snowflake(DISCORD_SERVER_ID, get(DISCORD_SERVER_ID))?;
        let artist = get(SUPERRARE_ARTIST)
            .map(ArtistId::from)
            .ok_or(ConfigError::Missing(SUPERRARE_ARTIST))?;

        let update_interval = match get(UPDATE_INTERVAL) {
            Some(value) => {
                let minutes = parse_at_least(UPDATE_INTERVAL, &value, 1)?;
                minutes
                    .checked_mul(60)
                    .map(Duration::from_secs)
                    .ok_or_else(|| ConfigError::Invalid {
                        var: UPDATE_INTERVAL,
                        value: value.clone(),
                        reason: "too large".to_string(),
                    })?
            }
            None => Duration::from_secs(DEFAULT_UPDATE_MINUTES * 60),
        };

        let fetch_concurrency = match get(RAREWATCH_FETCH_CONCURRENCY) {
            Some(value) => parse_at_least(RAREWATCH_FETCH_CONCURRENCY, &value, 1)? as usize,
            None => DEFAULT_CONCURRENCY,
        };

        let diff_strategy = match get(RAREWATCH_DIFF) {
            Some(value) => value.parse().map_err(|err: rarewatch_sync::ParseStrategyError| {
                ConfigError::Invalid {
                    var: RAREWATCH_DIFF,
                    value: value.clone(),
                    reason: err.to_string(),
                }
            })?,
            None => DiffStrategy::default(),
        };

        let state_path = resolve_state_path(&lookup)?;
        let log_path = match get(RAREWATCH_LOG) {
            Some(value) if switched_off(&value) => None,
            Some(value) => Some(PathBuf::from(value)),
            None => Some(state_path.with_file_name(LOG_FILE_NAME)),
        };

        Ok(Self {
            discord_token,
            channel_id,
            server_id,
            artist,
            update_interval,
            debug: get(DEBUG).is_some_and(|v| flag(&v)),
            log_json: get(RAREWATCH_LOG_JSON).is_some_and(|v| flag(&v)),
            log_path,
            state_path,
            scraper: get(RAREWATCH_SCRAPER)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRAPER)),
            diff_strategy,
            fetch_concurrency,
        })
    }

    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.state_path)
    }
}

/// Merge `./.env` into the process environment. Existing variables win.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
}

/// `RAREWATCH_STATE` if set, else `~/.rarewatch/db.json`.
pub fn resolve_state_path<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(RAREWATCH_STATE).filter(|v| !v.trim().is_empty()) {
        Some(path) => Ok(PathBuf::from(path.trim())),
        None => SnapshotStore::default_path().map_err(|_| ConfigError::HomeNotFound),
    }
}

fn snowflake(var: &'static str, value: Option<String>) -> Result<u64, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(var))?;
    match value.parse::<u64>() {
        Ok(0) => Err(ConfigError::Missing(var)),
        Ok(id) => Ok(id),
        Err(err) => Err(ConfigError::Invalid {
            var,
            value,
            reason: err.to_string(),
        }),
    }
}

fn parse_at_least(var: &'static str, value: &str, min: u64) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    };
    let parsed = value.parse::<u64>().map_err(|err| invalid(err.to_string()))?;
    if parsed < min {
        return Err(invalid(format!("needs to be at least {min}")));
    }
    Ok(parsed)
}

fn switched_off(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "off" | "none" | "false" | "0")
}

fn flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
