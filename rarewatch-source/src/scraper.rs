//! Detail source backed by an external scraper program.
//!
//! Browser automation lives outside this repository. The scraper is invoked
//! once per page and prints JSON on stdout:
//!
//! ```text
//! <program> creations <artist>   -> [{"name": "...", "url": "..."}, ...]        display order
//! <program> creation <url>       -> {"image_url": "...", "actions": [...]}      oldest first
//! ```
//!
//! Each action is `{"description": "...", "transaction_id": "..."}`; a
//! `"transaction_url"` explorer link is accepted in place of the id. A
//! non-zero exit status means the page could not be loaded.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use rarewatch_core::{transaction_id_from_url, Action, ArtistId, Creation};

use crate::provider::{DetailSource, Listing};
use crate::FetchError;

/// Default program name looked up on `$PATH`.
pub const DEFAULT_SCRAPER: &str = "rarewatch-scraper";

/// Upper bound on one scraper invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct RawDetails {
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    transaction_url: Option<String>,
}

impl RawAction {
    /// Entries without a description are not actions (e.g. a history header).
    fn into_action(self) -> Option<Action> {
        let description = self.description.filter(|d| !d.trim().is_empty())?;
        let transaction_id = self
            .transaction_id
            .filter(|id| !id.is_empty())
            .or_else(|| self.transaction_url.as_deref().and_then(transaction_id_from_url));
        Some(Action::new(description.trim(), transaction_id))
    }
}

#[derive(Debug, Clone)]
pub struct ScraperCommand {
    program: PathBuf,
    timeout: Duration,
}

impl ScraperCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn invoke(&self, args: &[&str]) -> Result<Vec<u8>, FetchError> {
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FetchError::Io {
                program: self.program.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|source| FetchError::Io {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => {
                return Err(FetchError::Unavailable(format!(
                    "{} {} timed out after {}s",
                    self.program.display(),
                    args.join(" "),
                    self.timeout.as_secs()
                )))
            }
        };

        if !output.status.success() {
            return Err(FetchError::Command {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl DetailSource for ScraperCommand {
    fn name(&self) -> &str {
        "scraper-command"
    }

    async fn list(&self, artist: &ArtistId) -> Result<Vec<Listing>, FetchError> {
        let stdout = self.invoke(&["creations", artist.0.as_str()]).await?;
        serde_json::from_slice(&stdout).map_err(|source| FetchError::Decode {
            what: format!("creation list for {artist}"),
            source,
        })
    }

    async fn details(&self, listing: &Listing) -> Result<Creation, FetchError> {
        let stdout = self.invoke(&["creation", listing.url.as_str()]).await?;
        let raw: RawDetails =
            serde_json::from_slice(&stdout).map_err(|source| FetchError::Decode {
                what: format!("details of {}", listing.url),
                source,
            })?;

        let actions = raw
            .actions
            .into_iter()
            .filter_map(RawAction::into_action)
            .collect();
        Ok(Creation::new(listing.name.clone(), listing.url.clone())
            .with_image(raw.image_url.unwrap_or_default())
            .with_actions(actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_action_prefers_explicit_id() {
        let raw = RawAction {
            description: Some(" Sold for 1 ETH ".into()),
            transaction_id: Some("0xid".into()),
            transaction_url: Some("https://etherscan.io/tx/0xother".into()),
        };
        let action = raw.into_action().expect("action");
        assert_eq!(action.description, "Sold for 1 ETH");
        assert_eq!(action.transaction_id.as_deref(), Some("0xid"));
    }

    #[test]
    fn raw_action_falls_back_to_explorer_link() {
        let raw = RawAction {
            description: Some("Bid".into()),
            transaction_id: None,
            transaction_url: Some("https://etherscan.io/tx/0xfeed".into()),
        };
        assert_eq!(
            raw.into_action().and_then(|a| a.transaction_id).as_deref(),
            Some("0xfeed")
        );
    }

    #[test]
    fn raw_action_without_description_is_skipped() {
        let raw = RawAction {
            description: None,
            transaction_id: Some("0x1".into()),
            transaction_url: None,
        };
        assert!(raw.into_action().is_none());
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let scraper = ScraperCommand::new("/nonexistent/rarewatch-scraper");
        let err = scraper
            .list(&ArtistId::from("artist"))
            .await
            .expect_err("spawn should fail");
        assert!(matches!(err, FetchError::Io { .. }), "unexpected: {err}");
    }
}
