//! Domain types for tracked creations.
//!
//! A [`Snapshot`] is everything observed on an artist's profile at one point
//! in time. Each [`Creation`] carries its [`Action`] history oldest-first.
//! Field names serialize in snake_case so files written by earlier versions of
//! the bot keep loading.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Block-explorer prefix that transaction ids are formatted against.
pub const ETHERSCAN_TX_URL: &str = "https://etherscan.io/tx/";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Marketplace handle of the artist being watched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistId(pub String);

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ArtistId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArtistId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One historical event on a creation (a bid, a sale, a listing, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub description: String,
    #[serde(default, alias = "transactionId")]
    pub transaction_id: Option<String>,
}

impl Action {
    pub fn new(description: impl Into<String>, transaction_id: Option<String>) -> Self {
        Self {
            description: description.into(),
            transaction_id,
        }
    }

    /// Explorer link for this action's transaction, if it has one.
    pub fn transaction_url(&self) -> Option<String> {
        self.transaction_id
            .as_deref()
            .map(|id| format!("{ETHERSCAN_TX_URL}{id}"))
    }
}

/// Recover a transaction id from an explorer link.
///
/// Returns `None` for links that do not point at the explorer or carry no id.
pub fn transaction_id_from_url(href: &str) -> Option<String> {
    let rest = href.trim().strip_prefix(ETHERSCAN_TX_URL)?;
    let id = rest
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id.to_string())
}

/// One artwork on the artist's profile. Identity is the URL alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creation {
    pub name: String,
    pub url: String,
    /// Empty when the image could not be resolved.
    #[serde(default, alias = "imageUrl")]
    pub image_url: String,
    /// Oldest first.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Creation {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            image_url: String::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    pub fn image_url(&self) -> Option<&str> {
        if self.image_url.is_empty() {
            None
        } else {
            Some(&self.image_url)
        }
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.actions.last()
    }
}

/// Every creation observed in one fetch, in the provider's display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub creations: Vec<Creation>,
}

impl Snapshot {
    pub fn new(creations: Vec<Creation>) -> Self {
        Self { creations }
    }

    /// Linear lookup by URL.
    pub fn find(&self, url: &str) -> Option<&Creation> {
        self.creations.iter().find(|c| c.url == url)
    }

    pub fn len(&self) -> usize {
        self.creations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creations.is_empty()
    }

    /// Total number of actions across all creations.
    pub fn action_count(&self) -> usize {
        self.creations.iter().map(|c| c.actions.len()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Creation> {
        self.creations.iter()
    }
}

impl From<Vec<Creation>> for Snapshot {
    fn from(creations: Vec<Creation>) -> Self {
        Self { creations }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Creation;
    type IntoIter = std::slice::Iter<'a, Creation>;

    fn into_iter(self) -> Self::IntoIter {
        self.creations.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_display() {
        assert_eq!(ArtistId::from("xcopy").to_string(), "xcopy");
    }

    #[test]
    fn transaction_url_uses_explorer_prefix() {
        let action = Action::new("Sold for 2 ETH", Some("0xabc".to_string()));
        assert_eq!(
            action.transaction_url().as_deref(),
            Some("https://etherscan.io/tx/0xabc")
        );
        assert_eq!(Action::new("Listed", None).transaction_url(), None);
    }

    #[test]
    fn transaction_id_parsed_from_explorer_link() {
        assert_eq!(
            transaction_id_from_url("https://etherscan.io/tx/0xdead").as_deref(),
            Some("0xdead")
        );
        assert_eq!(
            transaction_id_from_url("https://etherscan.io/tx/0xdead/?utm=1").as_deref(),
            Some("0xdead")
        );
        assert_eq!(transaction_id_from_url("https://etherscan.io/tx/"), None);
        assert_eq!(transaction_id_from_url("https://example.com/tx/0xdead"), None);
    }

    #[test]
    fn identity_is_url_only() {
        let a = Creation::new("Old title", "https://superrare.com/artwork/1");
        let b = Creation::new("Renamed", "https://superrare.com/artwork/1")
            .with_actions(vec![Action::new("Created", None)]);
        let snapshot = Snapshot::new(vec![a.clone()]);
        assert_eq!(snapshot.find(&b.url), Some(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_image_reads_as_none() {
        let creation = Creation::new("a", "u");
        assert_eq!(creation.image_url(), None);
        assert_eq!(creation.with_image("i.png").image_url(), Some("i.png"));
    }

    #[test]
    fn camel_case_fields_accepted_and_unknown_fields_ignored() {
        let json = r#"{
            "name": "Genesis",
            "url": "https://superrare.com/artwork/1",
            "imageUrl": "https://cdn/1.png",
            "edition": 1,
            "actions": [{"description": "Created", "transactionId": "0x1", "extra": true}]
        }"#;
        let creation: Creation = serde_json::from_str(json).expect("decode");
        assert_eq!(creation.image_url, "https://cdn/1.png");
        assert_eq!(creation.actions[0].transaction_id.as_deref(), Some("0x1"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let creation: Creation =
            serde_json::from_str(r#"{"name":"a","url":"u"}"#).expect("decode");
        assert!(creation.image_url.is_empty());
        assert!(creation.actions.is_empty());
    }

    #[test]
    fn absent_transaction_serializes_as_null() {
        let json = serde_json::to_string(&Action::new("Listed", None)).expect("encode");
        assert_eq!(json, r#"{"description":"Listed","transaction_id":null}"#);
    }

    #[test]
    fn snapshot_find_and_counts() {
        let snapshot = Snapshot::from(vec![
            Creation::new("a", "u1").with_actions(vec![Action::new("Created", None)]),
            Creation::new("b", "u2"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.action_count(), 1);
        assert_eq!(snapshot.find("u2").map(|c| c.name.as_str()), Some("b"));
        assert!(snapshot.find("u3").is_none());
    }
}
