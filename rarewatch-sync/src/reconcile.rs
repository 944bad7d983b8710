//! Snapshot reconciliation.
//!
//! Histories are treated as append-only: for a creation that was already
//! known, the new actions are the suffix past the previously stored length.
//! A creation never seen before contributes its whole history. Nothing is
//! emitted for histories that stayed the same length or shrank, and creations
//! that disappeared are ignored.
//!
//! Output order: creations in the new snapshot's (display) order, each
//! creation's actions oldest-first.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rarewatch_core::{Action, Creation, Snapshot};

/// How a known creation's old and new histories are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStrategy {
    /// Only the tail past the previous length is new.
    #[default]
    Positional,
    /// Set difference on transaction ids when every action on both sides has
    /// one; positional otherwise.
    #[serde(alias = "transaction-keyed")]
    Transaction,
}

impl fmt::Display for DiffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffStrategy::Positional => write!(f, "positional"),
            DiffStrategy::Transaction => write!(f, "transaction"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown diff strategy '{0}'; expected: positional, transaction")]
pub struct ParseStrategyError(pub String);

impl FromStr for DiffStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(DiffStrategy::Positional),
            "transaction" | "transaction-keyed" => Ok(DiffStrategy::Transaction),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// One action that appeared since the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAction<'a> {
    pub creation: &'a Creation,
    pub action: &'a Action,
}

/// Per-run counters, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Creations in the new snapshot.
    pub seen: usize,
    /// Creations with no match in the old snapshot.
    pub unseen: usize,
    /// Matched creations whose history grew.
    pub grown: usize,
    /// Matched creations whose history got shorter.
    pub shrunk: usize,
    /// Old creations missing from the new snapshot.
    pub dropped: usize,
    pub new_actions: usize,
}

/// Result of [`reconcile_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation<'a> {
    pub actions: Vec<NewAction<'a>>,
    pub summary: ReconcileSummary,
}

/// Every action in `new` that is not yet in `old`, positional rule.
pub fn reconcile<'a>(old: &Snapshot, new: &'a Snapshot) -> Vec<NewAction<'a>> {
    reconcile_with(old, new, DiffStrategy::Positional).actions
}

/// Every action in `new` that is not yet in `old`, using `strategy`.
///
/// Never fails and never mutates either snapshot.
pub fn reconcile_with<'a>(
    old: &Snapshot,
    new: &'a Snapshot,
    strategy: DiffStrategy,
) -> Reconciliation<'a> {
    let mut out = Reconciliation::default();
    out.summary.seen = new.len();

    for creation in new {
        let fresh: Vec<&Action> = match old.find(&creation.url) {
            None => {
                out.summary.unseen += 1;
                creation.actions.iter().collect()
            }
            Some(previous) => {
                let (old_len, new_len) = (previous.actions.len(), creation.actions.len());
                if new_len < old_len {
                    out.summary.shrunk += 1;
                    tracing::debug!(
                        "history of {} shrank from {} to {} actions",
                        creation.url,
                        old_len,
                        new_len
                    );
                }
                let fresh = match strategy {
                    DiffStrategy::Transaction if fully_keyed(previous) && fully_keyed(creation) => {
                        keyed_difference(previous, creation)
                    }
                    _ => positional_suffix(previous, creation),
                };
                if new_len > old_len {
                    out.summary.grown += 1;
                }
                fresh
            }
        };

        out.actions
            .extend(fresh.into_iter().map(|action| NewAction { creation, action }));
    }

    out.summary.dropped = old.iter().filter(|c| new.find(&c.url).is_none()).count();
    out.summary.new_actions = out.actions.len();
    out
}

fn positional_suffix<'a>(old: &Creation, new: &'a Creation) -> Vec<&'a Action> {
    new.actions
        .get(old.actions.len()..)
        .map(|tail| tail.iter().collect())
        .unwrap_or_default()
}

fn fully_keyed(creation: &Creation) -> bool {
    creation
        .actions
        .iter()
        .all(|a| a.transaction_id.as_deref().is_some_and(|id| !id.is_empty()))
}

fn keyed_difference<'a>(old: &Creation, new: &'a Creation) -> Vec<&'a Action> {
    let known: HashSet<&str> = old
        .actions
        .iter()
        .filter_map(|a| a.transaction_id.as_deref())
        .collect();
    new.actions
        .iter()
        .filter(|a| {
            a.transaction_id
                .as_deref()
                .is_some_and(|id| !known.contains(id))
        })
        .collect()
}
