//! # rarewatch-sync
//!
//! Change detection between two snapshots of an artist's creations.
//!
//! Call [`reconcile`] to get every action that appeared since the previous
//! snapshot, grouped by creation in the new snapshot's order.

pub mod reconcile;

pub use reconcile::{
    reconcile, reconcile_with, DiffStrategy, NewAction, ParseStrategyError, ReconcileSummary,
    Reconciliation,
};
