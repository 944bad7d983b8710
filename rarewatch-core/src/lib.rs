//! rarewatch core library — creation model, snapshot persistence, errors.
//!
//! - [`types`] — [`Creation`], [`Action`], [`Snapshot`], [`ArtistId`]
//! - [`store`] — load / save of the last observed snapshot
//! - [`error`] — [`StoreError`]

pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::{SnapshotStore, StoredSnapshot};
pub use types::{transaction_id_from_url, Action, ArtistId, Creation, Snapshot, ETHERSCAN_TX_URL};
