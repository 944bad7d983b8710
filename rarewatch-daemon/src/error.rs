use std::path::PathBuf;

use thiserror::Error;

use rarewatch_core::StoreError;
use rarewatch_notify::NotifyError;
use rarewatch_source::FetchError;

use crate::config::ConfigError;
use crate::driver::CycleReport;

/// Why one update cycle did not complete cleanly.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Nothing was persisted or announced.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The stored snapshot could not be read.
    #[error("snapshot store error: {0}")]
    Store(#[from] StoreError),

    /// The new snapshot was not saved. Announcements were still attempted;
    /// the next restart may announce them again.
    #[error("failed to persist snapshot: {source}")]
    Persist {
        #[source]
        source: StoreError,
        report: CycleReport,
    },
}

/// Error surface for daemon startup and runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("notifier error: {0}")]
    Notify(#[from] NotifyError),

    #[error("cycle error: {0}")]
    Cycle(#[from] CycleError),
}

impl From<StoreError> for DaemonError {
    fn from(err: StoreError) -> Self {
        DaemonError::Cycle(CycleError::Store(err))
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
