//! One update cycle: fetch → reconcile → persist → notify.
//!
//! The driver owns the only in-memory copy of the last snapshot and the only
//! handle that writes the snapshot store. The store is written before any
//! announcement goes out; if a save fails the announcements are still sent
//! and the failure is reported, so a later restart may repeat them.

use serde::Serialize;

use rarewatch_core::{ArtistId, Snapshot, SnapshotStore};
use rarewatch_notify::{Announcement, Notifier};
use rarewatch_source::CreationSource;
use rarewatch_sync::{reconcile_with, DiffStrategy, ReconcileSummary};

use crate::error::CycleError;

/// Outcome of one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Creations returned by the source.
    pub fetched: usize,
    pub summary: ReconcileSummary,
    /// Announcements delivered.
    pub announced: usize,
    pub failed_notifications: usize,
    pub persisted: bool,
}

pub struct Driver {
    source: Box<dyn CreationSource>,
    notifier: Box<dyn Notifier>,
    store: SnapshotStore,
    artist: ArtistId,
    strategy: DiffStrategy,
    last: Option<Snapshot>,
}

impl Driver {
    pub fn new(
        source: Box<dyn CreationSource>,
        notifier: Box<dyn Notifier>,
        store: SnapshotStore,
        artist: ArtistId,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            artist,
            strategy: DiffStrategy::default(),
            last: None,
        }
    }

    pub fn with_strategy(mut self, strategy: DiffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn artist(&self) -> &ArtistId {
        &self.artist
    }

    /// The snapshot the next cycle will be compared against, once seeded.
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last.as_ref()
    }

    /// Load the stored snapshot if nothing is held in memory yet.
    ///
    /// A corrupt state file is returned as an error rather than treated as
    /// empty, which would re-announce the artist's entire history.
    pub fn seed(&mut self) -> Result<&Snapshot, CycleError> {
        if self.last.is_none() {
            let stored = self.store.load()?;
            tracing::info!(
                path = %self.store.path().display(),
                creations = stored.len(),
                actions = stored.action_count(),
                "loaded stored snapshot",
            );
            self.last = Some(stored);
        }
        Ok(self.last.get_or_insert_with(Snapshot::default))
    }

    /// Ask the source for the current state. Touches nothing.
    pub async fn fetch(&self) -> Result<Snapshot, CycleError> {
        tracing::debug!(
            artist = %self.artist,
            source = self.source.name(),
            "fetching creations",
        );
        Ok(self.source.fetch_creations(&self.artist).await?)
    }

    /// Full cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        self.seed()?;
        let fresh = self.fetch().await?;
        self.apply(fresh).await
    }

    /// Reconcile `fresh` against the held snapshot, persist it, replace the
    /// held snapshot, then announce every new action in order.
    pub async fn apply(&mut self, fresh: Snapshot) -> Result<CycleReport, CycleError> {
        self.seed()?;
        let previous = self.last.take().unwrap_or_default();

        if fresh.is_empty() && !previous.is_empty() {
            tracing::warn!(
                artist = %self.artist,
                previous = previous.len(),
                "source returned no creations; stored snapshot will be emptied",
            );
        }

        let (announcements, summary) = {
            let reconciliation = reconcile_with(&previous, &fresh, self.strategy);
            let announcements: Vec<Announcement> = reconciliation
                .actions
                .iter()
                .map(|new| Announcement::new(new.creation, new.action))
                .collect();
            (announcements, reconciliation.summary)
        };
        if summary.shrunk > 0 {
            tracing::warn!(
                shrunk = summary.shrunk,
                "action history got shorter for some creations; nothing announced for them",
            );
        }
        tracing::info!(
            creations = summary.seen,
            unseen = summary.unseen,
            grown = summary.grown,
            dropped = summary.dropped,
            new_actions = summary.new_actions,
            "reconciled snapshot",
        );

        let mut report = CycleReport {
            fetched: fresh.len(),
            summary,
            ..CycleReport::default()
        };

        let persist_error = match self.persist(&fresh).await {
            Ok(()) => {
                report.persisted = true;
                None
            }
            Err(err) => {
                tracing::error!(
                    path = %self.store.path().display(),
                    error = %err,
                    "failed to persist snapshot; these announcements may repeat after a restart",
                );
                Some(err)
            }
        };
        self.last = Some(fresh);

        for announcement in &announcements {
            match self.notifier.notify(announcement).await {
                Ok(()) => report.announced += 1,
                Err(err) => {
                    report.failed_notifications += 1;
                    tracing::warn!(
                        creation = %announcement.creation_name,
                        action = %announcement.description,
                        error = %err,
                        "announcement not delivered",
                    );
                }
            }
        }

        match persist_error {
            Some(source) => Err(CycleError::Persist { source, report }),
            None => Ok(report),
        }
    }

    /// Reconcile without persisting or announcing.
    pub async fn preview(&mut self) -> Result<Vec<Announcement>, CycleError> {
        self.seed()?;
        let fresh = self.fetch().await?;
        let strategy = self.strategy;
        let previous = self.seed()?;
        Ok(reconcile_with(previous, &fresh, strategy)
            .actions
            .iter()
            .map(|new| Announcement::new(new.creation, new.action))
            .collect())
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), rarewatch_core::StoreError> {
        let store = self.store.clone();
        let snapshot = snapshot.clone();
        match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            Ok(result) => result,
            Err(err) => Err(rarewatch_core::StoreError::Io {
                path: self.store.path().to_path_buf(),
                source: std::io::Error::other(format!("persist task join failure: {err}")),
            }),
        }
    }
}
