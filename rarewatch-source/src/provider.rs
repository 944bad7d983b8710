//! Provider traits and the concurrent detail enricher.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use rarewatch_core::{ArtistId, Creation, Snapshot};

use crate::FetchError;

/// Default number of detail fetches in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Where the current snapshot of an artist's profile comes from.
///
/// Creations come back in display order; each creation's actions oldest-first.
/// Implementations either return a complete snapshot or fail as a whole.
#[async_trait]
pub trait CreationSource: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    async fn fetch_creations(&self, artist: &ArtistId) -> Result<Snapshot, FetchError>;
}

/// A creation card on the profile page, before its detail page is visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub url: String,
}

/// Two-step access to a profile: list the creations, then load each one.
///
/// `details` may be called concurrently for different listings.
#[async_trait]
pub trait DetailSource: Send + Sync {
    fn name(&self) -> &str;

    async fn list(&self, artist: &ArtistId) -> Result<Vec<Listing>, FetchError>;

    /// Image and oldest-first action history for one listing.
    async fn details(&self, listing: &Listing) -> Result<Creation, FetchError>;
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// [`CreationSource`] over a [`DetailSource`], loading up to `concurrency`
/// detail pages at a time.
///
/// Any failed detail fetch fails the whole snapshot.
pub struct EnrichingSource<D> {
    inner: Arc<D>,
    concurrency: usize,
}

impl<D: DetailSource + 'static> EnrichingSource<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner: Arc::new(inner),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

#[async_trait]
impl<D: DetailSource + 'static> CreationSource for EnrichingSource<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_creations(&self, artist: &ArtistId) -> Result<Snapshot, FetchError> {
        let listings = dedup_listings(self.inner.list(artist).await?);
        tracing::debug!(
            artist = %artist,
            creations = listings.len(),
            "fetching creation details",
        );

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, listing) in listings.iter().cloned().enumerate() {
            let inner = Arc::clone(&self.inner);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| FetchError::Unavailable("detail pool closed".to_string()))?;
                tracing::debug!(url = %listing.url, "populating image and actions");
                let creation = inner.details(&listing).await.map_err(|err| FetchError::Detail {
                    url: listing.url.clone(),
                    source: Box::new(err),
                })?;
                Ok::<_, FetchError>((index, creation))
            });
        }

        let mut slots: Vec<Option<Creation>> = vec![None; listings.len()];
        while let Some(joined) = tasks.join_next().await {
            // Returning early drops the JoinSet, which aborts the remaining tasks.
            let (index, creation) = joined.map_err(|err| FetchError::Join(err.to_string()))??;
            slots[index] = Some(creation);
        }

        Ok(Snapshot::from(slots.into_iter().flatten().collect::<Vec<_>>()))
    }
}

/// Keep the first listing per URL.
fn dedup_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(listings.len());
    for listing in listings {
        if seen.insert(listing.url.clone()) {
            out.push(listing);
        } else {
            tracing::warn!(url = %listing.url, "duplicate creation listing dropped");
        }
    }
    out
}
