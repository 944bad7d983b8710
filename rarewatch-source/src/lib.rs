//! Fetch-provider boundary: where the current state of an artist's profile
//! comes from.
//!
//! The core only ever calls [`CreationSource::fetch_creations`] and gets a
//! whole [`Snapshot`](rarewatch_core::Snapshot) or a [`FetchError`].
//! [`EnrichingSource`] builds that on top of a per-creation [`DetailSource`],
//! fetching details concurrently. [`ScraperCommand`] is the detail source that
//! shells out to an external page scraper.

mod error;
pub mod provider;
pub mod scraper;

pub use error::FetchError;
pub use provider::{CreationSource, DetailSource, EnrichingSource, Listing};
pub use scraper::ScraperCommand;
