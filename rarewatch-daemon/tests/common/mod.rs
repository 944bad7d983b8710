#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use rarewatch_core::{Action, ArtistId, Creation, Snapshot};
use rarewatch_notify::{Announcement, Notifier, NotifyError};
use rarewatch_source::{CreationSource, FetchError};

/// Source that plays back queued responses, then reports itself unavailable.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    responses: Arc<Mutex<VecDeque<Result<Snapshot, String>>>>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push(&self, snapshot: Snapshot) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(snapshot));
        self
    }

    pub fn push_failure(&self, reason: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreationSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_creations(&self, _artist: &ArtistId) -> Result<Snapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(reason)) => Err(FetchError::Unavailable(reason)),
            None => Err(FetchError::Unavailable("script exhausted".to_string())),
        }
    }
}

/// Notifier that records what it was asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Announcement>>>,
    reject: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every announcement whose description equals `description`.
    pub fn reject(&self, description: &str) -> &Self {
        self.reject.lock().unwrap().push(description.to_string());
        self
    }

    pub fn sent(&self) -> Vec<Announcement> {
        self.sent.lock().unwrap().clone()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|a| format!("{}: {}", a.creation_name, a.description))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, announcement: &Announcement) -> Result<(), NotifyError> {
        if self.reject.lock().unwrap().contains(&announcement.description) {
            return Err(NotifyError::Http {
                status: 500,
                body: "rejected".to_string(),
            });
        }
        self.sent.lock().unwrap().push(announcement.clone());
        Ok(())
    }
}

pub fn creation(name: &str, actions: &[&str]) -> Creation {
    Creation::new(name, format!("https://superrare.com/artwork/{name}")).with_actions(
        actions
            .iter()
            .map(|description| Action::new(*description, None))
            .collect(),
    )
}

pub fn snapshot(creations: Vec<Creation>) -> Snapshot {
    Snapshot::new(creations)
}
