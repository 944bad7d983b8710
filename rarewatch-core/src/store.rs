//! Snapshot store — durable copy of the last successfully fetched snapshot.
//!
//! Persists a pretty-printed JSON document, by default at
//! `<home>/.rarewatch/db.json`:
//!
//! ```text
//! {
//!   "version": 1,
//!   "saved_at": "2026-01-01T00:00:00Z",
//!   "creations": [ { "name", "url", "image_url", "actions": [ ... ] } ]
//! }
//! ```
//!
//! A bare JSON array of creations (the layout written by earlier versions of
//! the bot) is still accepted on load. Writes go to `<path>.tmp` and are
//! renamed into place.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{io_err, StoreError};
use crate::types::Snapshot;

/// Current on-disk document version.
pub const STORE_VERSION: u32 = 1;

/// On-disk snapshot payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub version: u32,
    /// `None` when the document predates timestamps.
    pub saved_at: Option<DateTime<Utc>>,
    pub creations: Snapshot,
}

#[derive(Debug, Deserialize)]
struct StructuredCompat {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    creations: Snapshot,
}

/// Single-writer handle on the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<home>/.rarewatch/db.json`
    pub fn default_path_at(home: &Path) -> PathBuf {
        home.join(".rarewatch").join("db.json")
    }

    /// `default_path_at` rooted at `dirs::home_dir()`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::HomeNotFound)?;
        Ok(Self::default_path_at(&home))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the last saved snapshot.
    ///
    /// Returns an empty snapshot if the file does not yet exist, and
    /// [`StoreError::Corrupt`] if it exists but cannot be decoded.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.load_document()?.creations)
    }

    /// Like [`load`](Self::load) but keeps the document metadata.
    pub fn load_document(&self) -> Result<StoredSnapshot, StoreError> {
        if !self.path.exists() {
            return Ok(StoredSnapshot {
                version: STORE_VERSION,
                saved_at: None,
                creations: Snapshot::default(),
            });
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        let corrupt = |source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        };

        let value: Value = serde_json::from_str(&contents).map_err(corrupt)?;
        match value {
            Value::Array(_) => {
                let creations: Snapshot = serde_json::from_value(value).map_err(corrupt)?;
                Ok(StoredSnapshot {
                    version: STORE_VERSION,
                    saved_at: None,
                    creations,
                })
            }
            Value::Object(_) => {
                let doc: StructuredCompat = serde_json::from_value(value).map_err(corrupt)?;
                Ok(StoredSnapshot {
                    version: doc.version.unwrap_or(STORE_VERSION),
                    saved_at: doc.saved_at,
                    creations: doc.creations,
                })
            }
            other => Err(corrupt(<serde_json::Error as serde::de::Error>::custom(
                format!("expected an object or array of creations, found {other}"),
            ))),
        }
    }

    /// Replace the stored snapshot.
    ///
    /// Writes and fsyncs `<path>.tmp`, then renames it over `<path>`, so a
    /// reader never observes a half-written file.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let doc = StoredSnapshot {
            version: STORE_VERSION,
            saved_at: Some(Utc::now()),
            creations: snapshot.clone(),
        };
        self.save_document(&doc)
    }

    fn save_document(&self, doc: &StoredSnapshot) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.tmp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        });
        if let Err(err) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&tmp, err));
        }
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}
