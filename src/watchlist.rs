//! Local watchlist
//!
//! A JSON file keyed by media id, newest entry first. Every change bumps a
//! revision on a `watch` channel so views can refresh.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

use crate::models::MediaType;

/// One saved title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: String,
    pub title: String,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
}

/// File-backed watchlist store
pub struct Watchlist {
    path: PathBuf,
    changed: watch::Sender<u64>,
}

impl Watchlist {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            path: path.into(),
            changed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, newest first.
    ///
    /// A missing or corrupt file reads as an empty list.
    pub fn list(&self) -> Vec<WatchlistEntry> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return Vec::new(),
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "unreadable watchlist");
            Vec::new()
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.list().iter().any(|e| e.id == id)
    }

    /// Add an entry at the top. Returns false if it was already saved.
    pub fn add(&self, entry: WatchlistEntry) -> Result<bool> {
        let mut entries = self.list();
        if entries.iter().any(|e| e.id == entry.id) {
            return Ok(false);
        }
        entries.insert(0, entry);
        self.store(&entries)?;
        Ok(true)
    }

    /// Remove an entry. Returns false if it was not saved.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.store(&entries)?;
        Ok(true)
    }

    /// Subscribe to change notifications.
    ///
    /// The revision only moves when the file was rewritten: a duplicate
    /// `add` or a `remove` of an absent id leaves subscribers untouched.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    fn store(&self, entries: &[WatchlistEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        self.changed.send_modify(|rev| *rev += 1);
        Ok(())
    }
}
