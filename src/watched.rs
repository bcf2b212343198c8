//! The user's watched list, persisted as a JSON array in a single file.
//!
//! The file is read once at startup and rewritten in full after every mutation.
//! A malformed file is moved aside to `<name>.corrupt` and the list starts empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::MovieDetail;
use crate::constants::constants;

#[derive(Debug, Error)]
pub enum WatchedError {
  #[error("'{0}' is already in the watched list")]
  Duplicate(String),

  #[error("rating {0} is out of range")]
  InvalidRating(u8),

  #[error("failed to write watched list: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to serialize watched list: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// A movie the user has marked as watched, with their rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedEntry {
  #[serde(rename = "imdbID")]
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub year: String,
  #[serde(rename = "poster", default)]
  pub poster_url: String,
  #[serde(rename = "imdbRating", default)]
  pub catalog_rating: Option<f64>,
  #[serde(rename = "runtime", default)]
  pub runtime_minutes: Option<u32>,
  #[serde(rename = "yourRating")]
  pub user_rating: u8,
  #[serde(rename = "watchedAt", default, skip_serializing_if = "Option::is_none")]
  pub watched_at: Option<DateTime<Utc>>,
}

impl WatchedEntry {
  pub fn from_detail(detail: &MovieDetail, user_rating: u8, watched_at: DateTime<Utc>) -> Result<Self, WatchedError> {
    if user_rating > constants().max_rating {
      return Err(WatchedError::InvalidRating(user_rating));
    }
    Ok(Self {
      id: detail.id.clone(),
      title: detail.title.clone(),
      year: detail.year.clone(),
      poster_url: detail.poster_url.clone(),
      catalog_rating: detail.catalog_rating,
      runtime_minutes: detail.runtime_minutes(),
      user_rating,
      watched_at: Some(watched_at),
    })
  }
}

pub struct WatchedStore {
  path: PathBuf,
  entries: Vec<WatchedEntry>,
}

impl WatchedStore {
  /// Load the list from `path`; see [`load`](Self::load) for the recovery policy.
  pub fn open(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let entries = Self::load(&path);
    info!(path = %path.display(), count = entries.len(), "watched list loaded");
    Self { path, entries }
  }

  /// Read the list. Missing file: empty. Malformed file: empty, and the file is renamed
  /// to `<name>.corrupt` so the next save does not destroy it.
  pub fn load(path: &Path) -> Vec<WatchedEntry> {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
      Err(e) => {
        warn!(path = %path.display(), err = %e, "watched list unreadable, starting empty");
        return Vec::new();
      }
    };
    match serde_json::from_str(&content) {
      Ok(entries) => entries,
      Err(e) => {
        let mut aside = path.as_os_str().to_owned();
        aside.push(".corrupt");
        warn!(path = %path.display(), err = %e, "watched list malformed, moving it aside and starting empty");
        if let Err(e) = std::fs::rename(path, &aside) {
          warn!(err = %e, "failed to move malformed watched list aside");
        }
        Vec::new()
      }
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn entries(&self) -> &[WatchedEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn contains(&self, id: &str) -> bool {
    self.entries.iter().any(|e| e.id == id)
  }

  pub fn user_rating(&self, id: &str) -> Option<u8> {
    self.entries.iter().find(|e| e.id == id).map(|e| e.user_rating)
  }

  /// Append and write through. An id already in the list is rejected untouched.
  pub fn add(&mut self, entry: WatchedEntry) -> Result<(), WatchedError> {
    if self.contains(&entry.id) {
      return Err(WatchedError::Duplicate(entry.id));
    }
    info!(id = %entry.id, title = %entry.title, rating = entry.user_rating, "watched: add");
    self.entries.push(entry);
    self.save()
  }

  /// Remove by id (no-op if absent) and write through.
  pub fn remove(&mut self, id: &str) -> Result<(), WatchedError> {
    let before = self.entries.len();
    self.entries.retain(|e| e.id != id);
    info!(id = %id, removed = before != self.entries.len(), "watched: remove");
    self.save()
  }

  fn save(&self) -> Result<(), WatchedError> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(&self.entries)?;
    std::fs::write(&self.path, content)?;
    Ok(())
  }
}
