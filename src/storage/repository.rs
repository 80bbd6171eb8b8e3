//! Match documents, the completed-match index and the last active pointer.

use std::cmp::Reverse;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{MatchData, MatchId};

use super::{migrate_document, FileStore, KeyValueStore, MemoryStore, StorageConfig, StorageError};

const MATCH_PREFIX: &str = "match_data_";
const COMPLETED_KEY: &str = "completed_matches";
const LAST_ACTIVE_KEY: &str = "last_active_match_id";

fn match_key(id: &MatchId) -> String {
    format!("{MATCH_PREFIX}{id}")
}

#[derive(Clone)]
pub struct MatchRepository {
    store: Arc<dyn KeyValueStore>,
}

impl MatchRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Repository over JSON files in the configured data directory.
    pub fn open(config: &StorageConfig) -> Self {
        Self::new(Arc::new(FileStore::for_config(config)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Write the full match document.
    pub fn save(&self, data: &MatchData) -> Result<(), StorageError> {
        let json = serde_json::to_string(data)?;
        self.store.set(&match_key(&data.id), &json)?;
        debug!(match_id = %data.id, bytes = json.len(), "Saved match");
        Ok(())
    }

    /// Load and upgrade a match document.
    ///
    /// A document that cannot be parsed is removed and reported as missing.
    pub fn load(&self, id: &MatchId) -> Result<Option<MatchData>, StorageError> {
        let key = match_key(id);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };

        let parsed = serde_json::from_str::<Value>(&raw)
            .map_err(StorageError::from)
            .and_then(|value| migrate_document(id.as_str(), value));

        match parsed {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!(match_id = %id, error = %e, "Discarding corrupt match document");
                self.store.remove(&key)?;
                Ok(None)
            }
        }
    }

    /// Save the match and add it to the completed index.
    pub fn save_completed(&self, data: &MatchData) -> Result<(), StorageError> {
        self.save(data)?;

        let mut ids = self.completed_ids()?;
        if !ids.contains(&data.id) {
            ids.push(data.id.clone());
            self.write_completed_ids(&ids)?;
        }

        info!(match_id = %data.id, "Match saved to history");
        Ok(())
    }

    /// Completed matches, most recent first.
    ///
    /// Ordered by date of play, then by creation time; matches without a date
    /// come last. Entries whose document is gone or unreadable are skipped.
    pub fn list_completed(&self) -> Result<Vec<MatchData>, StorageError> {
        let mut matches = Vec::new();
        for id in self.completed_ids()? {
            if let Some(data) = self.load(&id)? {
                matches.push(data);
            }
        }

        matches.sort_by_key(|m| (Reverse(m.date.is_some()), Reverse(m.date), Reverse(m.created_at)));
        Ok(matches)
    }

    /// Remove a completed match document and its index entry.
    pub fn delete_completed(&self, id: &MatchId) -> Result<(), StorageError> {
        self.store.remove(&match_key(id))?;

        let ids = self.completed_ids()?;
        if ids.contains(id) {
            let remaining: Vec<MatchId> = ids.into_iter().filter(|i| i != id).collect();
            self.write_completed_ids(&remaining)?;
        }

        info!(match_id = %id, "Match deleted from history");
        Ok(())
    }

    pub fn is_completed(&self, id: &MatchId) -> Result<bool, StorageError> {
        Ok(self.completed_ids()?.contains(id))
    }

    pub fn last_active(&self) -> Result<Option<MatchId>, StorageError> {
        Ok(self
            .store
            .get(LAST_ACTIVE_KEY)?
            .map(|id| MatchId::new(id.trim().to_string()))
            .filter(|id| !id.as_str().is_empty()))
    }

    pub fn set_last_active(&self, id: &MatchId) -> Result<(), StorageError> {
        self.store.set(LAST_ACTIVE_KEY, id.as_str())
    }

    pub fn clear_last_active(&self) -> Result<(), StorageError> {
        self.store.remove(LAST_ACTIVE_KEY)
    }

    /// Ids in the completed index. An unreadable index counts as empty.
    fn completed_ids(&self) -> Result<Vec<MatchId>, StorageError> {
        let Some(raw) = self.store.get(COMPLETED_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                warn!(error = %e, "Completed match index unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write_completed_ids(&self, ids: &[MatchId]) -> Result<(), StorageError> {
        let json = serde_json::to_string(ids)?;
        self.store.set(COMPLETED_KEY, &json)
    }
}

impl std::fmt::Debug for MatchRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchRepository").finish_non_exhaustive()
    }
}
