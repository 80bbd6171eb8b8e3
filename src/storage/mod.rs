//! Match persistence.
//!
//! Matches are stored as JSON documents in a key-value store:
//! - `match_data_<id>`: one document per match, live or completed
//! - `completed_matches`: JSON array of completed match ids
//! - `last_active_match_id`: the match to resume on start
//!
//! The store is injected through [`KeyValueStore`] so the repository works
//! the same over files and in memory.

mod file;
mod memory;
mod migrate;
mod repository;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use migrate::migrate_document;
pub use repository::MatchRepository;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Directory holding one JSON document per key.
    pub fn matches_dir(&self) -> PathBuf {
        self.data_dir.join("matches")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// String key-value store holding serialized documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));
        assert_eq!(config.matches_dir(), PathBuf::from("/data/matches"));
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_quota_error_message() {
        let err = StorageError::QuotaExceeded {
            needed: 120,
            quota: 100,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded: 120 bytes needed, 100 allowed"
        );
    }
}
