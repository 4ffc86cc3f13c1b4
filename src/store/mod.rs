pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

use crate::constants::MAX_CAS_RETRIES;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub questions: sled::Tree,
    pub learner_profiles: sled::Tree,
    pub practice_sessions: sled::Tree,
    pub responses: sled::Tree,
    pub config_versions: sled::Tree,
    // Secondary index trees
    pub questions_by_module: sled::Tree,
    pub active_sessions: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("CAS retry exhausted after {attempts} attempts: entity={entity}, key={key}")]
    CasRetryExhausted {
        entity: String,
        key: String,
        attempts: u32,
    },
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let questions = db.open_tree(trees::QUESTIONS)?;
        let learner_profiles = db.open_tree(trees::LEARNER_PROFILES)?;
        let practice_sessions = db.open_tree(trees::PRACTICE_SESSIONS)?;
        let responses = db.open_tree(trees::RESPONSES)?;
        let config_versions = db.open_tree(trees::CONFIG_VERSIONS)?;
        let questions_by_module = db.open_tree(trees::QUESTIONS_BY_MODULE)?;
        let active_sessions = db.open_tree(trees::ACTIVE_SESSIONS)?;

        Ok(Self {
            db,
            questions,
            learner_profiles,
            practice_sessions,
            responses,
            config_versions,
            questions_by_module,
            active_sessions,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn raw_db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read-modify-write of one JSON document with compare-and-swap.
    ///
    /// `update` receives the current value (or `None`) and returns the new
    /// value, or `None` to leave the key untouched.
    pub(crate) fn cas_update<T, F>(
        tree: &sled::Tree,
        entity: &str,
        key: &str,
        mut update: F,
    ) -> Result<Option<T>, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(Option<T>) -> Result<Option<T>, StoreError>,
    {
        for _ in 0..MAX_CAS_RETRIES {
            let current_raw = tree.get(key.as_bytes())?;
            let current = current_raw
                .as_ref()
                .map(|raw| Self::deserialize::<T>(raw))
                .transpose()?;

            let Some(next) = update(current)? else {
                return Ok(None);
            };
            let next_bytes = Self::serialize(&next)?;

            match tree.compare_and_swap(key.as_bytes(), current_raw, Some(next_bytes))? {
                Ok(()) => return Ok(Some(next)),
                Err(_) => {
                    tracing::debug!(entity, key, "CAS conflict, retrying");
                    continue;
                }
            }
        }

        Err(StoreError::CasRetryExhausted {
            entity: entity.to_string(),
            key: key.to_string(),
            attempts: MAX_CAS_RETRIES,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn cas_update_applies_concurrent_increments() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path().join("db").to_str().unwrap()).unwrap());

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        Store::cas_update::<u32, _>(&store.config_versions, "counter", "c", |v| {
                            Ok(Some(v.unwrap_or(0) + 1))
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let raw = store.config_versions.get("c").unwrap().unwrap();
        let value: u32 = Store::deserialize(&raw).unwrap();
        assert_eq!(value, 40);
    }

    #[test]
    fn cas_update_can_skip_write() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let result = Store::cas_update::<u32, _>(&store.config_versions, "counter", "c", |_| Ok(None)).unwrap();
        assert!(result.is_none());
        assert!(store.config_versions.get("c").unwrap().is_none());
    }
}
