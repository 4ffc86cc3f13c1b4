//! Per-module candidate pool with a time-to-live.
//!
//! The cache is owned by `AppState` and handed to the practice service as a
//! trait object; nothing here is global.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::algorithm::types::{CandidateQuestion, Module};
use crate::store::{Store, StoreError};

pub trait QuestionCache: Send + Sync {
    /// Candidate snapshot for a module; may be up to one TTL stale.
    fn get(&self, module: Module) -> Result<Arc<Vec<CandidateQuestion>>, StoreError>;

    /// Drop one module's entry, or every entry when `module` is `None`.
    fn invalidate(&self, module: Option<Module>);
}

struct CacheEntry {
    candidates: Arc<Vec<CandidateQuestion>>,
    fetched_at: Instant,
}

pub struct TtlQuestionCache {
    store: Arc<Store>,
    ttl: Duration,
    entries: RwLock<HashMap<Module, CacheEntry>>,
}

impl TtlQuestionCache {
    pub fn new(store: Arc<Store>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn fresh(&self, module: Module) -> Option<Arc<Vec<CandidateQuestion>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&module)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.candidates))
    }
}

impl QuestionCache for TtlQuestionCache {
    fn get(&self, module: Module) -> Result<Arc<Vec<CandidateQuestion>>, StoreError> {
        if let Some(candidates) = self.fresh(module) {
            return Ok(candidates);
        }

        let candidates: Vec<CandidateQuestion> = self
            .store
            .list_questions_by_module(module)?
            .iter()
            .map(|q| q.to_candidate())
            .collect();
        tracing::debug!(module = %module, count = candidates.len(), "Question cache refreshed");

        let candidates = Arc::new(candidates);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            module,
            CacheEntry {
                candidates: Arc::clone(&candidates),
                fetched_at: Instant::now(),
            },
        );
        Ok(candidates)
    }

    fn invalidate(&self, module: Option<Module>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match module {
            Some(module) => {
                entries.remove(&module);
            }
            None => entries.clear(),
        }
    }
}
