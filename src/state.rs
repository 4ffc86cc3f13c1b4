use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::question_cache::{QuestionCache, TtlQuestionCache};
use crate::services::practice::PracticeService;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    questions: Arc<dyn QuestionCache>,
    practice: Arc<PracticeService>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: &Config) -> Self {
        let questions: Arc<dyn QuestionCache> = Arc::new(TtlQuestionCache::new(
            store.clone(),
            config.practice.question_cache_ttl(),
        ));
        Self::with_cache(store, questions, config)
    }

    /// Same as [`AppState::new`] with a caller-supplied question cache.
    pub fn with_cache(store: Arc<Store>, questions: Arc<dyn QuestionCache>, config: &Config) -> Self {
        let practice = Arc::new(PracticeService::new(
            store.clone(),
            questions.clone(),
            config.practice.clone(),
        ));
        Self {
            store,
            questions,
            practice,
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn questions(&self) -> &dyn QuestionCache {
        self.questions.as_ref()
    }

    pub fn practice(&self) -> &PracticeService {
        &self.practice
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::algorithm::types::Module;

    #[test]
    fn practice_service_shares_the_question_cache() {
        let cfg = Config::from_env();
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(Store::open(tmp.path().join("state.sled").to_str().unwrap()).unwrap());
        let state = AppState::new(store, &cfg);

        assert!(state.questions().get(Module::Math).unwrap().is_empty());
        assert_eq!(
            state.practice().config().buffer_target,
            state.config().practice.buffer_target
        );
        assert_eq!(state.uptime_secs(), 0);
    }
}
