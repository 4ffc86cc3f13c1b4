use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::types::Module;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// One graded answer, kept for history and the day streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub id: String,
    pub learner_id: String,
    pub session_id: String,
    pub question_id: String,
    pub module: Module,
    pub skill: String,
    pub selected_answer: String,
    pub is_correct: bool,
    pub time_spent_ms: Option<u64>,
    pub rating_before: f64,
    pub rating_after: f64,
    pub answered_at: DateTime<Utc>,
}

impl Store {
    pub fn record_response(&self, response: &ResponseRecord) -> Result<(), StoreError> {
        let key = keys::response_key(
            &response.learner_id,
            response.answered_at.timestamp_millis(),
            &response.id,
        )?;
        self.responses
            .insert(key.as_bytes(), Self::serialize(response)?)?;
        Ok(())
    }

    /// Newest first.
    pub fn list_responses(&self, learner_id: &str, limit: usize) -> Result<Vec<ResponseRecord>, StoreError> {
        let prefix = keys::response_prefix(learner_id)?;
        let mut responses = Vec::new();
        for item in self.responses.scan_prefix(prefix.as_bytes()).take(limit) {
            let (_, value) = item?;
            responses.push(Self::deserialize(&value)?);
        }
        Ok(responses)
    }

    pub fn all_responses(&self, learner_id: &str) -> Result<Vec<ResponseRecord>, StoreError> {
        self.list_responses(learner_id, usize::MAX)
    }
}
