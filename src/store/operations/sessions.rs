use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

use crate::algorithm::types::{LearnerProfile, Module, Session, SessionMode};
use crate::store::keys;
use crate::store::operations::responses::ResponseRecord;
use crate::store::{Store, StoreError};

fn map_tx_error(e: TransactionError<StoreError>) -> StoreError {
    match e {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(se) => StoreError::Sled(se),
    }
}

impl Store {
    /// Persist a new session and make it the learner's active one for its
    /// module and mode.
    pub fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let key = keys::session_key(&session.session_id)?;
        let index_key = keys::active_session_key(&session.learner_id, session.module, session.mode)?;
        let session_bytes = Self::serialize(session)?;

        (&self.practice_sessions, &self.active_sessions)
            .transaction(|(tx_sessions, tx_active)| {
                if tx_sessions.get(key.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::Conflict {
                        entity: "session".to_string(),
                        key: key.clone(),
                    }));
                }
                tx_sessions.insert(key.as_bytes(), session_bytes.as_slice())?;
                tx_active.insert(index_key.as_bytes(), key.as_bytes())?;
                Ok(())
            })
            .map_err(map_tx_error)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let key = keys::session_key(session_id)?;
        match self.practice_sessions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn find_active_session(
        &self,
        learner_id: &str,
        module: Module,
        mode: SessionMode,
    ) -> Result<Option<Session>, StoreError> {
        let index_key = keys::active_session_key(learner_id, module, mode)?;
        let Some(raw_id) = self.active_sessions.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let session_id = match String::from_utf8(raw_id.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in active session index");
                return Ok(None);
            }
        };
        self.get_session(&session_id)
    }

    /// Write `session` only if the stored revision still equals
    /// `session.revision`. Returns the stored copy with its bumped revision.
    pub fn commit_session(&self, session: &Session) -> Result<Session, StoreError> {
        let key = keys::session_key(&session.session_id)?;
        let mut next = session.clone();
        next.revision = session.revision + 1;
        let next_bytes = Self::serialize(&next)?;
        let expected_revision = session.revision;

        self.practice_sessions
            .transaction(|tx| {
                let Some(raw) = tx.get(key.as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(StoreError::NotFound {
                        entity: "session".to_string(),
                        key: key.clone(),
                    }));
                };
                let stored: Session = serde_json::from_slice(&raw)
                    .map_err(|e| ConflictableTransactionError::Abort(StoreError::Serialization(e)))?;
                if stored.revision != expected_revision {
                    return Err(ConflictableTransactionError::Abort(StoreError::Conflict {
                        entity: "session".to_string(),
                        key: key.clone(),
                    }));
                }
                tx.insert(key.as_bytes(), next_bytes.as_slice())?;
                Ok(())
            })
            .map_err(map_tx_error)?;

        Ok(next)
    }

    /// Commit an answered session together with the learner's profile and
    /// the response log entry. The session revision check, the profile
    /// update and the response insert either all land or none do.
    pub fn commit_answer<F>(
        &self,
        session: &Session,
        response: &ResponseRecord,
        now_ms: i64,
        apply: F,
    ) -> Result<(Session, LearnerProfile), StoreError>
    where
        F: Fn(&mut LearnerProfile),
    {
        let session_key = keys::session_key(&session.session_id)?;
        let profile_key = keys::profile_key(&session.learner_id)?;
        let response_key = keys::response_key(
            &response.learner_id,
            response.answered_at.timestamp_millis(),
            &response.id,
        )?;
        let mut next = session.clone();
        next.revision = session.revision + 1;
        let next_bytes = Self::serialize(&next)?;
        let response_bytes = Self::serialize(response)?;
        let expected_revision = session.revision;

        let profile = (&self.practice_sessions, &self.learner_profiles, &self.responses)
            .transaction(|(tx_sessions, tx_profiles, tx_responses)| {
                let Some(raw) = tx_sessions.get(session_key.as_bytes())? else {
                    return Err(ConflictableTransactionError::Abort(StoreError::NotFound {
                        entity: "session".to_string(),
                        key: session_key.clone(),
                    }));
                };
                let stored: Session = serde_json::from_slice(&raw)
                    .map_err(|e| ConflictableTransactionError::Abort(StoreError::Serialization(e)))?;
                if stored.revision != expected_revision {
                    return Err(ConflictableTransactionError::Abort(StoreError::Conflict {
                        entity: "session".to_string(),
                        key: session_key.clone(),
                    }));
                }

                let mut profile = match tx_profiles.get(profile_key.as_bytes())? {
                    Some(raw) => serde_json::from_slice(&raw)
                        .map_err(|e| ConflictableTransactionError::Abort(StoreError::Serialization(e)))?,
                    None => LearnerProfile::new(&session.learner_id, now_ms),
                };
                apply(&mut profile);
                profile.updated_at = now_ms;
                let profile_bytes = serde_json::to_vec(&profile)
                    .map_err(|e| ConflictableTransactionError::Abort(StoreError::Serialization(e)))?;

                tx_sessions.insert(session_key.as_bytes(), next_bytes.as_slice())?;
                tx_profiles.insert(profile_key.as_bytes(), profile_bytes)?;
                tx_responses.insert(response_key.as_bytes(), response_bytes.as_slice())?;
                Ok(profile)
            })
            .map_err(map_tx_error)?;

        Ok((next, profile))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;
    use crate::algorithm::types::QueuedQuestion;

    fn session(id: &str) -> Session {
        Session::new(id, "u1", Module::Math, SessionMode::Sandbox, 1000.0, 0)
    }

    #[test]
    fn create_indexes_active_session() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.create_session(&session("s1")).unwrap();
        let found = store
            .find_active_session("u1", Module::Math, SessionMode::Sandbox)
            .unwrap()
            .unwrap();
        assert_eq!(found.session_id, "s1");
        assert!(store
            .find_active_session("u1", Module::Math, SessionMode::Daily)
            .unwrap()
            .is_none());
    }

    #[test]
    fn duplicate_create_conflicts() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.create_session(&session("s1")).unwrap();
        let err = store.create_session(&session("s1")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn commit_bumps_revision_and_rejects_stale_writers() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        store.create_session(&session("s1")).unwrap();

        let snapshot = store.get_session("s1").unwrap().unwrap();
        let mut first = snapshot.clone();
        first.buffered_questions.push(QueuedQuestion::pending("q1"));
        let committed = store.commit_session(&first).unwrap();
        assert_eq!(committed.revision, 1);

        let mut second = snapshot;
        second.buffered_questions.push(QueuedQuestion::pending("q2"));
        let err = store.commit_session(&second).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let stored = store.get_session("s1").unwrap().unwrap();
        assert_eq!(stored.buffered_questions.len(), 1);
        assert_eq!(stored.buffered_questions[0].question_id, "q1");
    }

    fn answer(id: &str) -> ResponseRecord {
        ResponseRecord {
            id: id.to_string(),
            learner_id: "u1".to_string(),
            session_id: "s1".to_string(),
            question_id: "q1".to_string(),
            module: Module::Math,
            skill: "Circles".to_string(),
            selected_answer: "42".to_string(),
            is_correct: true,
            time_spent_ms: None,
            rating_before: 1000.0,
            rating_after: 1016.0,
            answered_at: Utc.timestamp_millis_opt(5_000).unwrap(),
        }
    }

    #[test]
    fn commit_answer_writes_session_profile_and_response_together() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        store.create_session(&session("s1")).unwrap();

        let mut snapshot = store.get_session("s1").unwrap().unwrap();
        snapshot.question_count = 1;
        let (committed, profile) = store
            .commit_answer(&snapshot, &answer("r1"), 5_000, |p| {
                p.total_questions += 1;
                p.set_rating(Module::Math, 1016.0);
            })
            .unwrap();

        assert_eq!(committed.revision, 1);
        assert_eq!(profile.total_questions, 1);
        assert_eq!(store.get_session("s1").unwrap().unwrap().question_count, 1);
        assert_eq!(store.get_profile("u1").unwrap().unwrap().math_rating, 1016.0);
        assert_eq!(store.all_responses("u1").unwrap().len(), 1);
    }

    #[test]
    fn stale_commit_answer_leaves_profile_and_log_untouched() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        store.create_session(&session("s1")).unwrap();

        let snapshot = store.get_session("s1").unwrap().unwrap();
        store.commit_session(&snapshot).unwrap();

        let err = store
            .commit_answer(&snapshot, &answer("r1"), 5_000, |p| p.total_questions += 1)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert!(store.get_profile("u1").unwrap().is_none());
        assert!(store.all_responses("u1").unwrap().is_empty());
    }

    #[test]
    fn commit_of_unknown_session_is_not_found() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let err = store.commit_session(&session("ghost")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
