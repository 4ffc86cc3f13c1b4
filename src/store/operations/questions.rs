use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::algorithm::rating::{update_question_elo, QuestionEloUpdate};
use crate::algorithm::types::{CandidateQuestion, Difficulty, Module};
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Mcq,
    /// Fill in the blank; `answer_options` is empty.
    Fib,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question_id: String,
    pub module: Module,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub domain: String,
    pub skill: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub stimulus: Option<String>,
    #[serde(default)]
    pub answer_options: Vec<AnswerOption>,
    pub correct_answer: Vec<String>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub question_type: QuestionType,
    /// Absent until ingestion or the back-fill migration assigns one.
    #[serde(default)]
    pub elo: Option<f64>,
    #[serde(default)]
    pub elo_answer_count: u32,
}

impl QuestionRecord {
    pub fn current_elo(&self) -> f64 {
        self.elo.unwrap_or_else(|| self.difficulty.initial_elo())
    }

    pub fn to_candidate(&self) -> CandidateQuestion {
        CandidateQuestion {
            question_id: self.question_id.clone(),
            module: self.module,
            difficulty: self.difficulty,
            skill: self.skill.clone(),
            elo: self.current_elo(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl Store {
    /// Insert or replace a question. Calibration state survives re-imports
    /// that carry no Elo of their own.
    pub fn upsert_question(&self, question: &QuestionRecord) -> Result<bool, StoreError> {
        let key = keys::question_key(&question.question_id)?;
        let existing = self.get_question(&question.question_id)?;

        let mut record = question.clone();
        match (&existing, record.elo) {
            (Some(old), None) => {
                record.elo = Some(old.current_elo());
                record.elo_answer_count = old.elo_answer_count;
            }
            (None, None) => record.elo = Some(record.difficulty.initial_elo()),
            (_, Some(_)) => {}
        }

        let stale_index = existing
            .as_ref()
            .filter(|old| old.module != record.module)
            .map(|old| keys::question_module_index_key(old.module, &old.question_id))
            .transpose()?;
        let index_key = keys::question_module_index_key(record.module, &record.question_id)?;
        let bytes = Self::serialize(&record)?;

        (&self.questions, &self.questions_by_module)
            .transaction(|(tx_questions, tx_index)| {
                tx_questions.insert(key.as_bytes(), bytes.as_slice())?;
                if let Some(stale) = &stale_index {
                    tx_index.remove(stale.as_bytes())?;
                }
                tx_index.insert(index_key.as_bytes(), &[] as &[u8])?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError<()>| match e {
                sled::transaction::TransactionError::Abort(()) => {
                    StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
                }
                sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
            })?;

        Ok(existing.is_none())
    }

    pub fn import_questions(&self, questions: &[QuestionRecord]) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary::default();
        for question in questions {
            if self.upsert_question(question)? {
                summary.inserted += 1;
            } else {
                summary.updated += 1;
            }
        }
        Ok(summary)
    }

    pub fn get_question(&self, question_id: &str) -> Result<Option<QuestionRecord>, StoreError> {
        let key = keys::question_key(question_id)?;
        match self.questions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_questions_by_module(&self, module: Module) -> Result<Vec<QuestionRecord>, StoreError> {
        let prefix = keys::question_module_prefix(module);
        let mut questions = Vec::new();
        for item in self.questions_by_module.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            let key_str = String::from_utf8_lossy(&key);
            let Some(question_id) = key_str.strip_prefix(prefix.as_str()) else {
                continue;
            };
            match self.get_question(question_id)? {
                Some(question) => questions.push(question),
                None => tracing::warn!(question_id, "Module index points at missing question"),
            }
        }
        Ok(questions)
    }

    pub fn count_questions(&self) -> usize {
        self.questions.len()
    }

    /// Apply one answer to the question's Elo under compare-and-swap.
    pub fn record_question_answer(
        &self,
        question_id: &str,
        user_rating: f64,
        is_correct: bool,
    ) -> Result<QuestionEloUpdate, StoreError> {
        let key = keys::question_key(question_id)?;
        let mut applied = None;

        Self::cas_update::<QuestionRecord, _>(&self.questions, "question", &key, |current| {
            let Some(mut question) = current else {
                return Err(StoreError::NotFound {
                    entity: "question".to_string(),
                    key: question_id.to_string(),
                });
            };
            let update = update_question_elo(
                question.current_elo(),
                user_rating,
                question.elo_answer_count,
                is_correct,
            );
            question.elo = Some(update.new_elo);
            question.elo_answer_count = update.new_answer_count;
            applied = Some(update);
            Ok(Some(question))
        })?;

        applied.ok_or_else(|| StoreError::NotFound {
            entity: "question".to_string(),
            key: question_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample(id: &str, module: Module, difficulty: Difficulty) -> QuestionRecord {
        QuestionRecord {
            question_id: id.to_string(),
            module,
            difficulty,
            domain: "Algebra".to_string(),
            skill: "Linear functions".to_string(),
            question_text: "<p>?</p>".to_string(),
            stimulus: None,
            answer_options: vec![
                AnswerOption {
                    id: "opt-a".into(),
                    content: "1".into(),
                },
                AnswerOption {
                    id: "opt-b".into(),
                    content: "2".into(),
                },
            ],
            correct_answer: vec!["B".to_string()],
            rationale: String::new(),
            question_type: QuestionType::Mcq,
            elo: None,
            elo_answer_count: 0,
        }
    }

    #[test]
    fn insert_assigns_initial_elo_by_difficulty() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        assert!(store.upsert_question(&sample("q1", Module::Math, Difficulty::Hard)).unwrap());
        let got = store.get_question("q1").unwrap().unwrap();
        assert_eq!(got.elo, Some(1300.0));
    }

    #[test]
    fn reimport_keeps_calibrated_elo() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.upsert_question(&sample("q1", Module::Math, Difficulty::Medium)).unwrap();
        store.record_question_answer("q1", 1000.0, false).unwrap();

        let summary = store
            .import_questions(&[sample("q1", Module::Math, Difficulty::Medium)])
            .unwrap();
        assert_eq!(summary, ImportSummary { inserted: 0, updated: 1 });

        let got = store.get_question("q1").unwrap().unwrap();
        assert_eq!(got.elo, Some(1106.0));
        assert_eq!(got.elo_answer_count, 1);
    }

    #[test]
    fn module_listing_follows_module_changes() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();

        store.upsert_question(&sample("q1", Module::Math, Difficulty::Easy)).unwrap();
        store.upsert_question(&sample("q2", Module::Math, Difficulty::Easy)).unwrap();
        store.upsert_question(&sample("q2", Module::English, Difficulty::Easy)).unwrap();

        let math = store.list_questions_by_module(Module::Math).unwrap();
        let english = store.list_questions_by_module(Module::English).unwrap();
        assert_eq!(math.len(), 1);
        assert_eq!(english.len(), 1);
        assert_eq!(english[0].question_id, "q2");
    }

    #[test]
    fn answer_on_missing_question_is_not_found() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let err = store.record_question_answer("nope", 1000.0, true).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
