//! The practice loop: starting sessions, grading answers and feeding the
//! rating, scheduling and selection algorithms with stored learner state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::algorithm::estimate::estimate_total_score;
use crate::algorithm::random::{DailySeed, ThreadRandom};
use crate::algorithm::rating::{update_skill_elo, update_user_rating, KFactor};
use crate::algorithm::repetition::update_repetition;
use crate::algorithm::selector::{
    daily_challenge, recommend_for_mode, recommend_review, RecommendationInput,
};
use crate::algorithm::session::{
    append_questions, apply_outcome, check_submission, first_unanswered, top_up_count,
    AnswerOutcome, SubmissionCheck,
};
use crate::algorithm::types::{
    CandidateQuestion, Difficulty, LearnerProfile, Module, Session, SessionMode, SkillElo,
    TotalEstimate,
};
use crate::config::PracticeConfig;
use crate::grading::grade;
use crate::question_cache::QuestionCache;
use crate::response::AppError;
use crate::store::operations::questions::{AnswerOption, ImportSummary, QuestionRecord, QuestionType};
use crate::store::operations::responses::ResponseRecord;
use crate::store::{Store, StoreError};

const MAX_REVIEW_BATCH: usize = 50;
const DAILY_DATE_FORMAT: &str = "%Y-%m-%d";

/// A question as shown to a learner: no answer key, no rationale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question_id: String,
    pub module: Module,
    pub difficulty: Difficulty,
    pub domain: String,
    pub skill: String,
    pub question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimulus: Option<String>,
    pub answer_options: Vec<AnswerOption>,
    pub question_type: QuestionType,
    pub elo: f64,
}

impl From<&QuestionRecord> for QuestionView {
    fn from(q: &QuestionRecord) -> Self {
        Self {
            question_id: q.question_id.clone(),
            module: q.module,
            difficulty: q.difficulty,
            domain: q.domain.clone(),
            skill: q.skill.clone(),
            question_text: q.question_text.clone(),
            stimulus: q.stimulus.clone(),
            answer_options: q.answer_options.clone(),
            question_type: q.question_type,
            elo: q.current_elo(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session: Session,
    pub current_question: Option<QuestionView>,
    pub resumed: bool,
}

#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    pub question_id: String,
    pub selected_answer: String,
    pub time_spent_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub is_correct: bool,
    pub selected_answer: String,
    pub correct_answer: String,
    pub rationale: String,
    pub rating_before: f64,
    pub new_rating: f64,
    pub rating_change: f64,
    pub streak: u32,
    pub best_streak: u32,
    pub question_count: u32,
    pub correct_count: u32,
    pub next_question: Option<QuestionView>,
    pub session: Session,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub date: String,
    pub module: Module,
    pub question_ids: Vec<String>,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub learner_id: String,
    pub english_rating: f64,
    pub math_rating: f64,
    pub total_questions: u32,
    pub total_correct: u32,
    pub accuracy: f64,
    pub day_streak: u32,
    pub skill_elos: HashMap<String, SkillElo>,
    pub estimate: TotalEstimate,
}

pub struct PracticeService {
    store: Arc<Store>,
    questions: Arc<dyn QuestionCache>,
    config: PracticeConfig,
    learner_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn date_of(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

pub fn parse_daily_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DAILY_DATE_FORMAT)
        .map_err(|_| AppError::bad_request("INVALID_DATE", "Expected a date as YYYY-MM-DD"))
}

/// Consecutive calendar days (UTC) with at least one answer, counted back
/// from today or yesterday. A learner with no correct answer has no streak.
pub fn day_streak(responses: &[ResponseRecord], today: NaiveDate) -> u32 {
    if !responses.iter().any(|r| r.is_correct) {
        return 0;
    }

    let mut days: Vec<NaiveDate> = responses.iter().map(|r| r.answered_at.date_naive()).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&latest) = days.first() else {
        return 0;
    };
    if latest != today && Some(latest) != today.pred_opt() {
        return 0;
    }

    let mut streak = 1;
    let mut expected = latest;
    for day in days.iter().skip(1) {
        match expected.pred_opt() {
            Some(prev) if *day == prev => {
                streak += 1;
                expected = prev;
            }
            _ => break,
        }
    }
    streak
}

pub fn validate_question(q: &QuestionRecord) -> Result<(), String> {
    if q.question_id.trim().is_empty() {
        return Err("questionId must not be empty".to_string());
    }
    if q.skill.trim().is_empty() {
        return Err(format!("question '{}' has no skill", q.question_id));
    }
    if q.correct_answer.iter().all(|a| a.trim().is_empty()) {
        return Err(format!("question '{}' has no correct answer", q.question_id));
    }
    if q.question_type == QuestionType::Mcq && q.answer_options.is_empty() {
        return Err(format!(
            "multiple-choice question '{}' has no answer options",
            q.question_id
        ));
    }
    if let Some(elo) = q.elo {
        if !elo.is_finite() {
            return Err(format!("question '{}' has a non-finite elo", q.question_id));
        }
    }
    Ok(())
}

impl PracticeService {
    pub fn new(store: Arc<Store>, questions: Arc<dyn QuestionCache>, config: PracticeConfig) -> Self {
        Self {
            store,
            questions,
            config,
            learner_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PracticeConfig {
        &self.config
    }

    async fn acquire_learner_lock(&self, learner_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.learner_locks.lock().await;

        // Idle entries are only referenced by the map itself.
        if locks.len() > 1000 {
            locks.retain(|_, v| Arc::strong_count(v) > 1);
        }

        locks
            .entry(learner_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn daily_seed(&self, learner_id: &str, date: NaiveDate) -> DailySeed {
        let date = date.format(DAILY_DATE_FORMAT).to_string();
        if self.config.daily_per_learner {
            DailySeed::for_learner(date, learner_id)
        } else {
            DailySeed::for_date(date)
        }
    }

    fn candidates(&self, module: Module) -> Result<Arc<Vec<CandidateQuestion>>, AppError> {
        Ok(self.questions.get(module)?)
    }

    fn question_view(&self, question_id: &str) -> Result<Option<QuestionView>, AppError> {
        Ok(self
            .store
            .get_question(question_id)?
            .as_ref()
            .map(QuestionView::from))
    }

    fn current_question(&self, session: &Session) -> Result<Option<QuestionView>, AppError> {
        match first_unanswered(session) {
            Some((_, entry)) => self.question_view(&entry.question_id),
            None => Ok(None),
        }
    }

    /// Picks up to `count` questions for the session's mode against the
    /// session's current state.
    fn pick_for_session(
        &self,
        session: &Session,
        profile: &LearnerProfile,
        count: usize,
        now: i64,
    ) -> Result<Vec<String>, AppError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let candidates = self.candidates(session.module)?;
        let input = RecommendationInput {
            candidates: &candidates,
            session,
            user_rating: session.current_rating,
            skill_elos: &profile.skill_elos,
            repetitions: &profile.question_repetitions,
            now_ms: now,
        };
        let seed = self.daily_seed(&session.learner_id, date_of(now).unwrap_or_else(today));
        let mut rng = ThreadRandom;
        Ok(recommend_for_mode(&input, count, &seed, &mut rng))
    }

    fn owned_session(&self, learner_id: &str, session_id: &str) -> Result<Session, AppError> {
        let session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        if session.learner_id != learner_id {
            return Err(AppError::forbidden("Session belongs to another learner"));
        }
        Ok(session)
    }

    /// Resumes the learner's active session for (module, mode) or starts a
    /// new one. Daily sessions only resume on the day they were started.
    pub async fn start_session(
        &self,
        learner_id: &str,
        module: Module,
        mode: SessionMode,
    ) -> Result<SessionView, AppError> {
        let lock = self.acquire_learner_lock(learner_id).await;
        let _guard = lock.lock().await;

        let now = now_ms();
        let profile = self.store.get_profile_or_default(learner_id, now)?;

        if let Some(mut session) = self.store.find_active_session(learner_id, module, mode)? {
            let same_day = date_of(session.started_at) == date_of(now);
            if mode != SessionMode::Daily || same_day {
                session.current_rating = profile.rating(module);
                let refill = top_up_count(&session, self.config.buffer_target);
                let ids = self.pick_for_session(&session, &profile, refill, now)?;
                append_questions(&mut session, ids);
                session.last_active_at = now;

                let session = self.store.commit_session(&session).map_err(session_conflict)?;
                let current_question = self.current_question(&session)?;
                tracing::info!(
                    learner_id,
                    session_id = %session.session_id,
                    module = %module,
                    mode = mode.as_str(),
                    "Practice session resumed"
                );
                return Ok(SessionView {
                    session,
                    current_question,
                    resumed: true,
                });
            }
        }

        let mut session = Session::new(
            uuid::Uuid::new_v4().to_string(),
            learner_id,
            module,
            mode,
            profile.rating(module),
            now,
        );
        let initial = match mode {
            SessionMode::Daily => self.config.daily_challenge_size,
            _ => self.config.buffer_target,
        };
        let ids = self.pick_for_session(&session, &profile, initial, now)?;
        if ids.is_empty() {
            return Err(AppError::conflict(
                "NO_QUESTIONS_AVAILABLE",
                &format!("No {module} questions are available"),
            ));
        }
        append_questions(&mut session, ids);
        self.store.create_session(&session)?;

        tracing::info!(
            learner_id,
            session_id = %session.session_id,
            module = %module,
            mode = mode.as_str(),
            buffered = session.buffered_questions.len(),
            "Practice session started"
        );

        let current_question = self.current_question(&session)?;
        Ok(SessionView {
            session,
            current_question,
            resumed: false,
        })
    }

    pub fn get_session(&self, learner_id: &str, session_id: &str) -> Result<SessionView, AppError> {
        let session = self.owned_session(learner_id, session_id)?;
        let current_question = self.current_question(&session)?;
        Ok(SessionView {
            session,
            current_question,
            resumed: true,
        })
    }

    /// Grades the first unanswered question of the session and folds the
    /// outcome into the session, the question's Elo and the learner profile.
    pub async fn submit_answer(
        &self,
        learner_id: &str,
        session_id: &str,
        answer: SubmitAnswer,
    ) -> Result<AnswerResult, AppError> {
        let lock = self.acquire_learner_lock(learner_id).await;
        let _guard = lock.lock().await;

        let now = now_ms();
        let mut session = self.owned_session(learner_id, session_id)?;

        let index = match check_submission(&session, &answer.question_id) {
            SubmissionCheck::Accepted(index) => index,
            SubmissionCheck::NoPendingQuestion => {
                return Err(AppError::conflict(
                    "NO_PENDING_QUESTION",
                    "Session has no unanswered question",
                ))
            }
            SubmissionCheck::Stale { expected } => {
                return Err(AppError::conflict(
                    "STALE_ANSWER",
                    &format!("Expected an answer for question '{expected}'"),
                ))
            }
        };

        let question = self
            .store
            .get_question(&answer.question_id)?
            .ok_or_else(|| AppError::not_found("Question not found"))?;
        let graded = grade(&question, &answer.selected_answer);
        let question_elo = question.current_elo();

        let profile = self.store.get_profile_or_default(learner_id, now)?;
        let k = if self.config.dynamic_user_k {
            KFactor::Dynamic {
                answered: profile.total_questions,
            }
        } else {
            KFactor::Fixed
        };
        let module = session.module;
        // Sessions in other modes share the module rating.
        let rating_before = profile.rating(module);
        session.current_rating = rating_before;
        let new_rating = update_user_rating(rating_before, question_elo, graded.is_correct, k);

        let rating_change = apply_outcome(
            &mut session,
            index,
            AnswerOutcome {
                selected_answer: graded.selected.clone(),
                correct_answer: graded.correct_answer.clone(),
                is_correct: graded.is_correct,
                time_spent_ms: answer.time_spent_ms,
                new_rating,
                answered_at: now,
            },
        );

        let refill = top_up_count(&session, self.config.buffer_target);
        let ids = self.pick_for_session(&session, &profile, refill, now)?;
        append_questions(&mut session, ids);

        let is_correct = graded.is_correct;
        let response = ResponseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            session_id: session.session_id.clone(),
            question_id: question.question_id.clone(),
            module,
            skill: question.skill.clone(),
            selected_answer: graded.selected.clone(),
            is_correct,
            time_spent_ms: answer.time_spent_ms,
            rating_before,
            rating_after: new_rating,
            answered_at: DateTime::<Utc>::from_timestamp_millis(now).unwrap_or_else(Utc::now),
        };

        let (session, _) = self
            .store
            .commit_answer(&session, &response, now, |p| {
                p.set_rating(module, new_rating);
                p.total_questions += 1;
                if is_correct {
                    p.total_correct += 1;
                }
                let skill = update_skill_elo(is_correct, p.skill_elos.get(&question.skill), question_elo);
                p.skill_elos.insert(question.skill.clone(), skill);
                let repetition = update_repetition(
                    is_correct,
                    p.question_repetitions.get(&question.question_id),
                    now,
                );
                p.question_repetitions
                    .insert(question.question_id.clone(), repetition);
            })
            .map_err(session_conflict)?;

        // The answer is committed at this point; a lost question update only
        // delays that question's calibration.
        if let Err(e) = self
            .store
            .record_question_answer(&question.question_id, new_rating, is_correct)
        {
            tracing::warn!(
                question_id = %question.question_id,
                error = %e,
                "Question Elo update failed"
            );
        }

        tracing::info!(
            learner_id,
            session_id = %session.session_id,
            question_id = %question.question_id,
            is_correct,
            rating_change,
            "Answer recorded"
        );

        let next_question = self.current_question(&session)?;
        Ok(AnswerResult {
            is_correct,
            selected_answer: graded.selected,
            correct_answer: graded.correct_answer,
            rationale: question.rationale.clone(),
            rating_before,
            new_rating,
            rating_change,
            streak: session.streak,
            best_streak: session.best_streak,
            question_count: session.question_count,
            correct_count: session.correct_count,
            next_question,
            session,
        })
    }

    /// Due and soon-due questions for a module, soonest first.
    pub fn review_queue(
        &self,
        learner_id: &str,
        module: Module,
        count: Option<usize>,
    ) -> Result<Vec<QuestionView>, AppError> {
        let now = now_ms();
        let count = count
            .unwrap_or(self.config.review_batch_size)
            .clamp(1, MAX_REVIEW_BATCH);
        let profile = self.store.get_profile_or_default(learner_id, now)?;
        let candidates = self.candidates(module)?;
        let ids = recommend_review(
            &candidates,
            module,
            &profile.question_repetitions,
            &[],
            count,
            now,
        );
        self.views_for(&ids)
    }

    pub fn daily_challenge(
        &self,
        learner_id: &str,
        module: Module,
        date: Option<NaiveDate>,
    ) -> Result<DailyChallenge, AppError> {
        let date = date.unwrap_or_else(today);
        let seed = self.daily_seed(learner_id, date);
        let candidates = self.candidates(module)?;
        let question_ids = daily_challenge(&candidates, module, &seed, self.config.daily_challenge_size);
        let questions = self.views_for(&question_ids)?;
        Ok(DailyChallenge {
            date: seed.date,
            module,
            question_ids,
            questions,
        })
    }

    pub fn estimated_score(&self, learner_id: &str) -> Result<TotalEstimate, AppError> {
        let now = now_ms();
        let profile = self.store.get_profile(learner_id)?;
        Ok(estimate_total_score(profile.as_ref().map(|p| &p.skill_elos), now))
    }

    pub fn profile_summary(&self, learner_id: &str) -> Result<ProfileSummary, AppError> {
        let now = now_ms();
        let profile = self.store.get_profile_or_default(learner_id, now)?;
        let responses = self.store.all_responses(learner_id)?;
        let accuracy = if profile.total_questions > 0 {
            f64::from(profile.total_correct) / f64::from(profile.total_questions)
        } else {
            0.0
        };
        let estimate = estimate_total_score(Some(&profile.skill_elos), now);

        Ok(ProfileSummary {
            learner_id: profile.learner_id,
            english_rating: profile.english_rating,
            math_rating: profile.math_rating,
            total_questions: profile.total_questions,
            total_correct: profile.total_correct,
            accuracy,
            day_streak: day_streak(&responses, today()),
            skill_elos: profile.skill_elos,
            estimate,
        })
    }

    pub fn get_question(&self, question_id: &str) -> Result<QuestionView, AppError> {
        self.question_view(question_id)?
            .ok_or_else(|| AppError::not_found("Question not found"))
    }

    /// Validates the whole batch before writing any of it.
    pub fn import_questions(&self, questions: &[QuestionRecord]) -> Result<ImportSummary, AppError> {
        for q in questions {
            validate_question(q).map_err(|msg| AppError::bad_request("VALIDATION_ERROR", &msg))?;
        }
        let mut seen = HashSet::new();
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.question_id.as_str())) {
            return Err(AppError::bad_request(
                "VALIDATION_ERROR",
                &format!("duplicate questionId '{}'", dup.question_id),
            ));
        }

        let summary = self.store.import_questions(questions)?;
        let modules: HashSet<Module> = questions.iter().map(|q| q.module).collect();
        // A re-import may move a question between modules, so both sides go stale.
        if modules.len() == 1 && summary.updated == 0 {
            self.questions.invalidate(modules.into_iter().next());
        } else {
            self.questions.invalidate(None);
        }
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Questions imported"
        );
        Ok(summary)
    }

    fn views_for(&self, ids: &[String]) -> Result<Vec<QuestionView>, AppError> {
        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(view) = self.question_view(id)? {
                views.push(view);
            }
        }
        Ok(views)
    }
}

fn session_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict { .. } => AppError::conflict(
            "SESSION_CONFLICT",
            "Session was modified concurrently, reload and retry",
        ),
        other => other.into(),
    }
}
