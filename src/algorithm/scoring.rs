//! Composite desirability score for one candidate question.
//!
//! Five sub-scores in `[0, 1]` are blended with the fixed weights in
//! [`crate::algorithm::config`]. Missing learner state falls back to neutral
//! defaults: skill Elo 1100, no repetition record.

use std::collections::HashMap;

use serde::Serialize;

use crate::algorithm::config::{
    DEFAULT_SKILL_ELO, DEFAULT_TARGET_SUCCESS_RATE, DIFF_SCORE_MAX_DIFF, DUE_SCORE_DUE_TODAY,
    DUE_SCORE_NEW, DUE_SCORE_NOT_DUE, DUE_SCORE_OVERDUE, EXPLORE_SCORE_LEARNING,
    EXPLORE_SCORE_MASTERED, EXPLORE_SCORE_NEW, FRESHNESS_DECAY_STEP, FRESHNESS_SCORE_NEVER_SEEN,
    FRESHNESS_SCORE_OLD, FRESHNESS_STALE_THRESHOLD, STREAK_THRESHOLD_CHALLENGE,
    STREAK_THRESHOLD_MODERATE, STRUGGLING_ACCURACY_THRESHOLD, TARGET_SUCCESS_STREAK_CHALLENGE,
    TARGET_SUCCESS_STREAK_MODERATE, TARGET_SUCCESS_STRUGGLING, W_DIFFICULTY, W_DUE, W_EXPLORE,
    W_FRESHNESS, W_SKILL_MATCH,
};
use crate::algorithm::rating::expected_score;
use crate::algorithm::repetition::{due_state, is_mastered, DueState};
use crate::algorithm::types::{CandidateQuestion, QuestionRepetition, QueuedQuestion, SkillElo};

/// Where each skill last appeared in the session buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionExposure {
    last_position: HashMap<String, usize>,
    buffer_len: usize,
}

impl SessionExposure {
    /// Buffered ids are resolved to skills through `pool`; ids missing from the
    /// pool still occupy a position but expose no skill.
    pub fn from_buffer(buffer: &[QueuedQuestion], pool: &[CandidateQuestion]) -> Self {
        let skills: HashMap<&str, &str> = pool
            .iter()
            .map(|q| (q.question_id.as_str(), q.skill.as_str()))
            .collect();

        let mut last_position = HashMap::new();
        for (index, queued) in buffer.iter().enumerate() {
            if let Some(skill) = skills.get(queued.question_id.as_str()) {
                last_position.insert((*skill).to_string(), index);
            }
        }

        Self {
            last_position,
            buffer_len: buffer.len(),
        }
    }

    /// Buffer positions since the skill was last queued; `None` if never.
    pub fn questions_since(&self, skill: &str) -> Option<usize> {
        self.last_position
            .get(skill)
            .map(|index| self.buffer_len - index)
    }
}

/// Session snapshot the scorer needs.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub user_rating: f64,
    pub skill_elos: &'a HashMap<String, SkillElo>,
    pub repetitions: &'a HashMap<String, QuestionRepetition>,
    pub exposure: &'a SessionExposure,
    pub target_success_rate: f64,
    pub now_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub due: f64,
    pub skill_match: f64,
    pub difficulty: f64,
    pub freshness: f64,
    pub explore: f64,
    pub composite: f64,
}

/// Flow-state target: the first matching rule wins.
pub fn target_success_rate(streak: u32, correct_count: u32, question_count: u32) -> f64 {
    if streak >= STREAK_THRESHOLD_CHALLENGE {
        return TARGET_SUCCESS_STREAK_CHALLENGE;
    }
    if streak >= STREAK_THRESHOLD_MODERATE {
        return TARGET_SUCCESS_STREAK_MODERATE;
    }
    if question_count > 0 {
        let accuracy = correct_count as f64 / question_count as f64;
        if accuracy < STRUGGLING_ACCURACY_THRESHOLD {
            return TARGET_SUCCESS_STRUGGLING;
        }
    }
    DEFAULT_TARGET_SUCCESS_RATE
}

pub fn due_score(repetition: Option<&QuestionRepetition>, now_ms: i64) -> f64 {
    match due_state(repetition, now_ms) {
        DueState::Unseen => DUE_SCORE_NEW,
        DueState::Overdue => DUE_SCORE_OVERDUE,
        DueState::DueSoon => DUE_SCORE_DUE_TODAY,
        DueState::Scheduled => DUE_SCORE_NOT_DUE,
    }
}

pub fn skill_match_score(skill_elo: Option<&SkillElo>, question_elo: f64, target_success_rate: f64) -> f64 {
    let rating = skill_elo.map(|s| s.rating).unwrap_or(DEFAULT_SKILL_ELO);
    1.0 - (expected_score(rating, question_elo) - target_success_rate).abs()
}

pub fn difficulty_score(user_rating: f64, question_elo: f64) -> f64 {
    1.0 - ((user_rating - question_elo).abs() / DIFF_SCORE_MAX_DIFF).min(1.0)
}

pub fn freshness_score(questions_since_last_seen: Option<usize>) -> f64 {
    match questions_since_last_seen {
        None => FRESHNESS_SCORE_NEVER_SEEN,
        Some(n) if n > FRESHNESS_STALE_THRESHOLD => FRESHNESS_SCORE_OLD,
        Some(n) => FRESHNESS_DECAY_STEP * n.max(1) as f64,
    }
}

pub fn explore_score(repetition: Option<&QuestionRepetition>) -> f64 {
    match repetition {
        None => EXPLORE_SCORE_NEW,
        Some(_) if is_mastered(repetition) => EXPLORE_SCORE_MASTERED,
        Some(_) => EXPLORE_SCORE_LEARNING,
    }
}

pub fn score_question(question: &CandidateQuestion, ctx: &ScoringContext<'_>) -> ScoreBreakdown {
    let repetition = ctx.repetitions.get(&question.question_id);

    let due = due_score(repetition, ctx.now_ms);
    let skill_match = skill_match_score(
        ctx.skill_elos.get(&question.skill),
        question.elo,
        ctx.target_success_rate,
    );
    let difficulty = difficulty_score(ctx.user_rating, question.elo);
    let freshness = freshness_score(ctx.exposure.questions_since(&question.skill));
    let explore = explore_score(repetition);

    let composite = W_DUE * due
        + W_SKILL_MATCH * skill_match
        + W_DIFFICULTY * difficulty
        + W_FRESHNESS * freshness
        + W_EXPLORE * explore;

    ScoreBreakdown {
        due,
        skill_match,
        difficulty,
        freshness,
        explore,
        composite,
    }
}
