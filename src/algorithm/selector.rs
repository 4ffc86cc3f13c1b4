//! Picks which questions to append to a session buffer.
//!
//! Three flavours share the same filtering: adaptive (calibration, then
//! score-weighted random draws), review (pure due-date order) and the daily
//! challenge (hash-ranked, repeatable for a seed).

use std::collections::{HashMap, HashSet};

use crate::algorithm::config::{CALIBRATION_SEQUENCE, REVIEW_LOOKAHEAD_MS, TOP_CANDIDATES_COUNT};
use crate::algorithm::random::{daily_rank, DailySeed, RandomSource};
use crate::algorithm::scoring::{score_question, target_success_rate, ScoringContext, SessionExposure};
use crate::algorithm::types::{
    CandidateQuestion, Module, QuestionRepetition, QueuedQuestion, Session, SessionMode, SkillElo,
};

/// Everything the adaptive selector reads. Absent learner state is passed as
/// empty maps.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInput<'a> {
    pub candidates: &'a [CandidateQuestion],
    pub session: &'a Session,
    pub user_rating: f64,
    pub skill_elos: &'a HashMap<String, SkillElo>,
    pub repetitions: &'a HashMap<String, QuestionRepetition>,
    pub now_ms: i64,
}

fn buffered_ids(buffer: &[QueuedQuestion]) -> HashSet<&str> {
    buffer.iter().map(|q| q.question_id.as_str()).collect()
}

/// Module filter with the already-buffered exclusion; drops the exclusion
/// rather than return nothing.
fn eligible<'a>(
    candidates: &'a [CandidateQuestion],
    module: Module,
    buffer: &[QueuedQuestion],
) -> Vec<&'a CandidateQuestion> {
    let excluded = buffered_ids(buffer);
    let fresh: Vec<&CandidateQuestion> = candidates
        .iter()
        .filter(|q| q.module == module && !excluded.contains(q.question_id.as_str()))
        .collect();
    if !fresh.is_empty() {
        return fresh;
    }
    candidates.iter().filter(|q| q.module == module).collect()
}

fn apply_calibration<'a>(
    pool: Vec<&'a CandidateQuestion>,
    question_count: u32,
) -> Vec<&'a CandidateQuestion> {
    let Some(target) = CALIBRATION_SEQUENCE.get(question_count as usize).copied() else {
        return pool;
    };
    let matching: Vec<&CandidateQuestion> = pool
        .iter()
        .copied()
        .filter(|q| q.difficulty == target)
        .collect();
    if matching.is_empty() {
        pool
    } else {
        matching
    }
}

/// Draw one entry from the top of `scored`, weighted by score. `scored` must
/// be sorted descending and non-empty.
fn weighted_random_index(scored: &[(f64, &CandidateQuestion)], rng: &mut dyn RandomSource) -> usize {
    let top = scored.len().min(TOP_CANDIDATES_COUNT);
    if top <= 1 {
        return 0;
    }
    let total: f64 = scored[..top].iter().map(|(score, _)| score.max(0.0)).sum();
    if total <= 0.0 {
        return 0;
    }

    let mut remaining = rng.next_unit() * total;
    for (index, (score, _)) in scored[..top].iter().enumerate() {
        remaining -= score.max(0.0);
        if remaining < 0.0 {
            return index;
        }
    }
    top - 1
}

/// Adaptive recommendation: up to `count` distinct ids.
pub fn recommend_questions(
    input: &RecommendationInput<'_>,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<String> {
    let session = input.session;
    let pool = eligible(input.candidates, session.module, &session.buffered_questions);
    if pool.is_empty() || count == 0 {
        return Vec::new();
    }
    let pool = apply_calibration(pool, session.question_count);

    let exposure = SessionExposure::from_buffer(&session.buffered_questions, input.candidates);
    let ctx = ScoringContext {
        user_rating: input.user_rating,
        skill_elos: input.skill_elos,
        repetitions: input.repetitions,
        exposure: &exposure,
        target_success_rate: target_success_rate(
            session.streak,
            session.correct_count,
            session.question_count,
        ),
        now_ms: input.now_ms,
    };

    let mut scored: Vec<(f64, &CandidateQuestion)> = pool
        .into_iter()
        .map(|q| (score_question(q, &ctx).composite, q))
        .collect();
    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.question_id.cmp(&b.1.question_id))
    });

    let mut picked = Vec::with_capacity(count.min(scored.len()));
    while picked.len() < count && !scored.is_empty() {
        let index = weighted_random_index(&scored, rng);
        let (_, question) = scored.remove(index);
        picked.push(question.question_id.clone());
    }
    picked
}

/// Questions due now or within the look-ahead window, soonest first.
pub fn recommend_review(
    candidates: &[CandidateQuestion],
    module: Module,
    repetitions: &HashMap<String, QuestionRepetition>,
    buffer: &[QueuedQuestion],
    count: usize,
    now_ms: i64,
) -> Vec<String> {
    let excluded = buffered_ids(buffer);
    let mut due: Vec<(i64, &str)> = candidates
        .iter()
        .filter(|q| q.module == module && !excluded.contains(q.question_id.as_str()))
        .filter_map(|q| {
            repetitions
                .get(&q.question_id)
                .filter(|rep| rep.next_review_at - now_ms < REVIEW_LOOKAHEAD_MS)
                .map(|rep| (rep.next_review_at, q.question_id.as_str()))
        })
        .collect();

    due.sort_unstable();
    due.into_iter()
        .take(count)
        .map(|(_, id)| id.to_string())
        .collect()
}

/// Deterministic pick for a seed. Call time, buffer and learner state play
/// no part, so every caller with the same seed and pool sees the same list.
pub fn daily_challenge(
    candidates: &[CandidateQuestion],
    module: Module,
    seed: &DailySeed,
    count: usize,
) -> Vec<String> {
    let mut ranked: Vec<(u64, &str)> = candidates
        .iter()
        .filter(|q| q.module == module)
        .map(|q| (daily_rank(seed, &q.question_id), q.question_id.as_str()))
        .collect();
    ranked.sort_unstable();
    ranked.dedup_by(|a, b| a.1 == b.1);

    ranked
        .into_iter()
        .take(count)
        .map(|(_, id)| id.to_string())
        .collect()
}

/// Selection strategy for a session's mode.
pub fn recommend_for_mode(
    input: &RecommendationInput<'_>,
    count: usize,
    daily_seed: &DailySeed,
    rng: &mut dyn RandomSource,
) -> Vec<String> {
    match input.session.mode {
        SessionMode::Sandbox | SessionMode::SpeedRound => recommend_questions(input, count, rng),
        SessionMode::Review => {
            let due = recommend_review(
                input.candidates,
                input.session.module,
                input.repetitions,
                &input.session.buffered_questions,
                count,
                input.now_ms,
            );
            if due.is_empty() {
                recommend_questions(input, count, rng)
            } else {
                due
            }
        }
        SessionMode::Daily => {
            daily_challenge(input.candidates, input.session.module, daily_seed, count)
        }
    }
}
