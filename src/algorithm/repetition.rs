//! SM-2 style review scheduling.
//!
//! The state is implicit in `repetitions`: a missing record behaves like a fresh
//! one (`repetitions = 0`, `ease_factor = 2.5`, `interval = 0`). A correct answer
//! advances the interval 1 → 3 → `round(interval * ease)` days; an incorrect
//! answer resets the item and makes it due immediately.

use serde::Serialize;

use crate::algorithm::config::{
    EASE_BONUS_CORRECT, EASE_PENALTY_WRONG, INTERVAL_FIRST_DAYS, INTERVAL_SECOND_DAYS,
    MASTERED_REPETITIONS, MAX_EASE_FACTOR, MILLIS_PER_DAY, MIN_EASE_FACTOR,
};
use crate::algorithm::types::QuestionRepetition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Unseen,
    Overdue,
    DueSoon,
    Scheduled,
}

fn sanitize(current: Option<&QuestionRepetition>) -> QuestionRepetition {
    let Some(rep) = current else {
        return QuestionRepetition::default();
    };
    if !rep.ease_factor.is_finite() {
        return QuestionRepetition::default();
    }
    QuestionRepetition {
        ease_factor: rep.ease_factor.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR),
        interval: if rep.repetitions == 0 { 0 } else { rep.interval },
        ..*rep
    }
}

pub fn update_repetition(
    is_correct: bool,
    current: Option<&QuestionRepetition>,
    now_ms: i64,
) -> QuestionRepetition {
    let base = sanitize(current);

    if !is_correct {
        return QuestionRepetition {
            ease_factor: (base.ease_factor - EASE_PENALTY_WRONG).max(MIN_EASE_FACTOR),
            interval: 0,
            repetitions: 0,
            last_reviewed_at: now_ms,
            next_review_at: now_ms,
        };
    }

    let interval = match base.repetitions {
        0 => INTERVAL_FIRST_DAYS,
        1 => INTERVAL_SECOND_DAYS,
        _ => (base.interval as f64 * base.ease_factor).round() as u32,
    };

    QuestionRepetition {
        ease_factor: (base.ease_factor + EASE_BONUS_CORRECT).min(MAX_EASE_FACTOR),
        interval,
        repetitions: base.repetitions.saturating_add(1),
        last_reviewed_at: now_ms,
        next_review_at: now_ms + interval as i64 * MILLIS_PER_DAY,
    }
}

pub fn due_state(current: Option<&QuestionRepetition>, now_ms: i64) -> DueState {
    match current {
        None => DueState::Unseen,
        Some(rep) if rep.next_review_at <= now_ms => DueState::Overdue,
        Some(rep) if rep.next_review_at - now_ms < MILLIS_PER_DAY => DueState::DueSoon,
        Some(_) => DueState::Scheduled,
    }
}

pub fn is_mastered(current: Option<&QuestionRepetition>) -> bool {
    current.is_some_and(|rep| rep.repetitions >= MASTERED_REPETITIONS)
}
