//! Pure session progression: which entry is answerable, and how an outcome
//! moves the session counters.

use crate::algorithm::types::{QueuedQuestion, Session, SessionMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionCheck {
    /// Index of the entry being answered.
    Accepted(usize),
    NoPendingQuestion,
    /// The submitted id is not the first unanswered entry.
    Stale { expected: String },
}

/// Outcome of one graded answer, applied to the session by [`apply_outcome`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub time_spent_ms: Option<u64>,
    pub new_rating: f64,
    pub answered_at: i64,
}

pub fn first_unanswered(session: &Session) -> Option<(usize, &QueuedQuestion)> {
    session
        .buffered_questions
        .iter()
        .enumerate()
        .find(|(_, q)| !q.is_answered())
}

pub fn check_submission(session: &Session, question_id: &str) -> SubmissionCheck {
    match first_unanswered(session) {
        None => SubmissionCheck::NoPendingQuestion,
        Some((index, q)) if q.question_id == question_id => SubmissionCheck::Accepted(index),
        Some((_, q)) => SubmissionCheck::Stale {
            expected: q.question_id.clone(),
        },
    }
}

/// Marks the entry answered and updates rating, counters and streaks.
/// Returns the rating change.
pub fn apply_outcome(session: &mut Session, index: usize, outcome: AnswerOutcome) -> f64 {
    let rating_change = outcome.new_rating - session.current_rating;

    if let Some(entry) = session.buffered_questions.get_mut(index) {
        entry.answered_at = Some(outcome.answered_at);
        entry.selected_answer = Some(outcome.selected_answer);
        entry.correct_answer = Some(outcome.correct_answer);
        entry.is_correct = Some(outcome.is_correct);
        entry.time_spent_ms = outcome.time_spent_ms;
        entry.rating_change = Some(rating_change);
    }

    session.current_rating = outcome.new_rating;
    session.question_count += 1;
    if outcome.is_correct {
        session.correct_count += 1;
        session.streak += 1;
        session.best_streak = session.best_streak.max(session.streak);
    } else {
        session.streak = 0;
    }
    session.last_active_at = outcome.answered_at;
    rating_change
}

/// Number of questions to append so that `target` remain unanswered.
/// Daily challenges are fixed at creation and never refilled.
pub fn top_up_count(session: &Session, target: usize) -> usize {
    if session.mode == SessionMode::Daily {
        return 0;
    }
    target.saturating_sub(session.unanswered_count())
}

pub fn append_questions(session: &mut Session, ids: impl IntoIterator<Item = String>) {
    session
        .buffered_questions
        .extend(ids.into_iter().map(QueuedQuestion::pending));
}
