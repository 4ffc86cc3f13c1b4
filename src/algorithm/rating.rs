//! Elo updates for learner ratings, per-skill ratings and question difficulty.

use crate::algorithm::config::{
    DEFAULT_SKILL_ELO, ELO_SCALE, QUESTION_K_DECAY_COUNT, QUESTION_K_MAX, QUESTION_K_MIN, SKILL_K,
    USER_K, USER_K_DECAY_COUNT, USER_K_MIN,
};
use crate::algorithm::types::SkillElo;

/// Step size used for a learner's module rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KFactor {
    /// Constant K of 32.
    Fixed,
    /// Decays from 32 to 16 over the learner's first 50 answered questions.
    Dynamic { answered: u32 },
}

impl KFactor {
    pub fn value(&self) -> f64 {
        match self {
            KFactor::Fixed => USER_K,
            KFactor::Dynamic { answered } => dynamic_user_k(*answered),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionEloUpdate {
    pub new_elo: f64,
    pub new_answer_count: u32,
}

/// Expected score for A against B.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    debug_assert!(rating_a.is_finite() && rating_b.is_finite(), "ratings must be finite");
    1.0 / (1.0 + 10.0_f64.powf((rating_b - rating_a) / ELO_SCALE))
}

pub fn dynamic_user_k(answered: u32) -> f64 {
    let experience = (answered as f64 / USER_K_DECAY_COUNT).min(1.0);
    (USER_K - experience * (USER_K - USER_K_MIN)).max(USER_K_MIN)
}

fn actual(won: bool) -> f64 {
    if won {
        1.0
    } else {
        0.0
    }
}

/// New learner rating after one answer, rounded to an integer.
pub fn update_user_rating(user_rating: f64, question_elo: f64, is_correct: bool, k: KFactor) -> f64 {
    let expected = expected_score(user_rating, question_elo);
    (user_rating + k.value() * (actual(is_correct) - expected)).round()
}

pub fn question_k(elo_answer_count: u32) -> f64 {
    let decay = elo_answer_count.min(QUESTION_K_DECAY_COUNT) as f64 / QUESTION_K_DECAY_COUNT as f64;
    (QUESTION_K_MAX * (1.0 - decay)).max(QUESTION_K_MIN)
}

/// Update from the question's side: the question wins when the learner answers incorrectly.
pub fn update_question_elo(
    question_elo: f64,
    user_rating: f64,
    elo_answer_count: u32,
    is_correct: bool,
) -> QuestionEloUpdate {
    let k = question_k(elo_answer_count);
    let expected = expected_score(question_elo, user_rating);
    QuestionEloUpdate {
        new_elo: (question_elo + k * (actual(!is_correct) - expected)).round(),
        new_answer_count: elo_answer_count.saturating_add(1),
    }
}

/// Absent skill state starts from the default skill rating.
pub fn update_skill_elo(is_correct: bool, current: Option<&SkillElo>, question_elo: f64) -> SkillElo {
    let rating = current.map(|s| s.rating).unwrap_or(DEFAULT_SKILL_ELO);
    let expected = expected_score(rating, question_elo);

    SkillElo {
        rating: (rating + SKILL_K * (actual(is_correct) - expected)).round(),
        question_count: current.map(|s| s.question_count).unwrap_or(0) + 1,
        correct_count: current.map(|s| s.correct_count).unwrap_or(0) + u32::from(is_correct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_score_is_symmetric() {
        let a = expected_score(1000.0, 1100.0);
        let b = expected_score(1100.0, 1000.0);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!((a - 0.3599).abs() < 1e-4);
    }

    #[test]
    fn correct_answer_against_harder_question_gains_about_twenty() {
        assert_eq!(update_user_rating(1000.0, 1100.0, true, KFactor::Fixed), 1020.0);
        assert_eq!(update_user_rating(1000.0, 1100.0, false, KFactor::Fixed), 988.0);
    }

    #[test]
    fn dynamic_k_decays_to_floor() {
        assert_eq!(dynamic_user_k(0), 32.0);
        assert_eq!(dynamic_user_k(25), 24.0);
        assert_eq!(dynamic_user_k(50), 16.0);
        assert_eq!(dynamic_user_k(500), 16.0);
    }

    #[test]
    fn dynamic_k_moves_less_for_experienced_learners() {
        let novice = update_user_rating(1000.0, 1100.0, true, KFactor::Dynamic { answered: 0 });
        let veteran = update_user_rating(1000.0, 1100.0, true, KFactor::Dynamic { answered: 80 });
        assert!(novice - 1000.0 > veteran - 1000.0);
        assert_eq!(veteran, 1010.0);
    }

    #[test]
    fn question_gains_when_learner_misses() {
        let update = update_question_elo(1100.0, 1000.0, 0, false);
        assert_eq!(update.new_elo, 1106.0);
        assert_eq!(update.new_answer_count, 1);

        let update = update_question_elo(1100.0, 1000.0, 0, true);
        assert_eq!(update.new_elo, 1090.0);
    }

    #[test]
    fn question_k_floors_after_decay_horizon() {
        assert_eq!(question_k(0), 16.0);
        assert_eq!(question_k(50), 8.0);
        assert_eq!(question_k(100), 4.0);
        assert_eq!(question_k(10_000), 4.0);
    }

    #[test]
    fn skill_elo_defaults_when_absent() {
        let first = update_skill_elo(true, None, 1100.0);
        assert_eq!(first.rating, 1110.0);
        assert_eq!(first.question_count, 1);
        assert_eq!(first.correct_count, 1);

        let second = update_skill_elo(false, Some(&first), 1100.0);
        assert_eq!(second.question_count, 2);
        assert_eq!(second.correct_count, 1);
        assert!(second.rating < first.rating);
    }

    #[test]
    fn rating_converges_against_weak_opposition() {
        let mut rating = 1000.0;
        for _ in 0..2000 {
            rating = update_user_rating(rating, 600.0, true, KFactor::Fixed);
        }
        // Gains round to zero once the expectation is close enough to 1.
        assert!(rating.is_finite());
        assert!(rating < 1600.0);
    }
}
