use std::collections::HashMap;

use proptest::prelude::*;

use practice_backend::algorithm::estimate::{elo_to_scaled_score, estimate_section_score};
use practice_backend::algorithm::rating::{
    dynamic_user_k, expected_score, question_k, update_question_elo, update_skill_elo,
    update_user_rating, KFactor,
};
use practice_backend::algorithm::repetition::update_repetition;
use practice_backend::algorithm::types::{Module, QuestionRepetition, SkillElo};

const NOW: i64 = 1_700_000_000_000;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

proptest! {
    #[test]
    fn pt_expected_scores_sum_to_one(a in 0.0_f64..3000.0, b in 0.0_f64..3000.0) {
        let sum = expected_score(a, b) + expected_score(b, a);
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&expected_score(a, b)));
    }

    #[test]
    fn pt_correct_never_lowers_rating(
        user in 400.0_f64..2000.0,
        question in 400.0_f64..2000.0,
        answered in 0_u32..200,
    ) {
        let k = KFactor::Dynamic { answered };
        prop_assert!(update_user_rating(user, question, true, k) >= user.round());
        prop_assert!(update_user_rating(user, question, false, k) <= user.round());
        let change = (update_user_rating(user, question, true, KFactor::Fixed) - user).abs();
        prop_assert!(change <= 32.5);
    }

    #[test]
    fn pt_k_factors_stay_in_bounds(answered in 0_u32..10_000) {
        let user_k = dynamic_user_k(answered);
        prop_assert!((16.0..=32.0).contains(&user_k));
        let q_k = question_k(answered);
        prop_assert!((4.0..=16.0).contains(&q_k));
    }

    #[test]
    fn pt_question_moves_against_the_learner(
        question in 600.0_f64..1600.0,
        user in 600.0_f64..1600.0,
        count in 0_u32..500,
    ) {
        let missed = update_question_elo(question, user, count, false);
        let solved = update_question_elo(question, user, count, true);
        prop_assert!(missed.new_elo >= question.round());
        prop_assert!(solved.new_elo <= question.round());
        prop_assert_eq!(missed.new_answer_count, count + 1);
    }

    #[test]
    fn pt_skill_counts_accumulate(
        outcomes in prop::collection::vec(any::<bool>(), 1..40),
        question in 800.0_f64..1400.0,
    ) {
        let mut skill: Option<SkillElo> = None;
        for &correct in &outcomes {
            skill = Some(update_skill_elo(correct, skill.as_ref(), question));
        }
        let skill = skill.unwrap();
        prop_assert_eq!(skill.question_count as usize, outcomes.len());
        prop_assert_eq!(skill.correct_count as usize, outcomes.iter().filter(|c| **c).count());
        prop_assert!(skill.correct_count <= skill.question_count);
    }

    #[test]
    fn pt_ease_factor_stays_clamped(outcomes in prop::collection::vec(any::<bool>(), 1..60)) {
        let mut rep: Option<QuestionRepetition> = None;
        let mut now = NOW;
        for &correct in &outcomes {
            let next = update_repetition(correct, rep.as_ref(), now);
            prop_assert!((1.3..=2.5).contains(&next.ease_factor));
            prop_assert!(next.next_review_at >= now);
            if next.repetitions == 0 {
                prop_assert_eq!(next.interval, 0);
            }
            rep = Some(next);
            now += DAY_MS;
        }
    }

    #[test]
    fn pt_scaled_score_is_monotone_and_bounded(a in 0.0_f64..3000.0, b in 0.0_f64..3000.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let s_lo = elo_to_scaled_score(lo);
        let s_hi = elo_to_scaled_score(hi);
        prop_assert!(s_lo <= s_hi);
        prop_assert!((200..=800).contains(&s_lo));
    }

    #[test]
    fn pt_estimate_confidence_in_unit_range(
        ratings in prop::collection::vec((600.0_f64..1600.0, 0_u32..300), 0..6),
    ) {
        let skills = ["Circles", "Percentages", "Linear equations in one variable", "Words in Context", "Boundaries", "Transitions"];
        let map: HashMap<String, SkillElo> = ratings
            .iter()
            .zip(skills.iter())
            .map(|(&(rating, question_count), name)| {
                (name.to_string(), SkillElo { rating, question_count, correct_count: 0 })
            })
            .collect();
        for module in Module::ALL {
            let est = estimate_section_score(Some(&map), module, NOW);
            prop_assert!((0.0..=1.0).contains(&est.confidence));
            prop_assert!((0.0..=1.0).contains(&est.raw_accuracy));
            prop_assert!((200..=800).contains(&est.score));
        }
    }
}
