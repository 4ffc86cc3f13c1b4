//! Projects per-skill Elo onto a 200–800 section score.

use std::collections::HashMap;

use crate::algorithm::config::{
    CATEGORY_CONFIDENCE_QUESTIONS, CONFIDENCE_QUESTIONS_TARGET, DEFAULT_SKILL_ELO,
    ESTIMATE_CURVE_EXPONENT, ESTIMATE_DEFAULT_CONFIDENCE, ESTIMATE_DEFAULT_RAW_ACCURACY,
    ESTIMATE_DEFAULT_SCORE, ESTIMATE_MAX_ELO, ESTIMATE_MAX_SCORE, ESTIMATE_MIN_ELO,
    ESTIMATE_MIN_SCORE, RAW_ACCURACY_BASELINE_ELO,
};
use crate::algorithm::rating::expected_score;
use crate::algorithm::skills::{categories_for_module, SkillCategory};
use crate::algorithm::types::{EstimatedScore, Module, SkillElo, TotalEstimate};

struct CategoryEstimate {
    elo: f64,
    question_count: u32,
    weight: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn elo_to_scaled_score(elo: f64) -> u32 {
    let normalized = ((elo - ESTIMATE_MIN_ELO) / (ESTIMATE_MAX_ELO - ESTIMATE_MIN_ELO)).clamp(0.0, 1.0);
    let scaled = ESTIMATE_MIN_SCORE
        + (ESTIMATE_MAX_SCORE - ESTIMATE_MIN_SCORE) * normalized.powf(ESTIMATE_CURVE_EXPONENT);
    scaled.clamp(ESTIMATE_MIN_SCORE, ESTIMATE_MAX_SCORE).round() as u32
}

/// Average Elo over the category's skills that have at least one answer.
fn estimate_category(skill_elos: &HashMap<String, SkillElo>, category: &SkillCategory) -> CategoryEstimate {
    let practiced: Vec<&SkillElo> = category
        .skills
        .iter()
        .filter_map(|skill| skill_elos.get(*skill))
        .filter(|s| s.question_count > 0)
        .collect();

    let elo = if practiced.is_empty() {
        DEFAULT_SKILL_ELO
    } else {
        practiced.iter().map(|s| s.rating).sum::<f64>() / practiced.len() as f64
    };

    CategoryEstimate {
        elo,
        question_count: practiced.iter().map(|s| s.question_count).sum(),
        weight: category.weight,
    }
}

pub fn estimate_section_score(
    skill_elos: Option<&HashMap<String, SkillElo>>,
    module: Module,
    now_ms: i64,
) -> EstimatedScore {
    let skill_elos = match skill_elos {
        Some(map) if !map.is_empty() => map,
        _ => {
            return EstimatedScore {
                score: ESTIMATE_DEFAULT_SCORE,
                confidence: ESTIMATE_DEFAULT_CONFIDENCE,
                raw_accuracy: ESTIMATE_DEFAULT_RAW_ACCURACY,
                calculated_at: now_ms,
            }
        }
    };

    let mut weighted_elo = 0.0;
    let mut total_weight = 0.0;
    let mut total_questions = 0u32;

    for category in categories_for_module(module) {
        let estimate = estimate_category(skill_elos, category);
        let category_confidence =
            (estimate.question_count as f64 / CATEGORY_CONFIDENCE_QUESTIONS).min(1.0);
        let effective_weight = estimate.weight * (0.5 + 0.5 * category_confidence);

        weighted_elo += estimate.elo * effective_weight;
        total_weight += effective_weight;
        total_questions += estimate.question_count;
    }

    let avg_elo = if total_weight > 0.0 {
        weighted_elo / total_weight
    } else {
        DEFAULT_SKILL_ELO
    };
    let confidence = (total_questions as f64 / CONFIDENCE_QUESTIONS_TARGET).min(1.0);
    let raw_accuracy = expected_score(avg_elo, RAW_ACCURACY_BASELINE_ELO);

    EstimatedScore {
        score: elo_to_scaled_score(avg_elo),
        confidence: round2(confidence),
        raw_accuracy: round2(raw_accuracy),
        calculated_at: now_ms,
    }
}

pub fn estimate_total_score(
    skill_elos: Option<&HashMap<String, SkillElo>>,
    now_ms: i64,
) -> TotalEstimate {
    let english = estimate_section_score(skill_elos, Module::English, now_ms);
    let math = estimate_section_score(skill_elos, Module::Math, now_ms);
    TotalEstimate {
        total: english.score + math.score,
        english,
        math,
    }
}
