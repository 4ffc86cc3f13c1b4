//! Decides whether a submitted answer is correct.
//!
//! Multiple-choice answers may arrive as the option id or as its letter
//! (`A`, `B`, ...). Fill-in answers are compared after normalisation, and
//! numeric answers match when their values agree, so `0.5`, `.5` and `1/2`
//! are equivalent.

use crate::store::operations::questions::{QuestionRecord, QuestionType};

const FLOAT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub is_correct: bool,
    /// Canonical form of the submission: the option letter for MCQ.
    pub selected: String,
    /// First accepted answer, shown back to the learner.
    pub correct_answer: String,
}

fn option_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}

/// Maps an option id to its letter; anything else passes through trimmed.
fn mcq_letter(question: &QuestionRecord, selected: &str) -> String {
    let selected = selected.trim();
    question
        .answer_options
        .iter()
        .position(|opt| opt.id == selected)
        .and_then(option_letter)
        .map(String::from)
        .unwrap_or_else(|| selected.to_string())
}

fn normalize_text(answer: &str) -> String {
    answer
        .trim()
        .trim_end_matches('.')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Numeric value of a decimal or `a/b` fraction, if it parses.
fn numeric_value(answer: &str) -> Option<f64> {
    let cleaned = normalize_text(answer);
    if let Some((num, den)) = cleaned.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn fill_in_matches(selected: &str, accepted: &str) -> bool {
    if normalize_text(selected) == normalize_text(accepted) {
        return true;
    }
    match (numeric_value(selected), numeric_value(accepted)) {
        (Some(a), Some(b)) => (a - b).abs() <= FLOAT_TOLERANCE * b.abs().max(1.0),
        _ => false,
    }
}

pub fn grade(question: &QuestionRecord, selected_answer: &str) -> Grade {
    let correct_answer = question.correct_answer.first().cloned().unwrap_or_default();

    match question.question_type {
        QuestionType::Mcq => {
            let selected = mcq_letter(question, selected_answer);
            let is_correct = question
                .correct_answer
                .iter()
                .any(|accepted| accepted.trim().eq_ignore_ascii_case(&selected));
            Grade {
                is_correct,
                selected,
                correct_answer,
            }
        }
        QuestionType::Fib => Grade {
            is_correct: question
                .correct_answer
                .iter()
                .any(|accepted| fill_in_matches(selected_answer, accepted)),
            selected: selected_answer.trim().to_string(),
            correct_answer,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::types::{Difficulty, Module};
    use crate::store::operations::questions::AnswerOption;

    fn question(question_type: QuestionType, correct: &[&str]) -> QuestionRecord {
        QuestionRecord {
            question_id: "q1".to_string(),
            module: Module::Math,
            difficulty: Difficulty::Medium,
            domain: String::new(),
            skill: "Percentages".to_string(),
            question_text: String::new(),
            stimulus: None,
            answer_options: if question_type == QuestionType::Mcq {
                ["a1", "b2", "c3", "d4"]
                    .iter()
                    .map(|id| AnswerOption {
                        id: id.to_string(),
                        content: String::new(),
                    })
                    .collect()
            } else {
                Vec::new()
            },
            correct_answer: correct.iter().map(|s| s.to_string()).collect(),
            rationale: String::new(),
            question_type,
            elo: None,
            elo_answer_count: 0,
        }
    }

    #[test]
    fn mcq_accepts_option_id_or_letter() {
        let q = question(QuestionType::Mcq, &["C"]);
        let by_id = grade(&q, "c3");
        assert!(by_id.is_correct);
        assert_eq!(by_id.selected, "C");
        assert!(grade(&q, "c").is_correct);
        assert!(!grade(&q, "a1").is_correct);
        assert_eq!(grade(&q, "a1").correct_answer, "C");
    }

    #[test]
    fn fill_in_normalizes_numbers_and_fractions() {
        let q = question(QuestionType::Fib, &["1/2", ".5"]);
        assert!(grade(&q, "0.5").is_correct);
        assert!(grade(&q, " 1 / 2 ").is_correct);
        assert!(grade(&q, "2/4").is_correct);
        assert!(!grade(&q, "0.25").is_correct);

        let q = question(QuestionType::Fib, &["1,200"]);
        assert!(grade(&q, "1200").is_correct);
    }

    #[test]
    fn fill_in_rejects_garbage_and_zero_denominators() {
        let q = question(QuestionType::Fib, &["3"]);
        assert!(!grade(&q, "three").is_correct);
        assert!(!grade(&q, "3/0").is_correct);
        assert!(!grade(&q, "").is_correct);
    }

    #[test]
    fn question_without_answers_never_matches() {
        let q = question(QuestionType::Mcq, &[]);
        let g = grade(&q, "A");
        assert!(!g.is_correct);
        assert_eq!(g.correct_answer, "");
    }
}
