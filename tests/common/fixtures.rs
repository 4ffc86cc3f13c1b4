use serde_json::{json, Value};

use practice_backend::algorithm::types::{Difficulty, Module};
use practice_backend::store::operations::questions::{AnswerOption, QuestionRecord, QuestionType};
use practice_backend::store::Store;

/// Fill-in question whose answer is always `42`.
pub fn fib_question(id: &str, module: Module, difficulty: Difficulty, skill: &str) -> QuestionRecord {
    QuestionRecord {
        question_id: id.to_string(),
        module,
        difficulty,
        domain: "Seed".to_string(),
        skill: skill.to_string(),
        question_text: format!("Question {id}"),
        stimulus: None,
        answer_options: Vec::new(),
        correct_answer: vec!["42".to_string()],
        rationale: "Seeded".to_string(),
        question_type: QuestionType::Fib,
        elo: None,
        elo_answer_count: 0,
    }
}

/// Multiple-choice question whose correct option is `B`.
pub fn mcq_question(id: &str, module: Module, difficulty: Difficulty, skill: &str) -> QuestionRecord {
    QuestionRecord {
        answer_options: vec![
            AnswerOption { id: format!("{id}-a"), content: "first".into() },
            AnswerOption { id: format!("{id}-b"), content: "second".into() },
            AnswerOption { id: format!("{id}-c"), content: "third".into() },
        ],
        correct_answer: vec!["B".to_string()],
        question_type: QuestionType::Mcq,
        ..fib_question(id, module, difficulty, skill)
    }
}

/// Two questions per difficulty in each module.
pub fn question_bank() -> Vec<QuestionRecord> {
    let mut bank = Vec::new();
    let math_skills = ["Circles", "Percentages"];
    let english_skills = ["Words in Context", "Boundaries"];
    for (d, difficulty) in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
        .into_iter()
        .enumerate()
    {
        for i in 0..2 {
            bank.push(fib_question(
                &format!("math-{d}-{i}"),
                Module::Math,
                difficulty,
                math_skills[i],
            ));
            bank.push(mcq_question(
                &format!("eng-{d}-{i}"),
                Module::English,
                difficulty,
                english_skills[i],
            ));
        }
    }
    bank
}

pub fn seed_questions(store: &Store) -> Vec<QuestionRecord> {
    let bank = question_bank();
    store.import_questions(&bank).expect("import seed questions");
    bank
}

pub fn bank_json() -> Value {
    json!({ "questions": question_bank() })
}
