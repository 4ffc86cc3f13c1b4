use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::config::{
    DEFAULT_EASE_FACTOR, DEFAULT_SKILL_ELO, DEFAULT_USER_RATING, ELO_EASY, ELO_HARD, ELO_MEDIUM,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    English,
    Math,
}

impl Module {
    pub const ALL: [Module; 2] = [Module::English, Module::Math];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::English => "english",
            Module::Math => "math",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(Module::English),
            "math" => Ok(Module::Math),
            other => Err(format!("unknown module '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "E")]
    Easy,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    Hard,
}

impl Difficulty {
    /// Starting Elo for a freshly ingested question of this difficulty.
    pub fn initial_elo(&self) -> f64 {
        match self {
            Difficulty::Easy => ELO_EASY,
            Difficulty::Medium => ELO_MEDIUM,
            Difficulty::Hard => ELO_HARD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Sandbox,
    SpeedRound,
    Review,
    Daily,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Sandbox => "sandbox",
            SessionMode::SpeedRound => "speed_round",
            SessionMode::Review => "review",
            SessionMode::Daily => "daily",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillElo {
    pub rating: f64,
    pub question_count: u32,
    pub correct_count: u32,
}

impl Default for SkillElo {
    fn default() -> Self {
        Self {
            rating: DEFAULT_SKILL_ELO,
            question_count: 0,
            correct_count: 0,
        }
    }
}

/// SM-2 scheduling state for one (learner, question) pair.
///
/// Timestamps are epoch milliseconds. `repetitions == 0` implies `interval == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRepetition {
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub last_reviewed_at: i64,
    pub next_review_at: i64,
}

impl Default for QuestionRepetition {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            last_reviewed_at: 0,
            next_review_at: 0,
        }
    }
}

/// Read-only view of a question used by scoring and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuestion {
    pub question_id: String,
    pub module: Module,
    pub difficulty: Difficulty,
    pub skill: String,
    pub elo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueuedQuestion {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_change: Option<f64>,
}

impl QueuedQuestion {
    pub fn pending(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            ..Self::default()
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answered_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub learner_id: String,
    pub module: Module,
    #[serde(default)]
    pub mode: SessionMode,
    pub started_at: i64,
    pub last_active_at: i64,
    pub current_rating: f64,
    pub rating_at_start: f64,
    pub question_count: u32,
    pub correct_count: u32,
    pub streak: u32,
    pub best_streak: u32,
    #[serde(default)]
    pub buffered_questions: Vec<QueuedQuestion>,
    /// Optimistic-concurrency counter, bumped on every committed write.
    #[serde(default)]
    pub revision: u64,
}

impl Session {
    pub fn new(
        session_id: impl Into<String>,
        learner_id: impl Into<String>,
        module: Module,
        mode: SessionMode,
        rating: f64,
        now_ms: i64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            learner_id: learner_id.into(),
            module,
            mode,
            started_at: now_ms,
            last_active_at: now_ms,
            current_rating: rating,
            rating_at_start: rating,
            question_count: 0,
            correct_count: 0,
            streak: 0,
            best_streak: 0,
            buffered_questions: Vec::new(),
            revision: 0,
        }
    }

    pub fn unanswered_count(&self) -> usize {
        self.buffered_questions
            .iter()
            .filter(|q| !q.is_answered())
            .count()
    }
}

/// Learner state resolved once at the boundary; every field carries its neutral default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub learner_id: String,
    #[serde(default = "default_user_rating")]
    pub english_rating: f64,
    #[serde(default = "default_user_rating")]
    pub math_rating: f64,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub total_correct: u32,
    #[serde(default)]
    pub skill_elos: HashMap<String, SkillElo>,
    #[serde(default)]
    pub question_repetitions: HashMap<String, QuestionRepetition>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_user_rating() -> f64 {
    DEFAULT_USER_RATING
}

impl LearnerProfile {
    pub fn new(learner_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            learner_id: learner_id.into(),
            english_rating: DEFAULT_USER_RATING,
            math_rating: DEFAULT_USER_RATING,
            total_questions: 0,
            total_correct: 0,
            skill_elos: HashMap::new(),
            question_repetitions: HashMap::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn rating(&self, module: Module) -> f64 {
        match module {
            Module::English => self.english_rating,
            Module::Math => self.math_rating,
        }
    }

    pub fn set_rating(&mut self, module: Module, rating: f64) {
        match module {
            Module::English => self.english_rating = rating,
            Module::Math => self.math_rating = rating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedScore {
    pub score: u32,
    pub confidence: f64,
    pub raw_accuracy: f64,
    pub calculated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalEstimate {
    pub total: u32,
    pub english: EstimatedScore,
    pub math: EstimatedScore,
}
