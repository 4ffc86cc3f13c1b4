//! Hand-tuned constants for rating, scheduling and question selection.

use crate::algorithm::types::Difficulty;

// ---------------------------------------------------------------------------
// Elo
// ---------------------------------------------------------------------------

/// Logistic scale of the Elo expectation curve.
pub const ELO_SCALE: f64 = 400.0;

pub const DEFAULT_USER_RATING: f64 = 1000.0;
pub const DEFAULT_SKILL_ELO: f64 = 1100.0;

/// K-factor for new learners; also the fixed K of the simple path.
pub const USER_K: f64 = 32.0;
/// Floor the dynamic user K decays to.
pub const USER_K_MIN: f64 = 16.0;
/// Answered-question count at which the dynamic user K reaches its floor.
pub const USER_K_DECAY_COUNT: f64 = 50.0;

pub const QUESTION_K_MAX: f64 = 16.0;
pub const QUESTION_K_MIN: f64 = 4.0;
pub const QUESTION_K_DECAY_COUNT: u32 = 100;

pub const SKILL_K: f64 = 20.0;

pub const ELO_EASY: f64 = 900.0;
pub const ELO_MEDIUM: f64 = 1100.0;
pub const ELO_HARD: f64 = 1300.0;

// ---------------------------------------------------------------------------
// SM-2
// ---------------------------------------------------------------------------

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 2.5;
pub const EASE_BONUS_CORRECT: f64 = 0.1;
pub const EASE_PENALTY_WRONG: f64 = 0.2;

pub const INTERVAL_FIRST_DAYS: u32 = 1;
pub const INTERVAL_SECOND_DAYS: u32 = 3;

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// Question scoring weights (sum to 1.0)
// ---------------------------------------------------------------------------

pub const W_DUE: f64 = 0.25;
pub const W_SKILL_MATCH: f64 = 0.25;
pub const W_DIFFICULTY: f64 = 0.15;
pub const W_FRESHNESS: f64 = 0.20;
pub const W_EXPLORE: f64 = 0.15;

// Flow-state modulation of the target success rate
pub const DEFAULT_TARGET_SUCCESS_RATE: f64 = 0.80;
pub const TARGET_SUCCESS_STREAK_CHALLENGE: f64 = 0.70;
pub const TARGET_SUCCESS_STREAK_MODERATE: f64 = 0.75;
pub const TARGET_SUCCESS_STRUGGLING: f64 = 0.85;
pub const STREAK_THRESHOLD_CHALLENGE: u32 = 5;
pub const STREAK_THRESHOLD_MODERATE: u32 = 3;
pub const STRUGGLING_ACCURACY_THRESHOLD: f64 = 0.50;

pub const DUE_SCORE_NEW: f64 = 0.3;
pub const DUE_SCORE_OVERDUE: f64 = 1.0;
pub const DUE_SCORE_DUE_TODAY: f64 = 0.7;
pub const DUE_SCORE_NOT_DUE: f64 = 0.2;

pub const EXPLORE_SCORE_NEW: f64 = 0.8;
pub const EXPLORE_SCORE_MASTERED: f64 = 0.2;
pub const EXPLORE_SCORE_LEARNING: f64 = 0.5;
/// Repetition count from which a question counts as mastered.
pub const MASTERED_REPETITIONS: u32 = 3;

pub const FRESHNESS_SCORE_NEVER_SEEN: f64 = 1.0;
pub const FRESHNESS_SCORE_OLD: f64 = 0.7;
pub const FRESHNESS_STALE_THRESHOLD: usize = 5;
pub const FRESHNESS_DECAY_STEP: f64 = 0.1;

/// Elo gap at which the difficulty score bottoms out at 0.
pub const DIFF_SCORE_MAX_DIFF: f64 = 500.0;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

pub const CALIBRATION_SEQUENCE: [Difficulty; 5] = [
    Difficulty::Easy,
    Difficulty::Medium,
    Difficulty::Easy,
    Difficulty::Medium,
    Difficulty::Hard,
];

/// Size of the top-scored pool the weighted draw picks from.
pub const TOP_CANDIDATES_COUNT: usize = 5;

/// Questions due within this window are eligible for review mode.
pub const REVIEW_LOOKAHEAD_MS: i64 = MILLIS_PER_DAY;

// ---------------------------------------------------------------------------
// Score estimation
// ---------------------------------------------------------------------------

pub const ESTIMATE_MIN_ELO: f64 = 700.0;
pub const ESTIMATE_MAX_ELO: f64 = 1500.0;
pub const ESTIMATE_MIN_SCORE: f64 = 200.0;
pub const ESTIMATE_MAX_SCORE: f64 = 800.0;
pub const ESTIMATE_CURVE_EXPONENT: f64 = 0.8;
pub const ESTIMATE_DEFAULT_SCORE: u32 = 500;
pub const ESTIMATE_DEFAULT_CONFIDENCE: f64 = 0.1;
pub const ESTIMATE_DEFAULT_RAW_ACCURACY: f64 = 0.5;
pub const CONFIDENCE_QUESTIONS_TARGET: f64 = 100.0;
pub const CATEGORY_CONFIDENCE_QUESTIONS: f64 = 20.0;
pub const RAW_ACCURACY_BASELINE_ELO: f64 = 1100.0;
