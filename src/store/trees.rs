pub const QUESTIONS: &str = "questions";
pub const LEARNER_PROFILES: &str = "learner_profiles";
pub const PRACTICE_SESSIONS: &str = "practice_sessions";
pub const RESPONSES: &str = "responses";
pub const CONFIG_VERSIONS: &str = "config_versions";

// Secondary index trees
pub const QUESTIONS_BY_MODULE: &str = "questions_by_module";
pub const ACTIVE_SESSIONS: &str = "active_sessions";
