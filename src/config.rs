use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub practice: PracticeConfig,
}

/// Tunables of the practice loop.
#[derive(Debug, Clone)]
pub struct PracticeConfig {
    /// Unanswered questions kept queued in a session.
    pub buffer_target: usize,
    pub question_cache_ttl_secs: u64,
    /// Decaying user K (32 → 16 over 50 answers) instead of a fixed 32.
    pub dynamic_user_k: bool,
    pub daily_challenge_size: usize,
    /// Seed daily challenges with the learner id as well as the date.
    pub daily_per_learner: bool,
    pub review_batch_size: usize,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            buffer_target: 3,
            question_cache_ttl_secs: 300,
            dynamic_user_k: true,
            daily_challenge_size: 5,
            daily_per_learner: false,
            review_batch_size: 5,
        }
    }
}

impl PracticeConfig {
    pub fn question_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.question_cache_ttl_secs)
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            buffer_target: env_or_parse("BUFFER_TARGET", defaults.buffer_target).max(1),
            question_cache_ttl_secs: env_or_parse(
                "QUESTION_CACHE_TTL_SECS",
                defaults.question_cache_ttl_secs,
            ),
            dynamic_user_k: env_or_bool("DYNAMIC_USER_K", defaults.dynamic_user_k),
            daily_challenge_size: env_or_parse("DAILY_CHALLENGE_SIZE", defaults.daily_challenge_size)
                .max(1),
            daily_per_learner: env_or_bool("DAILY_PER_LEARNER", defaults.daily_per_learner),
            review_batch_size: env_or_parse("REVIEW_BATCH_SIZE", defaults.review_batch_size).max(1),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/practice.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            practice: PracticeConfig::from_env(),
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Failed to parse env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, value = %raw, "Unrecognised boolean env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}
