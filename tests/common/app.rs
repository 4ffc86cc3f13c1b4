use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use practice_backend::config::{Config, PracticeConfig};
use practice_backend::routes::build_router;
use practice_backend::state::AppState;
use practice_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

pub fn test_config(sled_path: String, practice: PracticeConfig) -> Config {
    // Built directly so parallel tests never race on environment variables.
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        cors_origin: "http://localhost:5173".to_string(),
        practice,
    }
}

pub async fn spawn_with_practice(practice: PracticeConfig) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("practice-test.sled");
    let config = test_config(sled_path.to_string_lossy().to_string(), practice);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let state = AppState::new(store, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    // Zero TTL: every request sees freshly imported questions.
    spawn_with_practice(PracticeConfig {
        question_cache_ttl_secs: 0,
        ..PracticeConfig::default()
    })
    .await
}
