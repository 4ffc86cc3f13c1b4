pub mod algorithm;
pub mod config;
pub mod constants;
pub mod extractors;
pub mod grading;
pub mod logging;
pub mod middleware;
pub mod question_cache;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
