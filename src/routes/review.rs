use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::algorithm::types::Module;
use crate::extractors::{LearnerId, QueryParams};
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(review_queue))
}

#[derive(Debug, Deserialize)]
struct ReviewQuery {
    module: Module,
    count: Option<usize>,
}

async fn review_queue(
    learner: LearnerId,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ReviewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let questions = state
        .practice()
        .review_queue(learner.as_str(), query.module, query.count)?;
    Ok(ok(serde_json::json!({
        "module": query.module,
        "questions": questions,
    })))
}
