use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::algorithm::types::Module;
use crate::extractors::{LearnerId, QueryParams};
use crate::response::{ok, AppError};
use crate::services::practice::parse_daily_date;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(daily_challenge))
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    module: Module,
    /// `YYYY-MM-DD`, UTC today when absent.
    date: Option<String>,
}

async fn daily_challenge(
    learner: LearnerId,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DailyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let date = query.date.as_deref().map(parse_daily_date).transpose()?;
    let challenge = state
        .practice()
        .daily_challenge(learner.as_str(), query.module, date)?;
    Ok(ok(challenge))
}
