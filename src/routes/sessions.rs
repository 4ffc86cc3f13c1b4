use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::algorithm::types::{Module, SessionMode};
use crate::extractors::{JsonBody, LearnerId};
use crate::response::{created, ok, AppError};
use crate::services::practice::SubmitAnswer;
use crate::state::AppState;

const MAX_ANSWER_LEN: usize = 512;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_session))
        .route("/:id", get(get_session))
        .route("/:id/answer", post(submit_answer))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionRequest {
    module: Module,
    #[serde(default)]
    mode: SessionMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest {
    question_id: String,
    selected_answer: String,
    #[serde(default)]
    time_spent_ms: Option<u64>,
}

async fn start_session(
    learner: LearnerId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<StartSessionRequest>,
) -> Result<Response, AppError> {
    let view = state
        .practice()
        .start_session(learner.as_str(), req.module, req.mode)
        .await?;
    if view.resumed {
        Ok(ok(view).into_response())
    } else {
        Ok(created(view).into_response())
    }
}

async fn get_session(
    learner: LearnerId,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.practice().get_session(learner.as_str(), &id)?))
}

async fn submit_answer(
    learner: LearnerId,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.question_id.trim().is_empty() {
        return Err(AppError::bad_request("VALIDATION_ERROR", "questionId is required"));
    }
    if req.selected_answer.len() > MAX_ANSWER_LEN {
        return Err(AppError::bad_request("VALIDATION_ERROR", "selectedAnswer is too long"));
    }

    let result = state
        .practice()
        .submit_answer(
            learner.as_str(),
            &id,
            SubmitAnswer {
                question_id: req.question_id,
                selected_answer: req.selected_answer,
                time_spent_ms: req.time_spent_ms,
            },
        )
        .await?;
    Ok(ok(result))
}
