use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::questions::QuestionRecord;

const MAX_IMPORT_BATCH: usize = 5000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/import", post(import_questions))
        .route("/:id", get(get_question))
}

/// Either a bare array or `{ "questions": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportBody {
    List(Vec<QuestionRecord>),
    Wrapped { questions: Vec<QuestionRecord> },
}

impl ImportBody {
    fn into_questions(self) -> Vec<QuestionRecord> {
        match self {
            ImportBody::List(questions) | ImportBody::Wrapped { questions } => questions,
        }
    }
}

async fn import_questions(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ImportBody>,
) -> Result<impl IntoResponse, AppError> {
    let questions = body.into_questions();
    if questions.is_empty() {
        return Err(AppError::bad_request("VALIDATION_ERROR", "No questions supplied"));
    }
    if questions.len() > MAX_IMPORT_BATCH {
        return Err(AppError::bad_request(
            "VALIDATION_ERROR",
            &format!("At most {MAX_IMPORT_BATCH} questions per import"),
        ));
    }
    let summary = state.practice().import_questions(&questions)?;
    Ok(ok(summary))
}

async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.practice().get_question(&id)?))
}
