// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{attempt::SubmitQuizRequest, user::Actor},
    services::submission::{self, SubmitOutcome},
};

/// Returns a section's quizzes for the enrolled student, with their
/// previous attempt if they already submitted.
pub async fn get_section_quizzes(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path(section_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let content = submission::section_content(&pool, actor, section_id).await?;
    Ok(Json(content))
}

/// Submits answers for every quiz in a section and grades them.
///
/// * 201 with the new attempt.
/// * 409 with the stored attempt when the student already submitted.
pub async fn submit_section_quiz(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path(section_id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = submission::submit_section_quiz(&pool, actor, section_id, &req.answers).await?;

    Ok(match outcome {
        SubmitOutcome::Created(body) => (StatusCode::CREATED, Json(body)),
        SubmitOutcome::AlreadySubmitted(body) => (StatusCode::CONFLICT, Json(body)),
    })
}
