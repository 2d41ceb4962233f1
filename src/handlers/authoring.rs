// src/handlers/authoring.rs
//
// Quiz authoring endpoints. Mounted under both /api/admin and
// /api/instructor; `ownership::authorize_authoring` scopes instructors to
// their own courses.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz::{CreateQuizRequest, UpdateQuizRequest},
        user::Actor,
    },
    services::{ownership::authorize_authoring, quiz_authoring},
};

/// Creates a quiz question with its options in a section.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path(section_id): Path<i64>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize_authoring(&pool, actor, section_id, None).await?;
    payload.validate()?;

    let quiz = quiz_authoring::create_quiz(&pool, section_id, payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Returns one quiz with its options, correctness included.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path((section_id, quiz_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    authorize_authoring(&pool, actor, section_id, Some(quiz_id)).await?;

    let quiz = quiz_authoring::find_quiz(&pool, quiz_id).await?;
    Ok(Json(quiz))
}

/// Partially updates a quiz. A supplied `options` array replaces the set.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path((section_id, quiz_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize_authoring(&pool, actor, section_id, Some(quiz_id)).await?;
    payload.validate()?;

    let quiz = quiz_authoring::update_quiz(&pool, section_id, quiz_id, payload).await?;
    Ok(Json(quiz))
}

/// Deletes a quiz.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(actor): Extension<Actor>,
    Path((section_id, quiz_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    authorize_authoring(&pool, actor, section_id, Some(quiz_id)).await?;

    quiz_authoring::delete_quiz(&pool, section_id, quiz_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
