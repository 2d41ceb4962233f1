// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::{Course, CourseSection, CreateCourseRequest, CreateSectionRequest, EnrollRequest},
        user::Role,
    },
    services::enrollment,
};

async fn user_role(pool: &PgPool, user_id: i64) -> Result<Option<String>, AppError> {
    let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

/// Creates a course, optionally owned by an instructor.
/// Admin only.
pub async fn create_course(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(instructor_id) = payload.instructor_id {
        match user_role(&pool, instructor_id).await?.as_deref() {
            Some(role) if role == Role::Instructor.as_str() => {}
            Some(_) => {
                return Err(AppError::Validation(
                    "instructor_id must reference an instructor".to_string(),
                ));
            }
            None => {
                return Err(AppError::Validation(
                    "instructor_id references an unknown user".to_string(),
                ));
            }
        }
    }

    let course = sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses (title, instructor_id)
        VALUES ($1, $2)
        RETURNING id, title, instructor_id, created_at, updated_at
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.instructor_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(course_id = course.id, "Course created");
    Ok((StatusCode::CREATED, Json(course)))
}

/// Creates a section in a course. Without an explicit `sort_order` the
/// section goes after its siblings.
/// Admin only.
pub async fn create_section(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let section = sqlx::query_as::<_, CourseSection>(
        r#"
        INSERT INTO course_sections (course_id, title, sort_order)
        SELECT c.id, $2, COALESCE($3, (
            SELECT COALESCE(MAX(sort_order), 0) + 1 FROM course_sections WHERE course_id = c.id
        ))
        FROM courses c
        WHERE c.id = $1
        RETURNING id, course_id, title, sort_order, created_at, updated_at
        "#,
    )
    .bind(course_id)
    .bind(payload.title.trim())
    .bind(payload.sort_order)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create section: {:?}", e);
        AppError::from(e)
    })?
    .ok_or(AppError::NotFound("Course not found".to_string()))?;

    tracing::info!(course_id, section_id = section.id, "Section created");
    Ok((StatusCode::CREATED, Json(section)))
}

/// Deletes a section. Quizzes, options, attempts and answers cascade.
/// Admin only.
pub async fn delete_section(
    State(pool): State<PgPool>,
    Path(section_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM course_sections WHERE id = $1")
        .bind(section_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete section: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Section not found".to_string()));
    }

    tracing::info!(section_id, "Section deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Enrolls a student in a course. Re-enrolling returns the existing row.
/// Admin only.
pub async fn enroll_student(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
    Json(payload): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AppError> {
    let course_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
            .bind(course_id)
            .fetch_one(&pool)
            .await?;
    if !course_exists {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    match user_role(&pool, payload.user_id).await?.as_deref() {
        Some(role) if role == Role::Student.as_str() => {}
        Some(_) => {
            return Err(AppError::Validation(
                "Only students can be enrolled".to_string(),
            ));
        }
        None => return Err(AppError::NotFound("User not found".to_string())),
    }

    let (enrollment, created) = enrollment::enroll(&pool, course_id, payload.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to enroll student: {:?}", e);
            AppError::from(e)
        })?;

    let status = if created {
        tracing::info!(course_id, user_id = payload.user_id, "Student enrolled");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(enrollment)))
}
