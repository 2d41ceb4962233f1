// src/services/enrollment.rs

use sqlx::PgPool;

use crate::models::course::CourseEnrollment;

/// Whether the student is enrolled in the course.
pub async fn is_enrolled(pool: &PgPool, student_id: i64, course_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM course_enrollments WHERE course_id = $1 AND user_id = $2)",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
}

/// Enrolls a user, returning the row and whether it was newly created.
/// Concurrent enrollments of the same pair settle on the existing row.
pub async fn enroll(
    pool: &PgPool,
    course_id: i64,
    user_id: i64,
) -> Result<(CourseEnrollment, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, CourseEnrollment>(
        r#"
        INSERT INTO course_enrollments (course_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (course_id, user_id) DO NOTHING
        RETURNING id, course_id, user_id, enrolled_at
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(enrollment) = inserted {
        return Ok((enrollment, true));
    }

    let existing = sqlx::query_as::<_, CourseEnrollment>(
        "SELECT id, course_id, user_id, enrolled_at FROM course_enrollments WHERE course_id = $1 AND user_id = $2",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok((existing, false))
}
