// src/services/submission.rs
//
// Section quiz submission: gates, one-shot grading, and the immutable
// attempt write.

use std::collections::HashMap;

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        attempt::{
            AnswerInput, AttemptResponse, CourseQuizAttempt, CourseQuizAttemptAnswer,
            SectionQuizContent, SubmitQuizResponse, completion_message,
        },
        quiz::StudentQuizView,
        user::{Actor, Role},
    },
    services::{
        enrollment,
        grading::{self, GradedSubmission, GradingError, OptionKey},
        quiz_authoring,
    },
};

const ATTEMPT_COLUMNS: &str =
    "id, user_id, course_id, course_section_id, total_questions, correct_answers, submitted_at";

const ANSWER_COLUMNS: &str = "id, course_quiz_attempt_id, course_quiz_id, course_quiz_option_id, \
                              is_correct, created_at, updated_at";

/// Result of a submission that passed the access gates.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A new attempt was graded and stored (201).
    Created(SubmitQuizResponse),
    /// The student had already submitted this section (409); carries the
    /// stored attempt unchanged.
    AlreadySubmitted(SubmitQuizResponse),
}

#[derive(Debug, FromRow)]
struct SectionCourse {
    section_id: i64,
    course_id: Option<i64>,
}

/// Role, section/course existence and enrollment gates shared by the
/// student endpoints. Returns the section's course id.
async fn authorize_student(pool: &PgPool, actor: Actor, section_id: i64) -> Result<i64, AppError> {
    if actor.role != Role::Student {
        return Err(AppError::Forbidden(
            "Only students can take section quizzes".to_string(),
        ));
    }

    let section = sqlx::query_as::<_, SectionCourse>(
        r#"
        SELECT s.id AS section_id, c.id AS course_id
        FROM course_sections s
        LEFT JOIN courses c ON c.id = s.course_id
        WHERE s.id = $1
        "#,
    )
    .bind(section_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Section not found".to_string()))?;

    let course_id = section
        .course_id
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

    if !enrollment::is_enrolled(pool, actor.id, course_id).await? {
        tracing::debug!(
            user_id = actor.id,
            section_id = section.section_id,
            "Student not enrolled, reporting not found"
        );
        return Err(AppError::NotFound("Section not found".to_string()));
    }

    Ok(course_id)
}

pub async fn find_attempt(
    pool: &PgPool,
    user_id: i64,
    section_id: i64,
) -> Result<Option<AttemptResponse>, sqlx::Error> {
    let attempt = sqlx::query_as::<_, CourseQuizAttempt>(&format!(
        "SELECT {} FROM course_quiz_attempts WHERE user_id = $1 AND course_section_id = $2",
        ATTEMPT_COLUMNS
    ))
    .bind(user_id)
    .bind(section_id)
    .fetch_optional(pool)
    .await?;

    let Some(attempt) = attempt else {
        return Ok(None);
    };

    let answers = sqlx::query_as::<_, CourseQuizAttemptAnswer>(&format!(
        "SELECT {} FROM course_quiz_attempt_answers WHERE course_quiz_attempt_id = $1 ORDER BY id",
        ANSWER_COLUMNS
    ))
    .bind(attempt.id)
    .fetch_all(pool)
    .await?;

    Ok(Some(AttemptResponse::new(attempt, answers)))
}

async fn load_option_keys(
    pool: &PgPool,
    answers: &[AnswerInput],
) -> Result<HashMap<i64, OptionKey>, sqlx::Error> {
    if answers.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT id, course_quiz_id, is_correct FROM course_quiz_options WHERE id IN (");
    let mut separated = builder.separated(",");
    for answer in answers {
        separated.push_bind(answer.option_id);
    }
    separated.push_unseparated(")");

    let keys: Vec<OptionKey> = builder.build_query_as().fetch_all(pool).await?;
    Ok(keys.into_iter().map(|k| (k.id, k)).collect())
}

fn already_submitted(attempt: AttemptResponse, section_id: i64) -> SubmitOutcome {
    SubmitOutcome::AlreadySubmitted(SubmitQuizResponse {
        message: format!(
            "You have already submitted this quiz. You answered {} of {} correctly.",
            attempt.correct_answers, attempt.total_questions
        ),
        attempt,
        section_id,
    })
}

/// Submits a student's answers for every quiz in a section.
///
/// Gates run in order (role 403, section/course 404, enrollment 404,
/// existing attempt 409), then the whole answer set is validated before
/// anything is graded (422). The attempt and its answers are written in
/// one transaction. A unique violation on the attempt insert means another
/// request won the race; that is reported as 409 with the stored attempt.
pub async fn submit_section_quiz(
    pool: &PgPool,
    actor: Actor,
    section_id: i64,
    answers: &[AnswerInput],
) -> Result<SubmitOutcome, AppError> {
    let course_id = authorize_student(pool, actor, section_id).await?;

    if let Some(existing) = find_attempt(pool, actor.id, section_id).await? {
        return Ok(already_submitted(existing, section_id));
    }

    let section_quiz_ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM course_quizzes WHERE course_section_id = $1",
    )
    .bind(section_id)
    .fetch_all(pool)
    .await?;

    let reject = |e: GradingError| {
        tracing::info!(user_id = actor.id, section_id, error = %e, "Quiz submission rejected");
        AppError::from(e)
    };

    // Bounds the option lookup below by the section's quiz count.
    grading::check_answer_set(&section_quiz_ids, answers).map_err(reject)?;

    let options = load_option_keys(pool, answers).await?;

    let graded = grading::grade_submission(&section_quiz_ids, answers, &options).map_err(reject)?;

    match persist_attempt(pool, actor.id, course_id, section_id, &graded).await {
        Ok(attempt) => {
            tracing::info!(
                user_id = actor.id,
                section_id,
                correct = attempt.correct_answers,
                total = attempt.total_questions,
                "Quiz attempt submitted"
            );
            let message = completion_message(attempt.correct_answers, attempt.total_questions);
            Ok(SubmitOutcome::Created(SubmitQuizResponse {
                attempt,
                section_id,
                message,
            }))
        }
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!(
                user_id = actor.id,
                section_id,
                "Concurrent quiz submission lost the race"
            );
            let existing = find_attempt(pool, actor.id, section_id)
                .await?
                .ok_or(AppError::Conflict("Quiz already submitted".to_string()))?;
            Ok(already_submitted(existing, section_id))
        }
        Err(e) => {
            tracing::error!("Failed to persist quiz attempt: {:?}", e);
            Err(AppError::from(e))
        }
    }
}

/// Writes the attempt and its answers. Dropping the transaction on any
/// error rolls both back.
async fn persist_attempt(
    pool: &PgPool,
    user_id: i64,
    course_id: i64,
    section_id: i64,
    graded: &GradedSubmission,
) -> Result<AttemptResponse, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let attempt_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO course_quiz_attempts
            (user_id, course_id, course_section_id, total_questions, correct_answers, submitted_at)
        VALUES ($1, $2, $3, $4, 0, CURRENT_TIMESTAMP)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(section_id)
    .bind(graded.total_questions)
    .fetch_one(&mut *tx)
    .await?;

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO course_quiz_attempt_answers \
         (course_quiz_attempt_id, course_quiz_id, course_quiz_option_id, is_correct) ",
    );
    builder.push_values(&graded.answers, |mut row, answer| {
        row.push_bind(attempt_id)
            .push_bind(answer.quiz_id)
            .push_bind(answer.option_id)
            .push_bind(answer.is_correct);
    });
    builder.push(format!(" RETURNING {}", ANSWER_COLUMNS));
    let mut answers: Vec<CourseQuizAttemptAnswer> =
        builder.build_query_as().fetch_all(&mut *tx).await?;
    answers.sort_by_key(|a| a.id);

    let attempt = sqlx::query_as::<_, CourseQuizAttempt>(&format!(
        "UPDATE course_quiz_attempts SET correct_answers = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 RETURNING {}",
        ATTEMPT_COLUMNS
    ))
    .bind(graded.correct_answers)
    .bind(attempt_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(AttemptResponse::new(attempt, answers))
}

/// Quiz content of a section for an enrolled student, plus their attempt.
/// Correct options and explanations are only revealed after submitting.
pub async fn section_content(
    pool: &PgPool,
    actor: Actor,
    section_id: i64,
) -> Result<SectionQuizContent, AppError> {
    authorize_student(pool, actor, section_id).await?;

    let attempt = find_attempt(pool, actor.id, section_id).await?;
    let quizzes = quiz_authoring::list_section_quizzes(pool, section_id).await?;
    let quiz_ids: Vec<i64> = quizzes.iter().map(|q| q.id).collect();
    let mut options = quiz_authoring::load_options(pool, &quiz_ids).await?;

    let reveal = attempt.is_some();
    let quizzes = quizzes
        .into_iter()
        .map(|quiz| {
            let quiz_options = options.remove(&quiz.id).unwrap_or_default();
            StudentQuizView::build(quiz, quiz_options, reveal)
        })
        .collect();

    Ok(SectionQuizContent {
        section_id,
        quizzes,
        attempt,
    })
}
