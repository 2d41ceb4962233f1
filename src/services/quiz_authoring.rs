// src/services/quiz_authoring.rs

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    config::{MAX_QUIZ_OPTIONS, MIN_QUIZ_OPTIONS, OPTION_TEXT_MAX_LEN, QUESTION_MAX_LEN},
    error::AppError,
    models::quiz::{
        CourseQuiz, CourseQuizOption, CreateQuizRequest, QuizOptionInput, QuizResponse,
        UpdateQuizRequest,
    },
    utils::html::clean_optional,
};

const QUIZ_COLUMNS: &str =
    "id, course_section_id, question, explanation, sort_order, created_at, updated_at";

const OPTION_COLUMNS: &str = "id, course_quiz_id, label, text, is_correct, created_at, updated_at";

/// An option ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOption {
    pub label: String,
    pub text: String,
    pub is_correct: bool,
}

/// Positional label: 0 → "A", 1 → "B", ...
pub fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Questions and option texts are plain text: stored as written apart from
/// trimming, and never blank or longer than `max` characters.
pub fn plain_text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} must not be blank.", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters.",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Precondition of every option-set replacement: 2..=10 options, at least
/// one correct. Missing labels are filled in by position.
pub fn normalize_options(inputs: &[QuizOptionInput]) -> Result<Vec<NewOption>, AppError> {
    if inputs.len() < MIN_QUIZ_OPTIONS || inputs.len() > MAX_QUIZ_OPTIONS {
        return Err(AppError::Validation(format!(
            "A quiz needs between {} and {} options.",
            MIN_QUIZ_OPTIONS, MAX_QUIZ_OPTIONS
        )));
    }

    if !inputs.iter().any(|o| o.is_correct) {
        return Err(AppError::Validation(
            "At least one option must be marked as correct.".to_string(),
        ));
    }

    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            Ok(NewOption {
                label: input
                    .label
                    .as_deref()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| option_label(index)),
                text: plain_text("Option text", &input.text, OPTION_TEXT_MAX_LEN)?,
                is_correct: input.is_correct,
            })
        })
        .collect()
}

async fn next_sort_order(conn: &mut PgConnection, section_id: i64) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM course_quizzes WHERE course_section_id = $1",
    )
    .bind(section_id)
    .fetch_one(conn)
    .await
}

/// Deletes the quiz's options and inserts `options` in their place.
async fn replace_options(
    conn: &mut PgConnection,
    quiz_id: i64,
    options: &[NewOption],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM course_quiz_options WHERE course_quiz_id = $1")
        .bind(quiz_id)
        .execute(&mut *conn)
        .await?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO course_quiz_options (course_quiz_id, label, text, is_correct) ");
    builder.push_values(options, |mut row, option| {
        row.push_bind(quiz_id)
            .push_bind(option.label.clone())
            .push_bind(option.text.clone())
            .push_bind(option.is_correct);
    });
    builder.build().execute(&mut *conn).await?;

    Ok(())
}

/// Loads options for a set of quizzes, keyed by quiz id, in insertion order.
pub async fn load_options(
    pool: &PgPool,
    quiz_ids: &[i64],
) -> Result<HashMap<i64, Vec<CourseQuizOption>>, sqlx::Error> {
    let mut grouped: HashMap<i64, Vec<CourseQuizOption>> = HashMap::new();
    if quiz_ids.is_empty() {
        return Ok(grouped);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM course_quiz_options WHERE course_quiz_id IN (",
        OPTION_COLUMNS
    ));
    let mut separated = builder.separated(",");
    for id in quiz_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY course_quiz_id, id");

    let options: Vec<CourseQuizOption> = builder.build_query_as().fetch_all(pool).await?;
    for option in options {
        grouped.entry(option.course_quiz_id).or_default().push(option);
    }

    Ok(grouped)
}

/// Quizzes of a section ordered by `sort_order`, then creation time.
pub async fn list_section_quizzes(
    pool: &PgPool,
    section_id: i64,
) -> Result<Vec<CourseQuiz>, sqlx::Error> {
    sqlx::query_as::<_, CourseQuiz>(&format!(
        "SELECT {} FROM course_quizzes WHERE course_section_id = $1 \
         ORDER BY sort_order ASC NULLS LAST, created_at ASC, id ASC",
        QUIZ_COLUMNS
    ))
    .bind(section_id)
    .fetch_all(pool)
    .await
}

/// Fetches a quiz with its options.
pub async fn find_quiz(pool: &PgPool, quiz_id: i64) -> Result<QuizResponse, AppError> {
    let quiz = sqlx::query_as::<_, CourseQuiz>(&format!(
        "SELECT {} FROM course_quizzes WHERE id = $1",
        QUIZ_COLUMNS
    ))
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let options = load_options(pool, &[quiz.id])
        .await?
        .remove(&quiz.id)
        .unwrap_or_default();

    Ok(QuizResponse { quiz, options })
}

/// Creates a quiz and its option set in one transaction.
pub async fn create_quiz(
    pool: &PgPool,
    section_id: i64,
    payload: CreateQuizRequest,
) -> Result<QuizResponse, AppError> {
    let question = plain_text("Question", &payload.question, QUESTION_MAX_LEN)?;
    let options = normalize_options(&payload.options)?;

    let mut tx = pool.begin().await?;

    let sort_order = match payload.sort_order {
        Some(order) => order,
        None => next_sort_order(&mut *tx, section_id).await?,
    };

    let quiz_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO course_quizzes (course_section_id, question, explanation, sort_order)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(section_id)
    .bind(question)
    .bind(clean_optional(payload.explanation.as_deref()))
    .bind(sort_order)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    replace_options(&mut *tx, quiz_id, &options).await?;

    tx.commit().await?;

    tracing::info!(quiz_id, section_id, options = options.len(), "Quiz created");

    find_quiz(pool, quiz_id).await
}

/// Applies a partial update. A supplied option set replaces the old one
/// in the same transaction.
pub async fn update_quiz(
    pool: &PgPool,
    section_id: i64,
    quiz_id: i64,
    payload: UpdateQuizRequest,
) -> Result<QuizResponse, AppError> {
    if payload.is_empty() {
        return find_quiz(pool, quiz_id).await;
    }

    let question = payload
        .question
        .as_deref()
        .map(|q| plain_text("Question", q, QUESTION_MAX_LEN))
        .transpose()?;
    let options = payload.options.as_deref().map(normalize_options).transpose()?;

    let mut tx = pool.begin().await?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE course_quizzes SET ");
    let mut separated = builder.separated(", ");
    separated.push("updated_at = CURRENT_TIMESTAMP");

    if let Some(question) = question {
        separated.push("question = ");
        separated.push_bind_unseparated(question);
    }

    if let Some(explanation) = payload.explanation {
        separated.push("explanation = ");
        separated.push_bind_unseparated(clean_optional(Some(explanation.as_str())));
    }

    if let Some(sort_order) = payload.sort_order {
        separated.push("sort_order = ");
        separated.push_bind_unseparated(sort_order);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(quiz_id);
    builder.push(" AND course_section_id = ");
    builder.push_bind(section_id);

    let result = builder.build().execute(&mut *tx).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    if let Some(options) = &options {
        replace_options(&mut *tx, quiz_id, options).await?;
    }

    tx.commit().await?;

    tracing::info!(
        quiz_id,
        section_id,
        options_replaced = options.is_some(),
        "Quiz updated"
    );

    find_quiz(pool, quiz_id).await
}

/// Deletes a quiz. Options and attempt answers go with it.
pub async fn delete_quiz(pool: &PgPool, section_id: i64, quiz_id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM course_quizzes WHERE id = $1 AND course_section_id = $2")
        .bind(quiz_id)
        .bind(section_id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!(quiz_id, section_id, "Quiz deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(label: Option<&str>, text: &str, is_correct: bool) -> QuizOptionInput {
        QuizOptionInput {
            label: label.map(str::to_string),
            text: text.to_string(),
            is_correct,
        }
    }

    #[test]
    fn test_option_labels() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(2), "C");
        assert_eq!(option_label(9), "J");
    }

    #[test]
    fn test_normalize_fills_missing_labels_by_position() {
        let options = normalize_options(&[
            input(None, "Paris", true),
            input(Some("x"), "Rome", false),
            input(Some("  "), "Berlin", false),
        ])
        .unwrap();

        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "x", "C"]);
        assert!(options[0].is_correct);
    }

    #[test]
    fn test_normalize_rejects_no_correct_option() {
        let err = normalize_options(&[input(None, "a", false), input(None, "b", false)]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_normalize_enforces_bounds() {
        assert!(normalize_options(&[input(None, "a", true)]).is_err());

        let many: Vec<QuizOptionInput> = (0..11).map(|i| input(None, &i.to_string(), true)).collect();
        assert!(normalize_options(&many).is_err());

        let ten: Vec<QuizOptionInput> = (0..10).map(|i| input(None, &i.to_string(), i == 3)).collect();
        assert_eq!(normalize_options(&ten).unwrap().len(), 10);
    }

    #[test]
    fn test_normalize_keeps_text_as_written() {
        let options = normalize_options(&[
            input(None, "  a<b && b<c  ", true),
            input(None, "<script>x()</script>", false),
        ])
        .unwrap();
        assert_eq!(options[0].text, "a<b && b<c");
        assert_eq!(options[1].text, "<script>x()</script>");
    }

    #[test]
    fn test_normalize_rejects_blank_text() {
        let err = normalize_options(&[input(None, "   ", true), input(None, "b", false)]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_plain_text_limits_count_characters() {
        let at_limit = format!("{}&", "é".repeat(QUESTION_MAX_LEN - 1));
        assert_eq!(plain_text("Question", &at_limit, QUESTION_MAX_LEN).unwrap(), at_limit);

        let over = "x".repeat(QUESTION_MAX_LEN + 1);
        assert!(plain_text("Question", &over, QUESTION_MAX_LEN).is_err());

        let padded = format!("  {}  ", "x".repeat(QUESTION_MAX_LEN));
        assert_eq!(plain_text("Question", &padded, QUESTION_MAX_LEN).unwrap().len(), QUESTION_MAX_LEN);
    }
}
