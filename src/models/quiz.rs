// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'course_quizzes' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseQuiz {
    pub id: i64,
    pub course_section_id: i64,
    pub question: String,
    pub explanation: Option<String>,
    pub sort_order: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'course_quiz_options' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseQuizOption {
    pub id: i64,
    pub course_quiz_id: i64,
    /// Display label ("A", "B", ...).
    pub label: String,
    pub text: String,
    pub is_correct: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Authoring view: a quiz with its full option set, correctness included.
#[derive(Debug, Serialize)]
pub struct QuizResponse {
    #[serde(flatten)]
    pub quiz: CourseQuiz,
    pub options: Vec<CourseQuizOption>,
}

/// One option as submitted by an author.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizOptionInput {
    #[validate(length(min = 1, max = 10))]
    pub label: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub text: String,
    pub is_correct: bool,
}

/// DTO for creating a quiz question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 500))]
    pub question: String,
    pub explanation: Option<String>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    #[validate(
        length(min = 2, max = 10, message = "A quiz needs between 2 and 10 options."),
        nested,
        custom(function = validate_has_correct_option)
    )]
    pub options: Vec<QuizOptionInput>,
}

/// DTO for updating a quiz. Fields are optional; a supplied `options`
/// array replaces the whole option set.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 500))]
    pub question: Option<String>,
    pub explanation: Option<String>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    #[validate(
        length(min = 2, max = 10, message = "A quiz needs between 2 and 10 options."),
        nested,
        custom(function = validate_has_correct_option)
    )]
    pub options: Option<Vec<QuizOptionInput>>,
}

impl UpdateQuizRequest {
    pub fn is_empty(&self) -> bool {
        self.question.is_none()
            && self.explanation.is_none()
            && self.sort_order.is_none()
            && self.options.is_none()
    }
}

fn validate_has_correct_option(options: &[QuizOptionInput]) -> Result<(), ValidationError> {
    if options.iter().any(|o| o.is_correct) {
        return Ok(());
    }
    Err(ValidationError::new("no_correct_option")
        .with_message("At least one option must be marked as correct.".into()))
}

/// Student view of an option. `is_correct` is only present once the
/// student has an attempt for the section.
#[derive(Debug, Serialize)]
pub struct StudentOptionView {
    pub id: i64,
    pub label: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Student view of a quiz question.
#[derive(Debug, Serialize)]
pub struct StudentQuizView {
    pub id: i64,
    pub question: String,
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub options: Vec<StudentOptionView>,
}

impl StudentQuizView {
    /// Builds the student view, revealing answers only when `reveal` is set.
    pub fn build(quiz: CourseQuiz, options: Vec<CourseQuizOption>, reveal: bool) -> Self {
        Self {
            id: quiz.id,
            question: quiz.question,
            sort_order: quiz.sort_order,
            explanation: if reveal { quiz.explanation } else { None },
            options: options
                .into_iter()
                .map(|o| StudentOptionView {
                    id: o.id,
                    label: o.label,
                    text: o.text,
                    is_correct: reveal.then_some(o.is_correct),
                })
                .collect(),
        }
    }
}
