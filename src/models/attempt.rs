// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::quiz::StudentQuizView;

/// Represents the 'course_quiz_attempts' table.
/// One immutable row per (user, section).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseQuizAttempt {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub course_section_id: i64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'course_quiz_attempt_answers' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseQuizAttemptAnswer {
    pub id: i64,
    pub course_quiz_attempt_id: i64,
    pub course_quiz_id: i64,
    /// Cleared if the option is later removed by an option-set replacement.
    pub course_quiz_option_id: Option<i64>,
    pub is_correct: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// One answer in a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerInput {
    pub quiz_id: i64,
    pub option_id: i64,
}

/// DTO for submitting a section's quiz answers.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Serialize)]
pub struct AttemptAnswerResponse {
    pub id: i64,
    pub course_quiz_id: i64,
    pub course_quiz_option_id: Option<i64>,
    pub is_correct: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CourseQuizAttemptAnswer> for AttemptAnswerResponse {
    fn from(a: CourseQuizAttemptAnswer) -> Self {
        Self {
            id: a.id,
            course_quiz_id: a.course_quiz_id,
            course_quiz_option_id: a.course_quiz_option_id,
            is_correct: a.is_correct,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// An attempt together with its answers, as returned to the student.
#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub id: i64,
    pub course_section_id: i64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub answers: Vec<AttemptAnswerResponse>,
}

impl AttemptResponse {
    pub fn new(attempt: CourseQuizAttempt, answers: Vec<CourseQuizAttemptAnswer>) -> Self {
        Self {
            id: attempt.id,
            course_section_id: attempt.course_section_id,
            total_questions: attempt.total_questions,
            correct_answers: attempt.correct_answers,
            submitted_at: attempt.submitted_at,
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Body of the submit endpoint, used for both 201 and 409.
#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    #[serde(flatten)]
    pub attempt: AttemptResponse,
    pub section_id: i64,
    pub message: String,
}

/// Section quiz content for a student, with their prior attempt if any.
#[derive(Debug, Serialize)]
pub struct SectionQuizContent {
    pub section_id: i64,
    pub quizzes: Vec<StudentQuizView>,
    pub attempt: Option<AttemptResponse>,
}

/// Human-readable summary for a completed attempt.
pub fn completion_message(correct_answers: i32, total_questions: i32) -> String {
    format!(
        "Quiz completed. You answered {} of {} correctly.",
        correct_answers, total_questions
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_message() {
        assert_eq!(
            completion_message(1, 2),
            "Quiz completed. You answered 1 of 2 correctly."
        );
    }

    #[test]
    fn test_submit_request_parses_answers() {
        let req: SubmitQuizRequest = serde_json::from_value(serde_json::json!({
            "answers": [{ "quiz_id": 1, "option_id": 11 }, { "quiz_id": 2, "option_id": 21 }]
        }))
        .unwrap();
        assert_eq!(req.answers.len(), 2);
        assert_eq!(req.answers[1], AnswerInput { quiz_id: 2, option_id: 21 });
    }

    #[test]
    fn test_submit_response_is_flat() {
        let now = chrono::Utc::now();
        let attempt = CourseQuizAttempt {
            id: 5,
            user_id: 3,
            course_id: 2,
            course_section_id: 7,
            total_questions: 2,
            correct_answers: 1,
            submitted_at: now,
        };
        let body = serde_json::to_value(SubmitQuizResponse {
            attempt: AttemptResponse::new(attempt, Vec::new()),
            section_id: 7,
            message: completion_message(1, 2),
        })
        .unwrap();

        assert_eq!(body["id"], 5);
        assert_eq!(body["course_section_id"], 7);
        assert_eq!(body["section_id"], 7);
        assert_eq!(body["correct_answers"], 1);
        assert!(body["answers"].as_array().unwrap().is_empty());
        assert!(body.get("user_id").is_none());
    }
}
