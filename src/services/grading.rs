// src/services/grading.rs
//
// Pure validation and scoring of a section submission. Nothing here touches
// the database; callers load the section's quiz ids and the referenced
// options, then hand them over.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{error::AppError, models::attempt::AnswerInput};

/// The facts about an option needed to grade an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct OptionKey {
    pub id: i64,
    #[sqlx(rename = "course_quiz_id")]
    pub quiz_id: i64,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    #[error("Please provide at least one answer.")]
    NoAnswers,

    #[error("Question {0} was answered more than once.")]
    DuplicateQuiz(i64),

    #[error("Question {0} does not belong to this section.")]
    ForeignQuiz(i64),

    #[error("Please answer every question. Expected {expected} answers, got {submitted}.")]
    Incomplete { expected: usize, submitted: usize },

    #[error("Selected option {0} does not exist.")]
    UnknownOption(i64),

    #[error("Option {option_id} does not belong to question {quiz_id}.")]
    OptionMismatch { quiz_id: i64, option_id: i64 },
}

impl From<GradingError> for AppError {
    fn from(err: GradingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradedAnswer {
    pub quiz_id: i64,
    pub option_id: i64,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedSubmission {
    pub answers: Vec<GradedAnswer>,
    pub total_questions: i32,
    pub correct_answers: i32,
}

/// Checks the answered quiz ids against the section's quiz set: non-empty,
/// no duplicates, no foreign quizzes, one answer per quiz. Needs no option
/// data, so it runs before any option is loaded.
pub fn check_answer_set(section_quiz_ids: &[i64], answers: &[AnswerInput]) -> Result<(), GradingError> {
    if answers.is_empty() {
        return Err(GradingError::NoAnswers);
    }

    let section_quizzes: HashSet<i64> = section_quiz_ids.iter().copied().collect();
    let mut seen = HashSet::with_capacity(answers.len());
    for answer in answers {
        if !seen.insert(answer.quiz_id) {
            return Err(GradingError::DuplicateQuiz(answer.quiz_id));
        }
        if !section_quizzes.contains(&answer.quiz_id) {
            return Err(GradingError::ForeignQuiz(answer.quiz_id));
        }
    }

    if answers.len() != section_quizzes.len() {
        return Err(GradingError::Incomplete {
            expected: section_quizzes.len(),
            submitted: answers.len(),
        });
    }

    Ok(())
}

/// Checks every linkage of a submission against the section's quiz set
/// and the loaded options. Fails on the first violation, in this order:
/// empty, duplicate quiz, foreign quiz, incomplete set, unknown option,
/// option/quiz mismatch.
pub fn validate_answers<'a>(
    section_quiz_ids: &[i64],
    answers: &[AnswerInput],
    options: &'a HashMap<i64, OptionKey>,
) -> Result<Vec<(AnswerInput, &'a OptionKey)>, GradingError> {
    check_answer_set(section_quiz_ids, answers)?;

    let mut resolved = Vec::with_capacity(answers.len());
    for answer in answers {
        let option = options
            .get(&answer.option_id)
            .ok_or(GradingError::UnknownOption(answer.option_id))?;
        resolved.push((*answer, option));
    }

    if let Some((answer, _)) = resolved.iter().find(|(a, o)| o.quiz_id != a.quiz_id) {
        return Err(GradingError::OptionMismatch {
            quiz_id: answer.quiz_id,
            option_id: answer.option_id,
        });
    }

    Ok(resolved)
}

/// Tallies already validated answers.
pub fn grade(validated: &[(AnswerInput, &OptionKey)]) -> GradedSubmission {
    let answers: Vec<GradedAnswer> = validated
        .iter()
        .map(|(answer, option)| GradedAnswer {
            quiz_id: answer.quiz_id,
            option_id: answer.option_id,
            is_correct: option.is_correct,
        })
        .collect();

    let correct = answers.iter().filter(|a| a.is_correct).count();

    GradedSubmission {
        total_questions: answers.len() as i32,
        correct_answers: correct as i32,
        answers,
    }
}

/// Validates, then grades. Grading never starts on an invalid submission.
pub fn grade_submission(
    section_quiz_ids: &[i64],
    answers: &[AnswerInput],
    options: &HashMap<i64, OptionKey>,
) -> Result<GradedSubmission, GradingError> {
    let validated = validate_answers(section_quiz_ids, answers, options)?;
    Ok(grade(&validated))
}
