// src/services/ownership.rs

use sqlx::{FromRow, PgPool};

use crate::{
    error::AppError,
    models::user::{Actor, Role},
};

/// The quiz → section → course → instructor chain for one request.
///
/// `quiz_section_id` is `None` when no quiz was requested or the requested
/// quiz does not exist.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OwnershipChain {
    pub section_id: i64,
    pub course_id: i64,
    pub instructor_id: Option<i64>,
    pub quiz_section_id: Option<i64>,
}

impl OwnershipChain {
    /// True when the requested quiz (if any) sits in this section.
    pub fn links_quiz(&self, quiz_requested: bool) -> bool {
        !quiz_requested || self.quiz_section_id == Some(self.section_id)
    }
}

/// Whether `instructor_id` may author in the section (and quiz) the chain
/// describes.
pub fn instructor_owns(chain: &OwnershipChain, instructor_id: i64, quiz_requested: bool) -> bool {
    chain.instructor_id == Some(instructor_id) && chain.links_quiz(quiz_requested)
}

/// Loads the chain for a section and, optionally, a quiz inside it.
pub async fn load_chain(
    pool: &PgPool,
    section_id: i64,
    quiz_id: Option<i64>,
) -> Result<Option<OwnershipChain>, sqlx::Error> {
    sqlx::query_as::<_, OwnershipChain>(
        r#"
        SELECT
            s.id AS section_id,
            c.id AS course_id,
            c.instructor_id,
            q.course_section_id AS quiz_section_id
        FROM course_sections s
        JOIN courses c ON c.id = s.course_id
        LEFT JOIN course_quizzes q ON q.id = $2
        WHERE s.id = $1
        "#,
    )
    .bind(section_id)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await
}

/// Resolves the chain and checks the actor may author there.
///
/// Admins pass on any existing section; instructors must own the course.
/// Every miss is reported as 404 so non-owners learn nothing.
pub async fn authorize_authoring(
    pool: &PgPool,
    actor: Actor,
    section_id: i64,
    quiz_id: Option<i64>,
) -> Result<OwnershipChain, AppError> {
    let not_found = || {
        if quiz_id.is_some() {
            AppError::NotFound("Quiz not found".to_string())
        } else {
            AppError::NotFound("Section not found".to_string())
        }
    };

    let chain = load_chain(pool, section_id, quiz_id).await.map_err(|e| {
        tracing::error!("Failed to load ownership chain: {:?}", e);
        AppError::from(e)
    })?;
    let chain = chain.ok_or_else(not_found)?;

    let allowed = match actor.role {
        Role::Admin => chain.links_quiz(quiz_id.is_some()),
        Role::Instructor => instructor_owns(&chain, actor.id, quiz_id.is_some()),
        Role::Student => {
            return Err(AppError::Forbidden(
                "Authoring requires an admin or instructor role".to_string(),
            ));
        }
    };

    if !allowed {
        tracing::debug!(
            user_id = actor.id,
            section_id,
            ?quiz_id,
            "Authoring denied, reporting not found"
        );
        return Err(not_found());
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(instructor_id: Option<i64>, quiz_section_id: Option<i64>) -> OwnershipChain {
        OwnershipChain {
            section_id: 10,
            course_id: 1,
            instructor_id,
            quiz_section_id,
        }
    }

    #[test]
    fn test_owner_may_author_section() {
        assert!(instructor_owns(&chain(Some(7), None), 7, false));
    }

    #[test]
    fn test_other_instructor_denied() {
        assert!(!instructor_owns(&chain(Some(7), None), 8, false));
    }

    #[test]
    fn test_course_without_instructor_denied() {
        assert!(!instructor_owns(&chain(None, None), 7, false));
    }

    #[test]
    fn test_owner_with_quiz_in_section() {
        assert!(instructor_owns(&chain(Some(7), Some(10)), 7, true));
    }

    #[test]
    fn test_owner_with_quiz_from_other_section() {
        assert!(!instructor_owns(&chain(Some(7), Some(11)), 7, true));
    }

    #[test]
    fn test_owner_with_missing_quiz() {
        assert!(!instructor_owns(&chain(Some(7), None), 7, true));
    }
}
