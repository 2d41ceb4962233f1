// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'courses' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    /// Owning instructor, if any.
    pub instructor_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'course_sections' table.
/// Sections are ordered by `sort_order`, then creation time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseSection {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub sort_order: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'course_enrollments' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseEnrollment {
    pub id: i64,
    pub course_id: i64,
    pub user_id: i64,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub instructor_id: Option<i64>,
}

/// DTO for creating a section inside a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSectionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

/// DTO for enrolling a student in a course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_request_rejects_negative_order() {
        let req = CreateSectionRequest {
            title: "Intro".to_string(),
            sort_order: Some(-1),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_course_request_requires_title() {
        let req = CreateCourseRequest {
            title: String::new(),
            instructor_id: None,
        };
        assert!(req.validate().is_err());
    }
}
