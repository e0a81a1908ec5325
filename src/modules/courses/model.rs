//! Course catalog models: courses, their modules, and lessons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};

/// Publication state of a course.
///
/// Instructors move a course into the pending states; an admin approves the
/// request, landing on `published` or back on `draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    PendingPublish,
    Published,
    PendingUnpublish,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "draft",
            CourseStatus::PendingPublish => "pending_publish",
            CourseStatus::Published => "published",
            CourseStatus::PendingUnpublish => "pending_unpublish",
        }
    }

    pub fn parse(s: &str) -> Option<CourseStatus> {
        match s {
            "draft" => Some(CourseStatus::Draft),
            "pending_publish" => Some(CourseStatus::PendingPublish),
            "published" => Some(CourseStatus::Published),
            "pending_unpublish" => Some(CourseStatus::PendingUnpublish),
            _ => None,
        }
    }

    /// The publication workflow's transition table.
    pub fn can_transition_to(self, next: CourseStatus) -> bool {
        matches!(
            (self, next),
            (CourseStatus::Draft, CourseStatus::PendingPublish)
                | (CourseStatus::PendingPublish, CourseStatus::Published)
                | (CourseStatus::Published, CourseStatus::PendingUnpublish)
                | (CourseStatus::PendingUnpublish, CourseStatus::Draft)
        )
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub workload_hours: i32,
    pub category_id: i32,
    pub level_id: i32,
    /// User id of the owning instructor.
    pub instructor_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course joined with the display names of its category, level, and
/// instructor.
#[derive(Serialize, FromRow, Debug, Clone, ToSchema)]
pub struct CourseDetail {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub workload_hours: i32,
    pub category_id: i32,
    pub category: String,
    pub level_id: i32,
    pub level: String,
    pub instructor_id: i32,
    pub instructor: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct CourseModule {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub position: i32,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Lesson {
    pub id: i32,
    pub module_id: i32,
    pub title: String,
    pub content_url: Option<String>,
    pub duration_minutes: i32,
    pub position: i32,
}

/// A course module together with its ordered lessons.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ModuleWithLessons {
    #[serde(flatten)]
    pub module: CourseModule,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1))]
    pub workload_hours: i32,
    pub category_id: i32,
    pub level_id: i32,
    /// Only honored for admins; instructors always own what they create.
    pub instructor_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 1))]
    pub workload_hours: Option<i32>,
    pub category_id: Option<i32>,
    pub level_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateModuleDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1))]
    pub position: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLessonDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content_url: Option<String>,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
    #[validate(range(min = 1))]
    pub position: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CourseFilterParams {
    pub title: Option<String>,
    pub status: Option<CourseStatus>,
    #[serde(default, deserialize_with = "crate::utils::pagination::deserialize_optional_i32")]
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "crate::utils::pagination::deserialize_optional_i32")]
    pub level_id: Option<i32>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub data: Vec<CourseDetail>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [CourseStatus; 4] = [
        CourseStatus::Draft,
        CourseStatus::PendingPublish,
        CourseStatus::Published,
        CourseStatus::PendingUnpublish,
    ];

    #[test]
    fn test_course_status_round_trip() {
        for status in ALL_STATUSES {
            assert_eq!(CourseStatus::parse(status.as_str()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
        }
        assert_eq!(CourseStatus::parse("archived"), None);
    }

    #[test]
    fn test_publication_workflow_transitions() {
        use CourseStatus::*;

        assert!(Draft.can_transition_to(PendingPublish));
        assert!(PendingPublish.can_transition_to(Published));
        assert!(Published.can_transition_to(PendingUnpublish));
        assert!(PendingUnpublish.can_transition_to(Draft));

        // No shortcuts: publication and unpublication both go through a
        // pending state, and no status transitions to itself.
        assert!(!Draft.can_transition_to(Published));
        assert!(!Published.can_transition_to(Draft));
        assert!(!PendingPublish.can_transition_to(PendingUnpublish));
        for status in ALL_STATUSES {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_create_course_dto_validation() {
        let dto = CreateCourseDto {
            title: "Rust for Backends".to_string(),
            description: "From zero to production.".to_string(),
            price: 49.9,
            workload_hours: 40,
            category_id: 1,
            level_id: 1,
            instructor_id: None,
        };
        assert!(dto.validate().is_ok());

        let free = CreateCourseDto { price: 0.0, ..dto };
        assert!(free.validate().is_ok());
    }

    #[test]
    fn test_create_course_dto_rejects_negative_price() {
        let dto = CreateCourseDto {
            title: "T".to_string(),
            description: "D".to_string(),
            price: -1.0,
            workload_hours: 10,
            category_id: 1,
            level_id: 1,
            instructor_id: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_module_with_lessons_flattens() {
        let entry = ModuleWithLessons {
            module: CourseModule {
                id: 1,
                course_id: 2,
                title: "Intro".to_string(),
                position: 1,
            },
            lessons: vec![],
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["title"], "Intro");
        assert!(json["lessons"].as_array().unwrap().is_empty());
    }
}
