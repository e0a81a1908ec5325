use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::pagination::{PaginationMeta, PaginationParams};

/// Lifecycle state of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Cancelled,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Cancelled => "cancelled",
            EnrollmentStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Enrollment {
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    pub status: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Enrollment joined with student and course identity, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EnrollmentDetail {
    pub id: i32,
    pub student_id: i32,
    pub student_name: String,
    pub course_id: i32,
    pub course_title: String,
    pub status: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Optional body for the enroll endpoint. Students always enroll
/// themselves; instructors and admins must name the student.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EnrollDto {
    pub student_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrollmentFilterParams {
    #[serde(default, deserialize_with = "crate::utils::pagination::deserialize_optional_i32")]
    pub course_id: Option<i32>,
    pub status: Option<EnrollmentStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedEnrollmentsResponse {
    pub data: Vec<EnrollmentDetail>,
    pub meta: PaginationMeta,
}

/// Per-course completion summary for one student.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    pub enrollment_id: i32,
    pub course_id: i32,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub percent_complete: f64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&EnrollmentStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn status_as_str_matches_serde() {
        for status in [
            EnrollmentStatus::Active,
            EnrollmentStatus::Cancelled,
            EnrollmentStatus::Completed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
        }
    }
}
