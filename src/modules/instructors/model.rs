use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Instructor profile attached to a user account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Instructor {
    pub id: i32,
    pub user_id: i32,
    pub bio: Option<String>,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Instructor profile joined with the owning user's identity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct InstructorDetail {
    pub id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInstructorDto {
    pub user_id: i32,
    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 100, message = "Specialty must be at most 100 characters"))]
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateInstructorDto {
    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 100, message = "Specialty must be at most 100 characters"))]
    pub specialty: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn oversized_specialty_fails_validation() {
        let dto = UpdateInstructorDto {
            bio: None,
            specialty: Some("x".repeat(101)),
        };
        assert!(dto.validate().is_err());
    }
}
