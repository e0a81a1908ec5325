//! User entity, role model, and user-management DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};

/// The closed set of platform roles.
///
/// Serialized as lowercase strings both in JWT claims and in the `users.role`
/// column. There is no implicit role: a token or row with an unknown role
/// value is rejected, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<UserRole> {
        match s {
            "student" => Some(UserRole::Student),
            "instructor" => Some(UserRole::Instructor),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// A user row, without the password hash.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub date_of_birth: NaiveDate,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for updating the caller's own profile.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// DTO for changing the caller's password. The current password is verified
/// first, and all outstanding refresh tokens are revoked on success.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

/// Query parameters for filtering users (admin listing).
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserFilterParams {
    pub email: Option<String>,
    pub role: Option<UserRole>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Student, UserRole::Instructor, UserRole::Admin] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert_eq!(UserRole::parse("superuser"), None);
        assert_eq!(UserRole::parse(""), None);
        assert_eq!(UserRole::parse("Admin"), None);
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserRole::Instructor).unwrap(),
            r#""instructor""#
        );
        let parsed: UserRole = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(parsed, UserRole::Admin);
    }

    #[test]
    fn test_update_profile_dto_validation() {
        let dto = UpdateProfileDto {
            first_name: Some("Ana".to_string()),
            last_name: None,
            date_of_birth: None,
        };
        assert!(dto.validate().is_ok());

        let empty = UpdateProfileDto {
            first_name: Some("".to_string()),
            last_name: None,
            date_of_birth: None,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_change_password_dto_validation() {
        let dto = ChangePasswordDto {
            current_password: "old-password".to_string(),
            new_password: "new-password-123".to_string(),
        };
        assert!(dto.validate().is_ok());

        let short = ChangePasswordDto {
            current_password: "old-password".to_string(),
            new_password: "short".to_string(),
        };
        assert!(short.validate().is_err());
    }
}
