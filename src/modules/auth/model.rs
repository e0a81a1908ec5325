use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::users::model::{User, UserRole};

/// Decoded access-token payload.
///
/// `role` is a required claim: tokens minted before the role claim existed
/// fail decoding instead of being treated as role-less.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

/// A persisted refresh token row.
///
/// Opaque to clients; redemption checks `expires_at` and `revoked_at` before
/// minting anything. Rows cascade-delete with the owning user.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: i32,
    pub token: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_by_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Request provenance recorded when a refresh token is issued.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub date_of_birth: NaiveDate,
    /// Defaults to `student`. Registering as `admin` is not allowed.
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LogoutRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_state_checks() {
        let mut token = RefreshToken {
            id: 1,
            token: "opaque".to_string(),
            user_id: 7,
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::days(7),
            revoked_at: None,
            created_by_ip: Some("127.0.0.1".to_string()),
            user_agent: None,
        };
        assert!(!token.is_revoked());
        assert!(!token.is_expired());

        token.revoked_at = Some(Utc::now() - chrono::Duration::minutes(5));
        assert!(token.is_revoked());

        token.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(token.is_expired());
    }

    #[test]
    fn test_register_dto_validation() {
        let dto = RegisterRequestDto {
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            email: "ana@example.com".to_string(),
            password: "long-enough-password".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            role: None,
        };
        assert!(dto.validate().is_ok());

        let bad_email = RegisterRequestDto {
            email: "not-an-email".to_string(),
            ..dto
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_claims_deserialize_requires_role() {
        let with_role =
            r#"{"sub":"1","email":"a@b.com","role":"student","exp":9999999999,"iat":0}"#;
        assert!(serde_json::from_str::<Claims>(with_role).is_ok());

        let without_role = r#"{"sub":"1","email":"a@b.com","exp":9999999999,"iat":0}"#;
        assert!(serde_json::from_str::<Claims>(without_role).is_err());
    }
}
