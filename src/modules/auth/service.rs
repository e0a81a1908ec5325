use chrono::{Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};
use sqlx::PgPool;
use tracing::instrument;

use crate::config::jwt::JwtConfig;
use crate::modules::users::model::{User, UserRole};
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::password::{hash_password, verify_password};

use super::model::{
    ClientInfo, LoginRequest, LoginResponse, RefreshResponse, RefreshToken, RegisterRequestDto,
};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, role, date_of_birth, last_login, created_at, updated_at";

/// Parses the stored role of a user row. The column carries a CHECK
/// constraint, so an unknown value means corrupted data and is rejected
/// rather than coerced to a default role.
fn stored_role(user: &User) -> Result<UserRole, AppError> {
    UserRole::parse(&user.role).ok_or_else(|| {
        AppError::internal(anyhow::anyhow!(
            "Unknown role '{}' on user {}",
            user.role,
            user.id
        ))
    })
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto))]
    pub async fn register_user(db: &PgPool, dto: RegisterRequestDto) -> Result<User, AppError> {
        let role = dto.role.unwrap_or(UserRole::Student);
        if role == UserRole::Admin {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Cannot register as admin"
            )));
        }

        let existing = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
            .bind(&dto.email)
            .fetch_optional(db)
            .await?;

        if existing.is_some() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Email already registered"
            )));
        }

        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, email, password, role, date_of_birth)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(role.as_str())
        .bind(dto.date_of_birth)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
        client: ClientInfo,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: i32,
            password: String,
        }

        let found = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, password FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password."))?;

        if !verify_password(&dto.password, &found.password)? {
            return Err(AppError::unauthorized("Invalid email or password."));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET last_login = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(found.id)
        .fetch_one(db)
        .await?;

        let role = stored_role(&user)?;
        let access_token = create_access_token(user.id, &user.email, role, jwt_config)?;
        let refresh_token = Self::issue_refresh_token(db, user.id, jwt_config, &client).await?;

        Ok(LoginResponse {
            access_token,
            refresh_token: refresh_token.token,
            user,
        })
    }

    /// Mints and persists an opaque refresh token for the user, recording
    /// request provenance.
    #[instrument(skip(db, jwt_config, client))]
    pub async fn issue_refresh_token(
        db: &PgPool,
        user_id: i32,
        jwt_config: &JwtConfig,
        client: &ClientInfo,
    ) -> Result<RefreshToken, AppError> {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();

        let expires_at = Utc::now() + Duration::days(jwt_config.refresh_token_expiry_days);

        let refresh_token = sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (token, user_id, expires_at, created_by_ip, user_agent)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, token, user_id, created_at, expires_at, revoked_at,
                       created_by_ip, user_agent",
        )
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .bind(&client.ip)
        .bind(&client.user_agent)
        .fetch_one(db)
        .await?;

        Ok(refresh_token)
    }

    /// Redeems a refresh token for a fresh access token, rotating the
    /// refresh token in the process.
    ///
    /// Not-found, expired, and revoked tokens are all rejected the same way.
    /// The new access token is minted from the live user record, so a user
    /// deleted or demoted since issuance cannot renew their old role.
    #[instrument(skip(db, presented, jwt_config, client))]
    pub async fn redeem_refresh_token(
        db: &PgPool,
        presented: &str,
        jwt_config: &JwtConfig,
        client: ClientInfo,
    ) -> Result<RefreshResponse, AppError> {
        let rejection = || AppError::unauthorized("Invalid or expired refresh token.");

        let stored = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, token, user_id, created_at, expires_at, revoked_at,
                    created_by_ip, user_agent
             FROM refresh_tokens WHERE token = $1",
        )
        .bind(presented)
        .fetch_optional(db)
        .await?
        .ok_or_else(rejection)?;

        if stored.is_revoked() || stored.is_expired() {
            return Err(rejection());
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(stored.user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(rejection)?;

        Self::revoke_refresh_token(db, presented).await?;

        let role = stored_role(&user)?;
        let access_token = create_access_token(user.id, &user.email, role, jwt_config)?;
        let rotated = Self::issue_refresh_token(db, user.id, jwt_config, &client).await?;

        Ok(RefreshResponse {
            access_token,
            refresh_token: rotated.token,
        })
    }

    /// Marks a refresh token revoked. Idempotent: revoking an unknown or
    /// already-revoked token is not an error.
    #[instrument(skip(db, presented))]
    pub async fn revoke_refresh_token(db: &PgPool, presented: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = now()
             WHERE token = $1 AND revoked_at IS NULL",
        )
        .bind(presented)
        .execute(db)
        .await?;

        Ok(())
    }

    /// Revokes every outstanding refresh token for a user (logout
    /// everywhere, password change).
    #[instrument(skip(db))]
    pub async fn revoke_all_refresh_tokens(db: &PgPool, user_id: i32) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = now()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(db)
        .await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_user_by_id(db: &PgPool, user_id: i32) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::NaiveDate;

    fn user_with_role(role: &str) -> User {
        User {
            id: 7,
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            email: "ana@example.com".to_string(),
            role: role.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stored_role_parses_known_roles() {
        assert_eq!(
            stored_role(&user_with_role("instructor")).unwrap(),
            UserRole::Instructor
        );
        assert_eq!(
            stored_role(&user_with_role("admin")).unwrap(),
            UserRole::Admin
        );
    }

    #[test]
    fn test_unknown_stored_role_is_rejected_not_coerced() {
        for role in ["superuser", "STUDENT", ""] {
            let err = stored_role(&user_with_role(role)).unwrap_err();
            assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR, "role {role:?}");
        }
    }
}
