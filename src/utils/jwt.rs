use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::Claims;
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

/// Why a token failed verification. Every variant surfaces to the client as
/// the same 401 so callers cannot probe which check rejected the token; the
/// distinction exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    InvalidSignature,
    Expired,
    Algorithm,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => TokenError::Algorithm,
            _ => TokenError::Malformed,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        tracing::debug!(reason = ?err, "token rejected");
        AppError::unauthorized("Invalid or expired token.")
    }
}

/// Signs an access token for the given user. Expiry is `now + configured
/// minutes` (360 by default).
pub fn create_access_token(
    user_id: i32,
    email: &str,
    role: UserRole,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + (jwt_config.access_token_expiry_minutes as usize) * 60;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

/// Decodes and validates a token: signature, HS256 algorithm, and expiry with
/// zero leeway. Tokens without a `role` claim fail to deserialize and are
/// rejected as malformed rather than treated as role-less.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(TokenError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_for_testing_purposes".to_string(),
            access_token_expiry_minutes: 360,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn test_round_trip() {
        let config = test_config();
        let token = create_access_token(42, "a@b.com", UserRole::Admin, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn test_expiry_matches_configured_ttl() {
        let config = test_config();
        let before = Utc::now().timestamp() as usize;
        let token = create_access_token(1, "a@b.com", UserRole::Student, &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        let expected = before + 360 * 60;
        assert!(claims.exp >= expected && claims.exp <= expected + 5);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let token = create_access_token(1, "a@b.com", UserRole::Student, &config).unwrap();

        let other = JwtConfig {
            secret: "a_completely_different_secret".to_string(),
            ..test_config()
        };
        assert_eq!(
            verify_token(&token, &other),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let config = test_config();
        let token = create_access_token(1, "a@b.com", UserRole::Student, &config).unwrap();

        // Flip one character in the signature segment.
        let mut chars: Vec<char> = token.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(verify_token(&tampered, &config).is_err());
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let config = test_config();
        let token = create_access_token(1, "a@b.com", UserRole::Student, &config).unwrap();

        // Flip a character inside the claims segment.
        let dot = token.find('.').unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let target = dot + 2;
        chars[target] = if chars[target] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(verify_token(&tampered, &config).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "1".to_string(),
            email: "a@b.com".to_string(),
            role: UserRole::Student,
            exp: now - 1,
            iat: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify_token(&token, &config), Err(TokenError::Expired));
    }

    #[test]
    fn test_future_expiry_accepted() {
        let config = test_config();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "1".to_string(),
            email: "a@b.com".to_string(),
            role: UserRole::Student,
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&token, &config).is_ok());
    }

    #[test]
    fn test_token_without_role_fails_closed() {
        // Legacy token shape before the role claim existed.
        #[derive(serde::Serialize)]
        struct LegacyClaims {
            sub: String,
            email: String,
            exp: usize,
            iat: usize,
        }

        let config = test_config();
        let now = Utc::now().timestamp() as usize;
        let legacy = LegacyClaims {
            sub: "1".to_string(),
            email: "a@b.com".to_string(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &legacy,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify_token(&token, &config), Err(TokenError::Malformed));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let config = test_config();
        assert_eq!(
            verify_token("not-a-token", &config),
            Err(TokenError::Malformed)
        );
    }
}
