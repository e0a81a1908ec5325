//! Role authorizer: extractors and layers that enforce role allow-lists.
//!
//! Every enforcement point funnels through [`authorize`] so the gate, the
//! extractors, and the router layers cannot drift apart.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::gate::bearer_token;
use crate::modules::auth::model::Claims;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

/// The single role-authorization decision.
///
/// An empty allow-list means "any authenticated user". A role outside the
/// list is a 403, distinct from the 401s of authentication failure.
pub fn authorize(claims: &Claims, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    if allowed_roles.is_empty() || allowed_roles.contains(&claims.role) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Access denied. Required roles: {:?}, but user has role: {:?}",
            allowed_roles, claims.role
        )))
    }
}

/// Extractor providing the authenticated user's claims.
///
/// Prefers the claims the request gate attached to the request; if the gate
/// did not run for this route it re-derives them from the `Authorization`
/// header, so handlers stay protected even on routes the gate treats as
/// public.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<i32, AppError> {
        self.0
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid or expired token."))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(AuthUser(claims.clone()));
        }

        let token = bearer_token(&parts.headers)?;
        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Middleware that enforces a role allow-list on a router subtree.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: Vec<UserRole>,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    authorize(&auth_user.0, &allowed_roles)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Layer helper for admin-only subtrees.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, vec![UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Layer helper for subtrees open to instructors and admins.
pub async fn require_instructor(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_roles(
        State(state),
        req,
        next,
        vec![UserRole::Instructor, UserRole::Admin],
    )
    .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Extractor for admin-only handlers.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        authorize(&auth_user.0, &[UserRole::Admin])?;
        Ok(RequireAdmin(auth_user))
    }
}

/// Extractor for handlers open to instructors and admins.
#[derive(Debug, Clone)]
pub struct RequireInstructor(pub AuthUser);

impl FromRequestParts<AppState> for RequireInstructor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        authorize(&auth_user.0, &[UserRole::Instructor, UserRole::Admin])?;
        Ok(RequireInstructor(auth_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn claims_with_role(role: UserRole) -> Claims {
        Claims {
            sub: "42".to_string(),
            email: "test@example.com".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_empty_allow_list_accepts_any_role() {
        for role in [UserRole::Student, UserRole::Instructor, UserRole::Admin] {
            assert!(authorize(&claims_with_role(role), &[]).is_ok());
        }
    }

    #[test]
    fn test_role_in_list_accepted() {
        let claims = claims_with_role(UserRole::Instructor);
        assert!(authorize(&claims, &[UserRole::Instructor, UserRole::Admin]).is_ok());
    }

    #[test]
    fn test_role_not_in_list_is_forbidden() {
        let claims = claims_with_role(UserRole::Student);
        let err = authorize(&claims, &[UserRole::Admin]).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_user_accessors() {
        let auth_user = AuthUser(claims_with_role(UserRole::Admin));
        assert_eq!(auth_user.user_id().unwrap(), 42);
        assert_eq!(auth_user.email(), "test@example.com");
        assert!(auth_user.is_admin());

        let student = AuthUser(claims_with_role(UserRole::Student));
        assert!(!student.is_admin());
        assert_eq!(student.role(), UserRole::Student);
    }

    #[test]
    fn test_bad_subject_rejected() {
        let mut claims = claims_with_role(UserRole::Student);
        claims.sub = "not-a-number".to_string();
        let err = AuthUser(claims).user_id().unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
