//! Authentication middleware for protected routes.
//!
//! Beyond signature checks, the middleware rejects tokens whose role
//! claim does not name a known company role, so handlers downstream can
//! rely on [`AuthUser::user_role`] for permission checks.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use expenza_core::auth::UserRole;
use expenza_shared::{Claims, JwtError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn reject(error: &'static str, message: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Validates the bearer token and stores its claims in request
/// extensions.
///
/// Tokens that are missing, expired, malformed, or carry an unknown
/// role are all rejected with 401 before the handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return reject(
            "missing_token",
            "Authorization header with Bearer token is required",
        );
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => return reject("token_expired", "Token has expired"),
        Err(_) => return reject("invalid_token", "Invalid or malformed token"),
    };

    // A token minted before a role was renamed or removed is useless to
    // every permission check; fail it here rather than per-handler.
    if UserRole::parse(&claims.role).is_none() {
        return reject("invalid_token", "Token role is not recognized");
    }

    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// Extractor for the authenticated user's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub fn user_id(&self) -> uuid::Uuid {
        self.0.user_id()
    }

    /// Returns the company ID from the claims.
    #[must_use]
    pub fn company_id(&self) -> uuid::Uuid {
        self.0.company_id()
    }

    /// Returns the parsed company role.
    ///
    /// `None` only for claims that bypassed [`auth_middleware`], which
    /// rejects unknown roles.
    #[must_use]
    pub fn user_role(&self) -> Option<UserRole> {
        UserRole::parse(&self.0.role)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| reject("unauthorized", "Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn claims_with_role(role: &str) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            role,
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }

    #[test]
    fn test_auth_user_parses_known_roles() {
        assert_eq!(
            AuthUser(claims_with_role("admin")).user_role(),
            Some(UserRole::Admin)
        );
        assert_eq!(
            AuthUser(claims_with_role("manager")).user_role(),
            Some(UserRole::Manager)
        );
        assert_eq!(
            AuthUser(claims_with_role("employee")).user_role(),
            Some(UserRole::Employee)
        );
    }

    #[test]
    fn test_auth_user_rejects_unknown_role() {
        assert_eq!(AuthUser(claims_with_role("owner")).user_role(), None);
    }
}
