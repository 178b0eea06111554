//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::middleware::{AuthUser, auth::auth_middleware};
use crate::AppState;
use expenza_core::auth::UserRole;
use expenza_core::workflow::WorkflowError;
use expenza_shared::AppError;

pub mod approvals;
pub mod auth;
pub mod employees;
pub mod expenses;
pub mod health;
pub mod rates;
pub mod rules;

/// Creates the API router with all routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(expenses::routes())
        .merge(approvals::routes())
        .merge(employees::routes())
        .merge(rules::routes())
        .merge(rates::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Maps a workflow error to its HTTP response.
///
/// Status and error code come from the error itself, so the mapping is
/// identical wherever a workflow operation is invoked.
pub(crate) fn workflow_error_response(err: &WorkflowError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// Maps a cross-cutting application error to its HTTP response.
pub(crate) fn app_error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// Response for a failed query whose detail has already been logged.
pub(crate) fn database_error() -> Response {
    app_error_response(&AppError::Database("query failed".to_string()))
}

/// Gates a handler on a role capability.
///
/// `denial` becomes the 403 message when the caller's role does not
/// grant the capability.
pub(crate) fn require_role(
    auth: &AuthUser,
    allowed: impl Fn(UserRole) -> bool,
    denial: &str,
) -> Result<(), Response> {
    if auth.user_role().is_some_and(allowed) {
        Ok(())
    } else {
        Err(app_error_response(&AppError::Forbidden(denial.to_string())))
    }
}
