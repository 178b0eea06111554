//! Approval queue routes.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::AuthUser, routes::database_error};
use expenza_db::ExpenseRepository;

/// Creates the approval queue routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/approvals/pending", get(list_pending))
}

/// GET /approvals/pending - Expenses currently waiting on the caller.
///
/// Only the step whose turn it is shows up; later steps on the same
/// expense stay out of everyone's queue until the workflow reaches them.
async fn list_pending(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let expense_repo = ExpenseRepository::new((*state.db).clone());

    match expense_repo.list_pending_for_approver(auth.user_id()).await {
        Ok(items) => (StatusCode::OK, Json(json!({ "data": items }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list pending approvals");
            database_error()
        }
    }
}
