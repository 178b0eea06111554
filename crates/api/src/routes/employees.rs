//! Employee management routes (admin only).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    middleware::AuthUser,
    routes::{app_error_response, auth::is_valid_email, database_error, require_role, workflow_error_response},
};
use expenza_core::auth::{UserRole, hash_password, validate_password};
use expenza_shared::AppError;
use expenza_core::workflow::ApproverRole;
use expenza_db::{EmployeeRepository, UserRepository, repositories::CreateUserInput};

/// Creates the employee management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees))
        .route("/employees", post(create_employee))
        .route("/employees/{user_id}/manager", patch(set_manager))
}

/// Request body for creating an employee account.
#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    /// Unique email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Initial password.
    pub password: String,
    /// Role within the company.
    pub role: UserRole,
    /// Approver role the user fills in flows, if any.
    pub approver_role: Option<ApproverRole>,
    /// Direct manager's user id, if any.
    pub manager_id: Option<Uuid>,
}

/// Request body for changing a reporting line.
#[derive(Debug, Deserialize)]
pub struct SetManagerRequest {
    /// New direct manager; `null` clears the reporting line.
    pub manager_id: Option<Uuid>,
}

/// GET /employees - List the company's users.
async fn list_employees(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    match UserRepository::new((*state.db).clone())
        .list_by_company(auth.company_id())
        .await
    {
        Ok(users) => (StatusCode::OK, Json(json!({ "data": users }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list employees");
            database_error()
        }
    }
}

/// POST /employees - Create a user with their reporting line.
async fn create_employee(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateEmployeeRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    if !is_valid_email(&payload.email) {
        return app_error_response(&AppError::Validation("invalid email format".to_string()));
    }
    if let Err(e) = validate_password(&payload.password) {
        return app_error_response(&AppError::Validation(e.to_string()));
    }

    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_email(&payload.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return database_error();
        }
    }

    // The manager must be a member of the same company.
    if let Some(manager_id) = payload.manager_id {
        if let Err(response) = check_member(&state, auth.company_id(), manager_id).await {
            return response;
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return database_error();
        }
    };

    let user = match user_repo
        .create(CreateUserInput {
            company_id: auth.company_id(),
            email: payload.email,
            name: payload.name,
            password_hash,
            role: payload.role.into(),
            approver_role: payload.approver_role.map(Into::into),
            manager_id: payload.manager_id,
        })
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to create employee");
            return database_error();
        }
    };

    info!(company_id = %auth.company_id(), user_id = %user.id, "Employee created");

    (StatusCode::CREATED, Json(json!({ "data": user }))).into_response()
}

/// PATCH /employees/{user_id}/manager - Change a reporting line.
async fn set_manager(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetManagerRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    // Both ends of the reporting line stay inside the company.
    if let Err(response) = check_member(&state, auth.company_id(), user_id).await {
        return response;
    }
    if let Some(manager_id) = payload.manager_id {
        if manager_id == user_id {
            return app_error_response(&AppError::Validation(
                "a user cannot be their own manager".to_string(),
            ));
        }
        if let Err(response) = check_member(&state, auth.company_id(), manager_id).await {
            return response;
        }
    }

    match EmployeeRepository::new((*state.db).clone())
        .set_manager(user_id, payload.manager_id)
        .await
    {
        Ok(employee) => (StatusCode::OK, Json(json!({ "data": employee }))).into_response(),
        Err(e) => workflow_error_response(&e),
    }
}

async fn check_member(
    state: &AppState,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<(), axum::response::Response> {
    match UserRepository::new((*state.db).clone())
        .find_by_id(company_id, user_id)
        .await
    {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(app_error_response(&AppError::NotFound(
            "user is not a member of this company".to_string(),
        ))),
        Err(e) => {
            error!(error = %e, "Failed to check company membership");
            Err(database_error())
        }
    }
}

fn require_admin(auth: &AuthUser) -> Result<(), axum::response::Response> {
    require_role(
        auth,
        |r| r.can_manage_employees(),
        "only admins can manage employees",
    )
}
