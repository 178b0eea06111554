//! Authentication routes: signup, login, profile, and password change.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::{error, info};

use crate::{
    AppState,
    middleware::AuthUser,
    routes::{app_error_response, database_error},
};
use expenza_core::auth::{hash_password, validate_password, verify_password};
use expenza_db::{CompanyRepository, UserRepository, repositories::company::CreateCompanyInput};
use expenza_shared::AppError;
use expenza_shared::auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, SignupRequest, UserInfo,
};

/// Creates the public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

/// Creates the auth routes that require a valid token.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
}

/// Structural email check: `local@domain.tld` with a 2+ letter TLD.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c))
    {
        return false;
    }
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// POST /auth/signup - Create a company and its admin user.
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> impl IntoResponse {
    if !is_valid_email(&payload.email) {
        return app_error_response(&AppError::Validation("invalid email format".to_string()));
    }
    if let Err(e) = validate_password(&payload.password) {
        return app_error_response(&AppError::Validation(e.to_string()));
    }

    let user_repo = UserRepository::new((*state.db).clone());

    // Check if email already exists
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
            return internal_error("An error occurred during signup");
        }
    }

    // Hash password
    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error("An error occurred during signup");
        }
    };

    // Create company and admin in one transaction
    let company_repo = CompanyRepository::new((*state.db).clone());
    let (company, admin) = match company_repo
        .create_with_admin(CreateCompanyInput {
            name: payload.company_name,
            country: payload.country,
            currency_code: payload.currency_code.to_uppercase(),
            admin_email: payload.email,
            admin_name: payload.name,
            admin_password_hash: password_hash,
        })
        .await
    {
        Ok(created) => created,
        Err(e) => {
            error!(error = %e, "Failed to create company");
            return internal_error("An error occurred during signup");
        }
    };

    let role = admin.role;
    let access_token = match state.jwt_service.generate_access_token(
        admin.id,
        company.id,
        role_str(role),
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return internal_error("An error occurred during signup");
        }
    };

    info!(company_id = %company.id, user_id = %admin.id, "Company created");

    let response = AuthResponse {
        user: UserInfo {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: role_str(role).to_string(),
            company_id: company.id,
        },
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

/// POST /auth/login - Authenticate user and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    // Find user by email (inactive accounts never match)
    let user = match user_repo.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for non-existent user");
            return invalid_credentials("Invalid email or password");
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error("An error occurred during login");
        }
    };

    // Verify password
    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return invalid_credentials("Invalid email or password");
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("An error occurred during login");
        }
    }

    let role = user.role;
    let access_token = match state.jwt_service.generate_access_token(
        user.id,
        user.company_id,
        role_str(role),
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return internal_error("An error occurred during login");
        }
    };

    info!(user_id = %user.id, "User logged in successfully");

    let response = AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
            name: user.name,
            role: role_str(role).to_string(),
            company_id: user.company_id,
        },
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// GET /auth/me - The authenticated user's profile.
async fn me(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user = match UserRepository::new((*state.db).clone())
        .find_by_id(auth.company_id(), auth.user_id())
        .await
    {
        Ok(Some(u)) => u,
        Ok(None) => {
            // Token outlived the account.
            return app_error_response(&AppError::NotFound("user not found".to_string()));
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch current user");
            return database_error();
        }
    };

    let role = user.role;
    (
        StatusCode::OK,
        Json(json!({
            "user": UserInfo {
                id: user.id,
                email: user.email,
                name: user.name,
                role: role_str(role).to_string(),
                company_id: user.company_id,
            }
        })),
    )
        .into_response()
}

/// POST /auth/change-password - Replace the caller's password.
///
/// The current password must verify and the new one must pass the
/// strength policy.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_id(auth.company_id(), auth.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return app_error_response(&AppError::NotFound("user not found".to_string()));
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch user for password change");
            return database_error();
        }
    };

    match verify_password(&payload.current_password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Password change with wrong current password");
            return invalid_credentials("Current password is incorrect");
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("An error occurred during password change");
        }
    }

    if let Err(e) = validate_password(&payload.new_password) {
        return app_error_response(&AppError::Validation(e.to_string()));
    }

    let password_hash = match hash_password(&payload.new_password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error("An error occurred during password change");
        }
    };

    match user_repo.update_password(user.id, password_hash).await {
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Failed to store new password");
            return database_error();
        }
    }

    info!(user_id = %user.id, "Password changed");

    (
        StatusCode::OK,
        Json(json!({ "message": "Password changed successfully" })),
    )
        .into_response()
}

fn role_str(role: expenza_db::entities::sea_orm_active_enums::UserRole) -> &'static str {
    expenza_core::auth::UserRole::from(role).as_str()
}

fn invalid_credentials(message: &str) -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "invalid_credentials",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error(message: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email_accepts_normal_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("bob.smith+tag@sub.example.co"));
        assert!(is_valid_email("x_1%y@host-name.org"));
    }

    #[test]
    fn test_is_valid_email_rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice@nodot"));
        assert!(!is_valid_email("alice@example.c"));
        assert!(!is_valid_email("alice@example.c0m"));
        assert!(!is_valid_email("ali ce@example.com"));
    }
}
