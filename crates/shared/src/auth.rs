//! Authentication types shared between the API layer and the JWT service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Company ID (tenant context).
    pub company: Uuid,
    /// User's role in the company.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, company_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            company: company_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the company ID from claims.
    #[must_use]
    pub const fn company_id(&self) -> Uuid {
        self.company
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Signup request payload.
///
/// The first signup bootstraps a company and its admin user in one step.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    /// Company name.
    pub company_name: String,
    /// Company country.
    pub country: String,
    /// Company base currency code (e.g. "USD").
    pub currency_code: String,
    /// Admin user email.
    pub email: String,
    /// Admin user full name.
    pub name: String,
    /// Admin user password.
    pub password: String,
}

/// Password change request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// Password currently on the account.
    pub current_password: String,
    /// Replacement password; must pass the strength policy.
    pub new_password: String,
}

/// Authenticated user info returned on login/signup.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Full name.
    pub name: String,
    /// Role within the company.
    pub role: String,
    /// Company ID.
    pub company_id: Uuid,
}

/// Response for successful authentication.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// Authenticated user.
    pub user: UserInfo,
    /// Access token (Bearer).
    pub access_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}
