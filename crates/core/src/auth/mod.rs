//! Authentication and password hashing.
//!
//! This module provides:
//! - Password strength policy
//! - Password hashing and verification with Argon2id
//! - User role definitions

mod password;

pub use password::{
    MIN_PASSWORD_LENGTH, PasswordError, hash_password, validate_password, verify_password,
};

use serde::{Deserialize, Serialize};

/// User roles within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access: rules, flows, employees, all expenses. Created with
    /// the company at signup.
    Admin,
    /// Can approve subordinates' expenses and view their team.
    Manager,
    /// Can submit expenses and view their own history.
    Employee,
}

impl UserRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }

    /// Returns true if this role can manage approval rules and flows.
    #[must_use]
    pub const fn can_manage_rules(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can manage employees and reporting
    /// lines.
    #[must_use]
    pub const fn can_manage_employees(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can act on approval steps assigned to
    /// them.
    #[must_use]
    pub const fn can_approve(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Returns true if this role can see every expense in the company.
    #[must_use]
    pub const fn can_view_all_expenses(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.can_manage_rules());
        assert!(!UserRole::Manager.can_manage_rules());
        assert!(!UserRole::Employee.can_manage_rules());

        assert!(UserRole::Admin.can_approve());
        assert!(UserRole::Manager.can_approve());
        assert!(!UserRole::Employee.can_approve());

        assert!(UserRole::Admin.can_view_all_expenses());
        assert!(!UserRole::Manager.can_view_all_expenses());
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Employee] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("owner"), None);
    }
}
