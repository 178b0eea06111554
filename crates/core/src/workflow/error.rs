//! Workflow error types for the expense approval engine.
//!
//! The taxonomy follows three families:
//! - configuration errors (administrator must fix rule/flow data, never retried)
//! - sequence violations (caller error, surfaced immediately)
//! - dependency failures (external collaborators)

use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::ApproverRole;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The submitter's manager chain was exhausted without finding a
    /// user holding the required role.
    #[error("No approver with role {role} found in the submitter's manager chain")]
    NoApproverFound {
        /// The role that could not be resolved.
        role: ApproverRole,
    },

    /// The company's approval flow has zero steps. An empty flow is an
    /// explicit configuration error, not silent auto-approval.
    #[error("Approval flow has no steps; submission requires a configured flow or default rule")]
    NoApprovalRequired,

    /// The approval rule violates its own invariants.
    #[error("Invalid approval rule: {0}")]
    InvalidRule(String),

    /// The approval flow violates its own invariants.
    #[error("Invalid approval flow: {0}")]
    InvalidFlow(String),

    /// An approver acted on a step that is not the current one.
    #[error("User {approver_id} is not the current approver for this expense")]
    NotYourTurn {
        /// The user who attempted to act.
        approver_id: Uuid,
    },

    /// The step (or the whole expense) has already been decided.
    #[error("This approval has already been decided")]
    AlreadyDecided,

    /// Expense not found.
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Company not found.
    #[error("Company {0} not found")]
    CompanyNotFound(Uuid),

    /// Employee record not found for the submitting user.
    #[error("Employee record for user {0} not found")]
    EmployeeNotFound(Uuid),

    /// No exchange rate available to convert the submitted amount.
    #[error("No exchange rate available from {from} to {to}")]
    ConversionUnavailable {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NoApproverFound { .. }
            | Self::NoApprovalRequired
            | Self::InvalidRule(_)
            | Self::InvalidFlow(_) => 422,

            Self::NotYourTurn { .. } => 403,
            Self::AlreadyDecided => 409,

            Self::ExpenseNotFound(_) | Self::EmployeeNotFound(_) | Self::CompanyNotFound(_) => 404,

            Self::ConversionUnavailable { .. } => 503,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoApproverFound { .. } => "NO_APPROVER_FOUND",
            Self::NoApprovalRequired => "NO_APPROVAL_REQUIRED",
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::InvalidFlow(_) => "INVALID_FLOW",
            Self::NotYourTurn { .. } => "NOT_YOUR_TURN",
            Self::AlreadyDecided => "ALREADY_DECIDED",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::ConversionUnavailable { .. } => "CONVERSION_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if the error indicates a configuration gap that an
    /// administrator must fix before submission can succeed.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoApproverFound { .. }
                | Self::NoApprovalRequired
                | Self::InvalidRule(_)
                | Self::InvalidFlow(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        let err = WorkflowError::NoApproverFound {
            role: ApproverRole::Cfo,
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "NO_APPROVER_FOUND");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("cfo"));

        assert!(WorkflowError::NoApprovalRequired.is_configuration());
        assert!(WorkflowError::InvalidRule(String::new()).is_configuration());
    }

    #[test]
    fn test_sequence_violations() {
        let err = WorkflowError::NotYourTurn {
            approver_id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_YOUR_TURN");
        assert!(!err.is_configuration());

        let err = WorkflowError::AlreadyDecided;
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "ALREADY_DECIDED");
    }

    #[test]
    fn test_not_found_errors() {
        assert_eq!(WorkflowError::ExpenseNotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(
            WorkflowError::EmployeeNotFound(Uuid::nil()).error_code(),
            "EMPLOYEE_NOT_FOUND"
        );
    }

    #[test]
    fn test_dependency_errors() {
        let err = WorkflowError::ConversionUnavailable {
            from: "EUR".to_string(),
            to: "USD".to_string(),
        };
        assert_eq!(err.status_code(), 503);
        assert!(err.to_string().contains("EUR"));
        assert_eq!(WorkflowError::Database(String::new()).status_code(), 500);
    }
}
