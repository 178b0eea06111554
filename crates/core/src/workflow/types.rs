//! Workflow domain types for the expense approval lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Expense status in the approval workflow.
///
/// An expense is created in `Pending` at submission and moves to exactly
/// one terminal state:
/// - Pending → Approved (satisfaction condition met)
/// - Pending → Rejected (any required approver rejects)
///
/// Draft is a pre-submission UI concern and is never persisted as
/// workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Expense is travelling through its approval steps.
    Pending,
    /// Expense has been approved (immutable).
    Approved,
    /// Expense has been rejected (immutable).
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the expense can no longer change state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single approval step.
///
/// Every step row is created `Pending` at submission and is mutated at
/// most once, to `Approved` or `Rejected`. Rows are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// The approver has not acted yet.
    Pending,
    /// The approver approved this step.
    Approved,
    /// The approver rejected this step.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the step has been decided.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role a flow step requires of its approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproverRole {
    /// Direct or skip-level manager.
    Manager,
    /// Finance team member.
    Finance,
    /// Director.
    Director,
    /// Chief financial officer.
    Cfo,
}

impl ApproverRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Finance => "finance",
            Self::Director => "director",
            Self::Cfo => "cfo",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manager" => Some(Self::Manager),
            "finance" => Some(Self::Finance),
            "director" => Some(Self::Director),
            "cfo" => Some(Self::Cfo),
            _ => None,
        }
    }
}

impl fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decision an approver can record on their step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the current step.
    Approve,
    /// Reject the expense (terminal for the whole expense).
    Reject,
}

/// One step of a company's configured approval flow.
///
/// `sequence` is unique per company and defines ordering. A mandatory
/// step cannot be skipped even when a rule's satisfaction condition
/// would otherwise short-circuit approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    /// Position in the flow (positive, unique per company).
    pub sequence: i32,
    /// Role the resolved approver must hold.
    pub approver_role: ApproverRole,
    /// Whether the step can never be skipped.
    pub is_mandatory: bool,
}

/// One link of a submitter's manager chain, nearest manager first.
///
/// Supplied by the identity directory; `approver_role` is the approver
/// role the user holds in the company, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainMember {
    /// The user in the chain.
    pub user_id: Uuid,
    /// The approver role this user holds, if any.
    pub approver_role: Option<ApproverRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_status_roundtrip() {
        for status in [
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
        ] {
            assert_eq!(ExpenseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExpenseStatus::parse("draft"), None);
    }

    #[test]
    fn test_expense_status_terminal() {
        assert!(!ExpenseStatus::Pending.is_terminal());
        assert!(ExpenseStatus::Approved.is_terminal());
        assert!(ExpenseStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_approval_status_decided() {
        assert!(!ApprovalStatus::Pending.is_decided());
        assert!(ApprovalStatus::Approved.is_decided());
        assert!(ApprovalStatus::Rejected.is_decided());
    }

    #[test]
    fn test_approver_role_parse() {
        assert_eq!(ApproverRole::parse("manager"), Some(ApproverRole::Manager));
        assert_eq!(ApproverRole::parse("FINANCE"), Some(ApproverRole::Finance));
        assert_eq!(ApproverRole::parse("Director"), Some(ApproverRole::Director));
        assert_eq!(ApproverRole::parse("cfo"), Some(ApproverRole::Cfo));
        assert_eq!(ApproverRole::parse("intern"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", ExpenseStatus::Pending), "pending");
        assert_eq!(format!("{}", ApproverRole::Cfo), "cfo");
    }
}
