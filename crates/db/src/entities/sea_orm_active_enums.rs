//! Postgres enum mappings and conversions to core domain types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use expenza_core::auth;
use expenza_core::workflow;

/// User role within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Company administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Manager.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Employee.
    #[sea_orm(string_value = "employee")]
    Employee,
}

impl From<UserRole> for auth::UserRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::Manager => Self::Manager,
            UserRole::Employee => Self::Employee,
        }
    }
}

impl From<auth::UserRole> for UserRole {
    fn from(role: auth::UserRole) -> Self {
        match role {
            auth::UserRole::Admin => Self::Admin,
            auth::UserRole::Manager => Self::Manager,
            auth::UserRole::Employee => Self::Employee,
        }
    }
}

/// Role a flow step requires of its approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approver_role")]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    /// Manager.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// Finance team member.
    #[sea_orm(string_value = "finance")]
    Finance,
    /// Director.
    #[sea_orm(string_value = "director")]
    Director,
    /// Chief financial officer.
    #[sea_orm(string_value = "cfo")]
    Cfo,
}

impl From<ApproverRole> for workflow::ApproverRole {
    fn from(role: ApproverRole) -> Self {
        match role {
            ApproverRole::Manager => Self::Manager,
            ApproverRole::Finance => Self::Finance,
            ApproverRole::Director => Self::Director,
            ApproverRole::Cfo => Self::Cfo,
        }
    }
}

impl From<workflow::ApproverRole> for ApproverRole {
    fn from(role: workflow::ApproverRole) -> Self {
        match role {
            workflow::ApproverRole::Manager => Self::Manager,
            workflow::ApproverRole::Finance => Self::Finance,
            workflow::ApproverRole::Director => Self::Director,
            workflow::ApproverRole::Cfo => Self::Cfo,
        }
    }
}

/// Kind of approval rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "rule_kind")]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Threshold fraction of flow steps must approve.
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// A named approver must approve.
    #[sea_orm(string_value = "specific")]
    Specific,
    /// Both conditions apply.
    #[sea_orm(string_value = "hybrid")]
    Hybrid,
}

impl From<RuleKind> for workflow::RuleKind {
    fn from(kind: RuleKind) -> Self {
        match kind {
            RuleKind::Percentage => Self::Percentage,
            RuleKind::Specific => Self::SpecificApprover,
            RuleKind::Hybrid => Self::Hybrid,
        }
    }
}

impl From<workflow::RuleKind> for RuleKind {
    fn from(kind: workflow::RuleKind) -> Self {
        match kind {
            workflow::RuleKind::Percentage => Self::Percentage,
            workflow::RuleKind::SpecificApprover => Self::Specific,
            workflow::RuleKind::Hybrid => Self::Hybrid,
        }
    }
}

/// Expense lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_status")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Travelling through approval steps.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved (terminal).
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected (terminal).
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<ExpenseStatus> for workflow::ExpenseStatus {
    fn from(status: ExpenseStatus) -> Self {
        match status {
            ExpenseStatus::Pending => Self::Pending,
            ExpenseStatus::Approved => Self::Approved,
            ExpenseStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<workflow::ExpenseStatus> for ExpenseStatus {
    fn from(status: workflow::ExpenseStatus) -> Self {
        match status {
            workflow::ExpenseStatus::Pending => Self::Pending,
            workflow::ExpenseStatus::Approved => Self::Approved,
            workflow::ExpenseStatus::Rejected => Self::Rejected,
        }
    }
}

/// Approval step status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_status")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// The approver has not acted yet.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Step approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Step rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<ApprovalStatus> for workflow::ApprovalStatus {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => Self::Pending,
            ApprovalStatus::Approved => Self::Approved,
            ApprovalStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<workflow::ApprovalStatus> for ApprovalStatus {
    fn from(status: workflow::ApprovalStatus) -> Self {
        match status {
            workflow::ApprovalStatus::Pending => Self::Pending,
            workflow::ApprovalStatus::Approved => Self::Approved,
            workflow::ApprovalStatus::Rejected => Self::Rejected,
        }
    }
}
