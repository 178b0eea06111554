//! Expense approval workflow for Expenza.
//!
//! This module implements the approval workflow compiler, the rule
//! model, and the approval state machine.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (ExpenseStatus, ApprovalStatus, FlowStep)
//! - `error` - Workflow-specific error types
//! - `rules` - Approval rule model and validation
//! - `compiler` - Resolves a rule/flow/chain into concrete steps
//! - `machine` - Sequential decision state machine

pub mod compiler;
pub mod error;
pub mod machine;
pub mod rules;
pub mod types;

#[cfg(test)]
mod compiler_props;
#[cfg(test)]
mod machine_props;

pub use compiler::{CompiledStep, WorkflowCompiler};
pub use error::WorkflowError;
pub use machine::{ApprovalMachine, DecisionOutcome, StepState};
pub use rules::{ApprovalRule, RuleKind};
pub use types::{ApprovalStatus, ApproverRole, ChainMember, Decision, ExpenseStatus, FlowStep};
