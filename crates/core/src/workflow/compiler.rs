//! Workflow compiler: turns (rule, flow, manager chain) into the concrete
//! ordered approval steps for one expense.
//!
//! Compilation happens once, at submission. The output is persisted as
//! `Pending` approval rows; the state machine never re-runs the compiler.

use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::rules::ApprovalRule;
use crate::workflow::types::{ApproverRole, ChainMember, FlowStep};

/// One concrete, ordered approval step produced by compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompiledStep {
    /// Position in the compiled order (1-based, contiguous).
    pub sequence: i32,
    /// The resolved approver.
    pub approver_id: Uuid,
    /// The flow role this step was resolved from; `None` for the
    /// rule-mandated specific-approver terminal step.
    pub role: Option<ApproverRole>,
    /// Whether the step can never be skipped by rule satisfaction.
    pub is_mandatory: bool,
}

impl CompiledStep {
    /// Returns true if this step counts toward a percentage threshold.
    ///
    /// Only flow-derived steps count; the specific-approver terminal
    /// step is a separate condition.
    #[must_use]
    pub const fn counts_toward_threshold(&self) -> bool {
        self.role.is_some()
    }
}

/// Stateless compiler for approval workflows.
pub struct WorkflowCompiler;

impl WorkflowCompiler {
    /// Compiles an expense's required approval steps.
    ///
    /// # Arguments
    /// * `rule` - The company's approval rule
    /// * `flow` - The company's configured flow steps (any order)
    /// * `chain` - The submitter's manager chain, nearest manager first
    ///
    /// # Errors
    ///
    /// * `InvalidRule` / `InvalidFlow` - configuration violates invariants
    /// * `NoApprovalRequired` - the flow has zero steps
    /// * `NoApproverFound` - the chain holds no user with a required role
    pub fn compile(
        rule: &ApprovalRule,
        flow: &[FlowStep],
        chain: &[ChainMember],
    ) -> Result<Vec<CompiledStep>, WorkflowError> {
        rule.validate()?;

        if flow.is_empty() {
            return Err(WorkflowError::NoApprovalRequired);
        }

        let ordered = Self::validate_flow(flow)?;

        let mut steps = Vec::with_capacity(ordered.len() + 1);
        for flow_step in &ordered {
            let approver = Self::resolve_role(chain, flow_step.approver_role)?;
            steps.push(CompiledStep {
                sequence: 0, // renumbered below
                approver_id: approver,
                role: Some(flow_step.approver_role),
                is_mandatory: flow_step.is_mandatory,
            });
        }

        // SpecificApprover/Hybrid: the named approver is a mandatory
        // terminal step unless already resolved from the flow.
        if rule.requires_specific_step() {
            let specific = rule
                .specific_approver_id
                .ok_or_else(|| WorkflowError::InvalidRule("missing specific approver".into()))?;
            if !steps.iter().any(|s| s.approver_id == specific) {
                steps.push(CompiledStep {
                    sequence: 0,
                    approver_id: specific,
                    role: None,
                    is_mandatory: true,
                });
            }
        }

        for (idx, step) in steps.iter_mut().enumerate() {
            step.sequence = i32::try_from(idx + 1)
                .map_err(|_| WorkflowError::InvalidFlow("flow too long".into()))?;
        }

        Ok(steps)
    }

    /// Produces the default steps applied when a company has no
    /// configured rule/flow: a single mandatory step owned by the
    /// submitter's direct manager.
    ///
    /// # Errors
    ///
    /// Returns `NoApproverFound` for the Manager role if the chain is
    /// empty.
    pub fn default_steps(chain: &[ChainMember]) -> Result<Vec<CompiledStep>, WorkflowError> {
        let direct_manager = chain.first().ok_or(WorkflowError::NoApproverFound {
            role: ApproverRole::Manager,
        })?;

        Ok(vec![CompiledStep {
            sequence: 1,
            approver_id: direct_manager.user_id,
            role: Some(ApproverRole::Manager),
            is_mandatory: true,
        }])
    }

    /// Checks sequence positivity/uniqueness and returns the flow sorted
    /// ascending by sequence.
    fn validate_flow(flow: &[FlowStep]) -> Result<Vec<FlowStep>, WorkflowError> {
        let mut ordered = flow.to_vec();
        ordered.sort_by_key(|s| s.sequence);

        if let Some(bad) = ordered.iter().find(|s| s.sequence <= 0) {
            return Err(WorkflowError::InvalidFlow(format!(
                "flow sequence must be positive, got {}",
                bad.sequence
            )));
        }

        for pair in ordered.windows(2) {
            if pair[0].sequence == pair[1].sequence {
                return Err(WorkflowError::InvalidFlow(format!(
                    "duplicate flow sequence {}",
                    pair[0].sequence
                )));
            }
        }

        Ok(ordered)
    }

    /// Walks the manager chain until a user holding `role` is found.
    fn resolve_role(chain: &[ChainMember], role: ApproverRole) -> Result<Uuid, WorkflowError> {
        chain
            .iter()
            .find(|member| member.approver_role == Some(role))
            .map(|member| member.user_id)
            .ok_or(WorkflowError::NoApproverFound { role })
    }
}
