//! Property-based tests for the workflow compiler.
//!
//! These tests validate compilation invariants: contiguous sequences,
//! role resolution order, and the specific-approver terminal step.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::compiler::WorkflowCompiler;
use crate::workflow::error::WorkflowError;
use crate::workflow::rules::ApprovalRule;
use crate::workflow::types::{ApproverRole, ChainMember, FlowStep};

const ROLES: [ApproverRole; 4] = [
    ApproverRole::Manager,
    ApproverRole::Finance,
    ApproverRole::Director,
    ApproverRole::Cfo,
];

/// Strategy for a threshold in (0, 1] with two decimal places.
fn arb_threshold() -> impl Strategy<Value = Decimal> {
    (1i64..=100i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a chain that holds every role, so resolution always
/// succeeds.
fn arb_full_chain() -> impl Strategy<Value = Vec<ChainMember>> {
    Just(()).prop_map(|()| {
        ROLES
            .iter()
            .map(|role| ChainMember {
                user_id: Uuid::new_v4(),
                approver_role: Some(*role),
            })
            .collect()
    })
}

/// Strategy for a non-empty flow with unique positive sequences.
fn arb_flow() -> impl Strategy<Value = Vec<FlowStep>> {
    prop::collection::vec((0usize..4, any::<bool>()), 1..=6).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(idx, (role_idx, mandatory))| FlowStep {
                sequence: i32::try_from(idx).unwrap_or(0) + 1,
                approver_role: ROLES[role_idx],
                is_mandatory: mandatory,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Compiled sequences are always 1..n, contiguous, regardless of
    /// the configured flow's sequence values.
    #[test]
    fn prop_compiled_sequences_contiguous(
        flow in arb_flow(),
        chain in arb_full_chain(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let steps = WorkflowCompiler::compile(&rule, &flow, &chain).unwrap();

        prop_assert_eq!(steps.len(), flow.len());
        for (idx, step) in steps.iter().enumerate() {
            prop_assert_eq!(step.sequence, i32::try_from(idx).unwrap() + 1);
        }
    }

    /// Every flow-derived step resolves to the first chain member
    /// holding the required role.
    #[test]
    fn prop_roles_resolve_to_first_match(
        flow in arb_flow(),
        chain in arb_full_chain(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let steps = WorkflowCompiler::compile(&rule, &flow, &chain).unwrap();

        for (step, flow_step) in steps.iter().zip(&flow) {
            let expected = chain
                .iter()
                .find(|m| m.approver_role == Some(flow_step.approver_role))
                .unwrap()
                .user_id;
            prop_assert_eq!(step.approver_id, expected);
            prop_assert_eq!(step.role, Some(flow_step.approver_role));
            prop_assert_eq!(step.is_mandatory, flow_step.is_mandatory);
        }
    }

    /// A specific-approver rule always yields exactly one step for the
    /// named approver, terminal when appended.
    #[test]
    fn prop_specific_rule_names_approver_once(
        flow in arb_flow(),
        chain in arb_full_chain(),
    ) {
        let named = Uuid::new_v4();
        let rule = ApprovalRule::specific(named);
        let steps = WorkflowCompiler::compile(&rule, &flow, &chain).unwrap();

        let named_steps: Vec<_> = steps
            .iter()
            .filter(|s| s.approver_id == named)
            .collect();
        prop_assert_eq!(named_steps.len(), 1);

        let last = steps.last().unwrap();
        prop_assert_eq!(last.approver_id, named);
        prop_assert!(last.is_mandatory);
        prop_assert_eq!(steps.len(), flow.len() + 1);
    }

    /// Compilation is deterministic.
    #[test]
    fn prop_compile_is_deterministic(
        flow in arb_flow(),
        chain in arb_full_chain(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let first = WorkflowCompiler::compile(&rule, &flow, &chain).unwrap();
        let second = WorkflowCompiler::compile(&rule, &flow, &chain).unwrap();
        prop_assert_eq!(first, second);
    }

    /// A chain missing a required role fails with NoApproverFound, and
    /// the error names a role the flow requires.
    #[test]
    fn prop_missing_role_is_configuration_error(
        flow in arb_flow(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let result = WorkflowCompiler::compile(&rule, &flow, &[]);

        match result {
            Err(WorkflowError::NoApproverFound { role }) => {
                prop_assert!(flow.iter().any(|s| s.approver_role == role));
            }
            other => prop_assert!(false, "expected NoApproverFound, got {other:?}"),
        }
    }
}
