//! Property-based tests for the approval state machine.
//!
//! These tests validate the terminal-state, write-once, and sequential
//! progression properties over randomly generated decision sequences.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::machine::{ApprovalMachine, StepState};
use crate::workflow::rules::ApprovalRule;
use crate::workflow::types::{ApprovalStatus, ApproverRole, Decision, ExpenseStatus};

/// Strategy for a threshold in (0, 1] with two decimal places.
fn arb_threshold() -> impl Strategy<Value = Decimal> {
    (1i64..=100i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a pending step snapshot of 1..=6 flow-derived steps.
fn arb_steps() -> impl Strategy<Value = Vec<StepState>> {
    prop::collection::vec(any::<bool>(), 1..=6).prop_map(|mandatory_flags| {
        mandatory_flags
            .into_iter()
            .enumerate()
            .map(|(idx, is_mandatory)| StepState {
                sequence: i32::try_from(idx).unwrap_or(0) + 1,
                approver_id: Uuid::new_v4(),
                status: ApprovalStatus::Pending,
                role: Some(ApproverRole::Manager),
                is_mandatory,
            })
            .collect()
    })
}

/// Strategy for a sequence of decisions to replay in order.
fn arb_decisions() -> impl Strategy<Value = Vec<Decision>> {
    prop::collection::vec(
        prop_oneof![Just(Decision::Approve), Just(Decision::Reject)],
        1..=6,
    )
}

/// Replays decisions in turn order until the expense reaches a terminal
/// state or the decisions run out. Returns the final expense status and
/// the mutated snapshot.
fn replay(
    mut steps: Vec<StepState>,
    rule: &ApprovalRule,
    decisions: &[Decision],
) -> (ExpenseStatus, Vec<StepState>) {
    for decision in decisions {
        let Some(current) = ApprovalMachine::current_step(&steps) else {
            break;
        };
        let approver = current.approver_id;
        let Ok(outcome) =
            ApprovalMachine::decide(&steps, rule, ExpenseStatus::Pending, approver, *decision)
        else {
            break;
        };
        let sequence = outcome.sequence;
        for step in &mut steps {
            if step.sequence == sequence {
                step.status = outcome.step_status;
            }
        }
        if outcome.expense_status.is_terminal() {
            return (outcome.expense_status, steps);
        }
    }
    (ExpenseStatus::Pending, steps)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A rejection anywhere in the sequence makes the expense Rejected
    /// and leaves all later steps untouched.
    #[test]
    fn prop_first_reject_is_terminal(
        steps in arb_steps(),
        reject_at in 0usize..6,
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let reject_at = reject_at % steps.len();
        let mut decisions = vec![Decision::Approve; reject_at];
        decisions.push(Decision::Reject);

        let (status, final_steps) = replay(steps, &rule, &decisions);

        // The replay may have approved early if the threshold was
        // reached before the rejection turn came up.
        if status == ExpenseStatus::Rejected {
            let rejected: Vec<_> = final_steps
                .iter()
                .filter(|s| s.status == ApprovalStatus::Rejected)
                .collect();
            prop_assert_eq!(rejected.len(), 1);
            let rejected_seq = rejected[0].sequence;
            for step in &final_steps {
                if step.sequence > rejected_seq {
                    prop_assert_eq!(step.status, ApprovalStatus::Pending);
                }
            }
        }
    }

    /// After any terminal state, every further decision attempt fails
    /// with AlreadyDecided.
    #[test]
    fn prop_terminal_state_is_immutable(
        steps in arb_steps(),
        decisions in arb_decisions(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let (status, final_steps) = replay(steps, &rule, &decisions);

        if status.is_terminal() {
            for step in &final_steps {
                let result = ApprovalMachine::decide(
                    &final_steps,
                    &rule,
                    status,
                    step.approver_id,
                    Decision::Approve,
                );
                prop_assert!(
                    matches!(result, Err(WorkflowError::AlreadyDecided)),
                    "expected AlreadyDecided after terminal state, got {result:?}"
                );
            }
        }
    }

    /// Only the current approver can act; every other participant gets
    /// NotYourTurn (or AlreadyDecided if they already acted).
    #[test]
    fn prop_only_current_approver_may_act(
        steps in arb_steps(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let current = ApprovalMachine::current_step(&steps).unwrap().approver_id;

        for step in &steps {
            if step.approver_id == current {
                continue;
            }
            let result = ApprovalMachine::decide(
                &steps,
                &rule,
                ExpenseStatus::Pending,
                step.approver_id,
                Decision::Approve,
            );
            prop_assert!(
                matches!(result, Err(WorkflowError::NotYourTurn { .. })),
                "expected NotYourTurn, got {result:?}"
            );
        }
    }

    /// All-approve replays end Approved, and the number of approved
    /// steps is the minimum needed to satisfy the rule while covering
    /// every mandatory step.
    #[test]
    fn prop_all_approvals_reach_approved(
        steps in arb_steps(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let total = steps.len();
        let decisions = vec![Decision::Approve; total];

        let (status, final_steps) = replay(steps, &rule, &decisions);
        prop_assert_eq!(status, ExpenseStatus::Approved);

        let approved = final_steps
            .iter()
            .filter(|s| s.status == ApprovalStatus::Approved)
            .count();
        let fraction = Decimal::from(approved) / Decimal::from(total);
        prop_assert!(fraction >= threshold);

        // No mandatory step was skipped.
        for step in &final_steps {
            if step.is_mandatory {
                prop_assert_eq!(step.status, ApprovalStatus::Approved);
            }
        }

        // Minimality: dropping the last approval would leave the rule
        // unsatisfied or a mandatory step pending.
        if approved < total {
            let previous = Decimal::from(approved - 1) / Decimal::from(total);
            let highest_mandatory_is_last = final_steps
                .iter()
                .filter(|s| s.is_mandatory)
                .map(|s| s.sequence)
                .max()
                .is_some_and(|seq| seq == i32::try_from(approved).unwrap());
            prop_assert!(previous < threshold || highest_mandatory_is_last);
        }
    }

    /// Steps are decided in strictly ascending sequence order.
    #[test]
    fn prop_progression_is_sequential(
        steps in arb_steps(),
        decisions in arb_decisions(),
        threshold in arb_threshold(),
    ) {
        let rule = ApprovalRule::percentage(threshold);
        let (_, final_steps) = replay(steps, &rule, &decisions);

        // Decided steps form a prefix of the sequence order.
        let mut seen_pending = false;
        for step in &final_steps {
            if step.status == ApprovalStatus::Pending {
                seen_pending = true;
            } else {
                prop_assert!(
                    !seen_pending,
                    "decided step {} after a pending step",
                    step.sequence
                );
            }
        }
    }
}
