//! Approval state machine: applies one approver's decision to an
//! expense's compiled steps and computes the resulting expense state.
//!
//! The machine is pure; it inspects a snapshot of the approval rows and
//! returns the transition to apply. Persisting the transition atomically
//! (compare-and-swap on the step row) is the storage layer's job.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::compiler::CompiledStep;
use crate::workflow::error::WorkflowError;
use crate::workflow::rules::ApprovalRule;
use crate::workflow::types::{ApprovalStatus, ApproverRole, Decision, ExpenseStatus};

/// Snapshot of one approval step row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepState {
    /// Position in the compiled order.
    pub sequence: i32,
    /// The approver who owns the step.
    pub approver_id: Uuid,
    /// Current status of the step.
    pub status: ApprovalStatus,
    /// Flow role the step was compiled from; `None` for the
    /// specific-approver terminal step.
    pub role: Option<ApproverRole>,
    /// Whether the step can never be skipped.
    pub is_mandatory: bool,
}

impl StepState {
    /// A fresh `Pending` step state for a compiled step.
    #[must_use]
    pub const fn pending(step: &CompiledStep) -> Self {
        Self {
            sequence: step.sequence,
            approver_id: step.approver_id,
            status: ApprovalStatus::Pending,
            role: step.role,
            is_mandatory: step.is_mandatory,
        }
    }

    /// Returns true if this step counts toward a percentage threshold.
    #[must_use]
    pub const fn counts_toward_threshold(&self) -> bool {
        self.role.is_some()
    }
}

/// The transition the storage layer must apply after a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionOutcome {
    /// Sequence of the decided step.
    pub sequence: i32,
    /// New status of the decided step.
    pub step_status: ApprovalStatus,
    /// New status of the expense.
    pub expense_status: ExpenseStatus,
    /// The approver whose step becomes current, if the expense stays
    /// `Pending`.
    pub next_approver_id: Option<Uuid>,
}

/// Stateless approval state machine.
pub struct ApprovalMachine;

impl ApprovalMachine {
    /// Returns the current step: the lowest-sequence `Pending` row.
    ///
    /// At most one step is ever *active*; this function is idempotent
    /// between decisions.
    #[must_use]
    pub fn current_step(steps: &[StepState]) -> Option<&StepState> {
        steps
            .iter()
            .filter(|s| s.status == ApprovalStatus::Pending)
            .min_by_key(|s| s.sequence)
    }

    /// Returns the approver of the first step, for submission.
    #[must_use]
    pub fn initial_approver(steps: &[StepState]) -> Option<Uuid> {
        Self::current_step(steps).map(|s| s.approver_id)
    }

    /// Applies one approver's decision to the step snapshot.
    ///
    /// # Errors
    ///
    /// * `AlreadyDecided` - the expense is terminal, or the acting
    ///   approver's step was already decided (double-submit)
    /// * `NotYourTurn` - the acting approver does not own the current
    ///   step (progression is strictly sequential)
    pub fn decide(
        steps: &[StepState],
        rule: &ApprovalRule,
        expense_status: ExpenseStatus,
        approver_id: Uuid,
        decision: Decision,
    ) -> Result<DecisionOutcome, WorkflowError> {
        // A terminal expense takes no further decisions. Short-circuit
        // approval can leave optional steps Pending, so the expense
        // status is authoritative, not the step rows.
        if expense_status.is_terminal() {
            return Err(WorkflowError::AlreadyDecided);
        }

        let Some(current) = Self::current_step(steps) else {
            return Err(WorkflowError::AlreadyDecided);
        };

        if current.approver_id != approver_id {
            // Distinguish a double-submit (the caller already decided
            // their step) from acting out of turn.
            let already_acted = steps
                .iter()
                .any(|s| s.approver_id == approver_id && s.status.is_decided());
            return Err(if already_acted {
                WorkflowError::AlreadyDecided
            } else {
                WorkflowError::NotYourTurn { approver_id }
            });
        }

        match decision {
            Decision::Reject => Ok(DecisionOutcome {
                sequence: current.sequence,
                step_status: ApprovalStatus::Rejected,
                expense_status: ExpenseStatus::Rejected,
                next_approver_id: None,
            }),
            Decision::Approve => {
                let mut updated = steps.to_vec();
                for step in &mut updated {
                    if step.sequence == current.sequence {
                        step.status = ApprovalStatus::Approved;
                    }
                }

                let satisfied = Self::is_satisfied(&updated, rule);
                let mandatory_pending = updated
                    .iter()
                    .any(|s| s.is_mandatory && s.status == ApprovalStatus::Pending);

                if satisfied && !mandatory_pending {
                    // Remaining optional steps are skipped; they stay
                    // Pending and are never activated.
                    return Ok(DecisionOutcome {
                        sequence: current.sequence,
                        step_status: ApprovalStatus::Approved,
                        expense_status: ExpenseStatus::Approved,
                        next_approver_id: None,
                    });
                }

                match Self::current_step(&updated) {
                    Some(next) => Ok(DecisionOutcome {
                        sequence: current.sequence,
                        step_status: ApprovalStatus::Approved,
                        expense_status: ExpenseStatus::Pending,
                        next_approver_id: Some(next.approver_id),
                    }),
                    // All steps approved. With a validated rule the
                    // satisfaction condition necessarily holds here
                    // (threshold <= 1), so this arm only fires after
                    // configuration drift; completing every step
                    // approves the expense.
                    None => Ok(DecisionOutcome {
                        sequence: current.sequence,
                        step_status: ApprovalStatus::Approved,
                        expense_status: ExpenseStatus::Approved,
                        next_approver_id: None,
                    }),
                }
            }
        }
    }

    /// Evaluates the rule's satisfaction condition over a step snapshot.
    ///
    /// Percentage: approved fraction of flow-derived steps >= threshold.
    /// SpecificApprover: the named approver's step is approved.
    /// Hybrid: both.
    #[must_use]
    pub fn is_satisfied(steps: &[StepState], rule: &ApprovalRule) -> bool {
        let percentage_ok = || {
            let Some(threshold) = rule.threshold else {
                return false;
            };
            let counting: Vec<_> = steps
                .iter()
                .filter(|s| s.counts_toward_threshold())
                .collect();
            if counting.is_empty() {
                return false;
            }
            let approved = counting
                .iter()
                .filter(|s| s.status == ApprovalStatus::Approved)
                .count();
            let fraction = Decimal::from(approved) / Decimal::from(counting.len());
            fraction >= threshold
        };

        let specific_ok = || {
            rule.specific_approver_id.is_some_and(|specific| {
                steps
                    .iter()
                    .any(|s| s.approver_id == specific && s.status == ApprovalStatus::Approved)
            })
        };

        if rule.has_percentage_condition() && !percentage_ok() {
            return false;
        }
        if rule.requires_specific_step() && !specific_ok() {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn step(sequence: i32, approver: Uuid, mandatory: bool) -> StepState {
        StepState {
            sequence,
            approver_id: approver,
            status: ApprovalStatus::Pending,
            role: Some(ApproverRole::Manager),
            is_mandatory: mandatory,
        }
    }

    fn specific_step(sequence: i32, approver: Uuid) -> StepState {
        StepState {
            sequence,
            approver_id: approver,
            status: ApprovalStatus::Pending,
            role: None,
            is_mandatory: true,
        }
    }

    fn approvers(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_current_step_is_lowest_pending() {
        let ids = approvers(3);
        let mut steps = vec![
            step(1, ids[0], true),
            step(2, ids[1], true),
            step(3, ids[2], true),
        ];
        steps[0].status = ApprovalStatus::Approved;

        let current = ApprovalMachine::current_step(&steps).unwrap();
        assert_eq!(current.sequence, 2);
        // Idempotent between decisions.
        assert_eq!(ApprovalMachine::current_step(&steps).unwrap().sequence, 2);
    }

    #[test]
    fn test_initial_approver_is_first_step() {
        let ids = approvers(2);
        let steps = vec![step(1, ids[0], true), step(2, ids[1], true)];
        assert_eq!(ApprovalMachine::initial_approver(&steps), Some(ids[0]));
    }

    #[test]
    fn test_approve_advances_to_next_step() {
        let ids = approvers(2);
        let steps = vec![step(1, ids[0], true), step(2, ids[1], true)];
        let rule = ApprovalRule::percentage(dec!(1));

        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[0], Decision::Approve).unwrap();

        assert_eq!(outcome.step_status, ApprovalStatus::Approved);
        assert_eq!(outcome.expense_status, ExpenseStatus::Pending);
        assert_eq!(outcome.next_approver_id, Some(ids[1]));
    }

    #[test]
    fn test_last_approval_terminates_expense() {
        let ids = approvers(2);
        let mut steps = vec![step(1, ids[0], true), step(2, ids[1], true)];
        steps[0].status = ApprovalStatus::Approved;
        let rule = ApprovalRule::percentage(dec!(1));

        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[1], Decision::Approve).unwrap();

        assert_eq!(outcome.expense_status, ExpenseStatus::Approved);
        assert_eq!(outcome.next_approver_id, None);
    }

    #[test]
    fn test_reject_is_immediately_terminal() {
        let ids = approvers(3);
        let mut steps = vec![
            step(1, ids[0], true),
            step(2, ids[1], true),
            step(3, ids[2], true),
        ];
        steps[0].status = ApprovalStatus::Approved;
        let rule = ApprovalRule::percentage(dec!(1));

        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[1], Decision::Reject).unwrap();

        assert_eq!(outcome.expense_status, ExpenseStatus::Rejected);
        assert_eq!(outcome.step_status, ApprovalStatus::Rejected);
        // Step 3 is untouched by the outcome: it stays Pending forever.
        assert_eq!(outcome.next_approver_id, None);
    }

    #[test]
    fn test_out_of_turn_decision_fails() {
        let ids = approvers(2);
        let steps = vec![step(1, ids[0], true), step(2, ids[1], true)];
        let rule = ApprovalRule::percentage(dec!(1));

        let result = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[1], Decision::Approve);
        assert!(matches!(result, Err(WorkflowError::NotYourTurn { .. })));
    }

    #[test]
    fn test_non_participant_decision_fails() {
        let ids = approvers(2);
        let steps = vec![step(1, ids[0], true), step(2, ids[1], true)];
        let rule = ApprovalRule::percentage(dec!(1));

        let stranger = Uuid::new_v4();
        let result = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, stranger, Decision::Approve);
        assert!(matches!(result, Err(WorkflowError::NotYourTurn { .. })));
    }

    #[test]
    fn test_double_decision_fails_with_already_decided() {
        let ids = approvers(2);
        let mut steps = vec![step(1, ids[0], true), step(2, ids[1], true)];
        steps[0].status = ApprovalStatus::Approved;
        let rule = ApprovalRule::percentage(dec!(1));

        // ids[0] retries their already-approved step.
        let result = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[0], Decision::Approve);
        assert!(matches!(result, Err(WorkflowError::AlreadyDecided)));
    }

    #[test]
    fn test_decision_on_terminal_expense_fails() {
        let ids = approvers(2);
        let mut steps = vec![step(1, ids[0], true), step(2, ids[1], true)];
        steps[0].status = ApprovalStatus::Rejected;
        let rule = ApprovalRule::percentage(dec!(1));

        let result = ApprovalMachine::decide(
            &steps,
            &rule,
            ExpenseStatus::Rejected,
            ids[1],
            Decision::Approve,
        );
        assert!(matches!(result, Err(WorkflowError::AlreadyDecided)));
    }

    #[test]
    fn test_percentage_rule_short_circuits_optional_steps() {
        // threshold 0.6 over 5 steps: approved once >= 3 approve.
        let ids = approvers(5);
        let mut steps: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| step(i32::try_from(i).unwrap() + 1, *id, false))
            .collect();
        let rule = ApprovalRule::percentage(dec!(0.6));

        steps[0].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[1], Decision::Approve).unwrap();
        assert_eq!(outcome.expense_status, ExpenseStatus::Pending);

        steps[1].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[2], Decision::Approve).unwrap();
        // Third approval reaches 3/5 = 0.6; steps 4 and 5 are skipped.
        assert_eq!(outcome.expense_status, ExpenseStatus::Approved);
        assert_eq!(outcome.next_approver_id, None);
    }

    #[test]
    fn test_mandatory_step_blocks_short_circuit() {
        let ids = approvers(3);
        let mut steps = vec![
            step(1, ids[0], false),
            step(2, ids[1], false),
            step(3, ids[2], true), // mandatory
        ];
        // Low threshold: numerically satisfied after one approval.
        let rule = ApprovalRule::percentage(dec!(0.3));

        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[0], Decision::Approve).unwrap();
        assert_eq!(outcome.expense_status, ExpenseStatus::Pending);
        assert_eq!(outcome.next_approver_id, Some(ids[1]));

        steps[0].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[1], Decision::Approve).unwrap();
        // Still pending: the mandatory step has not approved.
        assert_eq!(outcome.expense_status, ExpenseStatus::Pending);
        assert_eq!(outcome.next_approver_id, Some(ids[2]));

        steps[1].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[2], Decision::Approve).unwrap();
        assert_eq!(outcome.expense_status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_specific_rule_requires_named_approver() {
        let ids = approvers(2);
        let cfo = Uuid::new_v4();
        let mut steps = vec![
            step(1, ids[0], true),
            step(2, ids[1], true),
            specific_step(3, cfo),
        ];
        let rule = ApprovalRule::specific(cfo);

        steps[0].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[1], Decision::Approve).unwrap();
        assert_eq!(outcome.expense_status, ExpenseStatus::Pending);
        assert_eq!(outcome.next_approver_id, Some(cfo));

        steps[1].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, cfo, Decision::Approve).unwrap();
        assert_eq!(outcome.expense_status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_specific_rule_rejection_before_terminal_step() {
        // Flow [Manager, Finance] + specific CFO; Finance rejects at
        // step 2 and the CFO step is never activated.
        let ids = approvers(2);
        let cfo = Uuid::new_v4();
        let mut steps = vec![
            step(1, ids[0], true),
            step(2, ids[1], true),
            specific_step(3, cfo),
        ];
        let rule = ApprovalRule::specific(cfo);

        steps[0].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[1], Decision::Reject).unwrap();

        assert_eq!(outcome.expense_status, ExpenseStatus::Rejected);
        assert_eq!(outcome.sequence, 2);
        assert_eq!(outcome.next_approver_id, None);
    }

    #[test]
    fn test_hybrid_rule_needs_both_conditions() {
        let ids = approvers(2);
        let cfo = Uuid::new_v4();
        let mut steps = vec![
            step(1, ids[0], false),
            step(2, ids[1], false),
            specific_step(3, cfo),
        ];
        // Percentage condition met after the first approval (1/2 = 0.5).
        let rule = ApprovalRule::hybrid(dec!(0.5), cfo);

        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[0], Decision::Approve).unwrap();
        // Percentage satisfied, but the specific (mandatory) step is
        // still pending: the expense cannot finish.
        assert_eq!(outcome.expense_status, ExpenseStatus::Pending);

        steps[0].status = ApprovalStatus::Approved;
        steps[1].status = ApprovalStatus::Approved;
        let outcome = ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, cfo, Decision::Approve).unwrap();
        assert_eq!(outcome.expense_status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_is_satisfied_specific_via_flow_step() {
        // The specific approver already sits in the flow; their flow
        // step approval satisfies the specific condition.
        let named = Uuid::new_v4();
        let mut steps = vec![step(1, named, true)];
        steps[0].status = ApprovalStatus::Approved;
        let rule = ApprovalRule::specific(named);

        assert!(ApprovalMachine::is_satisfied(&steps, &rule));
    }

    #[test]
    fn test_exactly_one_active_step_until_terminal() {
        let ids = approvers(3);
        let mut steps = vec![
            step(1, ids[0], true),
            step(2, ids[1], true),
            step(3, ids[2], true),
        ];
        let rule = ApprovalRule::percentage(dec!(1));

        for i in 0..3 {
            let current = ApprovalMachine::current_step(&steps).unwrap();
            assert_eq!(current.approver_id, ids[i]);
            let outcome =
                ApprovalMachine::decide(&steps, &rule, ExpenseStatus::Pending, ids[i], Decision::Approve).unwrap();
            steps[i].status = ApprovalStatus::Approved;
            if i < 2 {
                assert_eq!(outcome.next_approver_id, Some(ids[i + 1]));
            } else {
                assert_eq!(outcome.expense_status, ExpenseStatus::Approved);
            }
        }
        assert!(ApprovalMachine::current_step(&steps).is_none());
    }
}
