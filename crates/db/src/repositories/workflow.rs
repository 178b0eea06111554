//! Workflow repository: expense submission and approval decisions.
//!
//! Submission compiles the approval steps once and persists them with
//! the expense in one transaction. Decisions are applied with a
//! compare-and-swap on the step row so concurrent submits of the same
//! decision cannot both win.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use expenza_core::currency::convert_amount;
use expenza_core::workflow::{
    ApprovalMachine, ApprovalRule, CompiledStep, Decision, DecisionOutcome, StepState,
    WorkflowCompiler, WorkflowError,
};

use crate::entities::{
    approvals, companies, expenses,
    sea_orm_active_enums::{ApprovalStatus, ExpenseStatus},
};
use crate::repositories::employee::EmployeeRepository;
use crate::repositories::exchange_rate::ExchangeRateRepository;
use crate::repositories::rule::{to_core_flow_step, to_core_rule, RuleRepository};

/// Input for submitting an expense.
#[derive(Debug, Clone)]
pub struct SubmitExpenseInput {
    /// Company scope.
    pub company_id: Uuid,
    /// Submitting user.
    pub employee_id: Uuid,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// ISO 4217 code of the submitted amount.
    pub currency: String,
    /// Expense category.
    pub category: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
}

/// A submitted expense with its compiled approval steps.
#[derive(Debug, Clone)]
pub struct SubmittedExpense {
    /// The created expense row.
    pub expense: expenses::Model,
    /// The compiled steps, ordered by sequence.
    pub steps: Vec<approvals::Model>,
}

/// Result of applying one approval decision.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    /// The expense after the transition.
    pub expense: expenses::Model,
    /// The state machine outcome that was applied.
    pub outcome: DecisionOutcome,
}

/// Maps stored approval rows to state machine step snapshots.
#[must_use]
pub fn step_states(rows: &[approvals::Model]) -> Vec<StepState> {
    rows.iter()
        .map(|row| StepState {
            sequence: row.sequence,
            approver_id: row.approver_id,
            status: row.status.into(),
            role: row.approver_role.map(Into::into),
            is_mandatory: row.is_mandatory,
        })
        .collect()
}

/// Workflow repository for expense lifecycle transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits an expense: compiles its approval steps, converts the
    /// amount to the company currency, and persists everything in one
    /// transaction.
    ///
    /// With no configured rule the default applies: a single mandatory
    /// step owned by the submitter's direct manager.
    ///
    /// # Errors
    ///
    /// * `CompanyNotFound` / `EmployeeNotFound` - unknown scope
    /// * configuration errors from rule validation and compilation
    /// * `ConversionUnavailable` - no usable rate snapshot
    /// * `Database` - a query or the transaction failed
    pub async fn submit_expense(
        &self,
        input: SubmitExpenseInput,
    ) -> Result<SubmittedExpense, WorkflowError> {
        let company = companies::Entity::find_by_id(input.company_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::CompanyNotFound(input.company_id))?;

        let chain = EmployeeRepository::new(self.db.clone())
            .manager_chain(input.employee_id)
            .await?;

        let rule_repo = RuleRepository::new(self.db.clone());
        let rule = rule_repo
            .get_rule(input.company_id)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let steps = match &rule {
            Some(rule_model) => {
                let rule = to_core_rule(rule_model);
                let flow: Vec<_> = rule_repo
                    .get_flow(input.company_id)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?
                    .iter()
                    .map(to_core_flow_step)
                    .collect();
                WorkflowCompiler::compile(&rule, &flow, &chain)?
            }
            None => WorkflowCompiler::default_steps(&chain)?,
        };

        let converted_amount = self
            .convert_to_company_currency(&company, input.amount, &input.currency)
            .await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let now = Utc::now().into();
        let expense_id = Uuid::new_v4();
        let first_approver = steps.first().map(|s| s.approver_id);

        let expense = expenses::ActiveModel {
            id: Set(expense_id),
            company_id: Set(input.company_id),
            employee_id: Set(input.employee_id),
            amount: Set(input.amount),
            currency: Set(input.currency),
            converted_amount: Set(converted_amount),
            category: Set(input.category),
            description: Set(input.description),
            expense_date: Set(input.expense_date),
            status: Set(ExpenseStatus::Pending),
            current_approver_id: Set(first_approver),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let expense = expense
            .insert(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let mut created_steps = Vec::with_capacity(steps.len());
        for step in &steps {
            created_steps.push(Self::insert_step(&txn, expense_id, step, now).await?);
        }

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        tracing::info!(
            expense_id = %expense_id,
            employee_id = %input.employee_id,
            steps = created_steps.len(),
            "expense submitted"
        );

        Ok(SubmittedExpense {
            expense,
            steps: created_steps,
        })
    }

    /// Applies one approver's decision to an expense.
    ///
    /// The step transition is a conditional update on
    /// `(expense_id, sequence, status = pending)`; zero affected rows
    /// means another decision won the race and the call fails with
    /// `AlreadyDecided`.
    ///
    /// # Errors
    ///
    /// * `ExpenseNotFound` - unknown expense in this company
    /// * `NotYourTurn` / `AlreadyDecided` - sequence violations
    /// * `Database` - a query or the transaction failed
    pub async fn decide_expense(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
        approver_id: Uuid,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<DecisionRecord, WorkflowError> {
        let expense = expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))?;

        let rows = approvals::Entity::find()
            .filter(approvals::Column::ExpenseId.eq(expense_id))
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        let states = step_states(&rows);

        let rule = RuleRepository::new(self.db.clone())
            .get_rule(company_id)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .as_ref()
            .map_or_else(
                // No configured rule: the default single-manager flow
                // completes when every step approves.
                || ApprovalRule::percentage(Decimal::ONE),
                to_core_rule,
            );

        let outcome = ApprovalMachine::decide(
            &states,
            &rule,
            expense.status.into(),
            approver_id,
            decision,
        )?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        let now = Utc::now().into();

        let step_update = approvals::Entity::update_many()
            .set(approvals::ActiveModel {
                status: Set(outcome.step_status.into()),
                comments: Set(comments),
                acted_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(approvals::Column::ExpenseId.eq(expense_id))
            .filter(approvals::Column::Sequence.eq(outcome.sequence))
            .filter(approvals::Column::Status.eq(ApprovalStatus::Pending))
            .exec(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        if step_update.rows_affected == 0 {
            // Lost the race: a concurrent decision took this step.
            return Err(WorkflowError::AlreadyDecided);
        }

        let expense_update = expenses::Entity::update_many()
            .set(expenses::ActiveModel {
                status: Set(outcome.expense_status.into()),
                current_approver_id: Set(outcome.next_approver_id),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(expenses::Column::Id.eq(expense_id))
            .filter(expenses::Column::Status.eq(ExpenseStatus::Pending))
            .exec(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
        if expense_update.rows_affected == 0 {
            return Err(WorkflowError::AlreadyDecided);
        }

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        tracing::info!(
            expense_id = %expense_id,
            approver_id = %approver_id,
            sequence = outcome.sequence,
            status = %outcome.expense_status,
            "approval decision applied"
        );

        let expense = expenses::Entity::find_by_id(expense_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::ExpenseNotFound(expense_id))?;

        Ok(DecisionRecord { expense, outcome })
    }

    async fn convert_to_company_currency(
        &self,
        company: &companies::Model,
        amount: Decimal,
        currency: &str,
    ) -> Result<Decimal, WorkflowError> {
        if currency == company.currency_code {
            return Ok(convert_amount(amount, Decimal::ONE));
        }

        let table = ExchangeRateRepository::new(self.db.clone())
            .latest_table(company.id, &company.currency_code)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or_else(|| WorkflowError::ConversionUnavailable {
                from: currency.to_string(),
                to: company.currency_code.clone(),
            })?;

        table.convert(amount, currency, &company.currency_code)
    }

    async fn insert_step(
        txn: &sea_orm::DatabaseTransaction,
        expense_id: Uuid,
        step: &CompiledStep,
        now: chrono::DateTime<chrono::FixedOffset>,
    ) -> Result<approvals::Model, WorkflowError> {
        let row = approvals::ActiveModel {
            id: Set(Uuid::new_v4()),
            expense_id: Set(expense_id),
            approver_id: Set(step.approver_id),
            sequence: Set(step.sequence),
            status: Set(ApprovalStatus::Pending),
            approver_role: Set(step.role.map(Into::into)),
            is_mandatory: Set(step.is_mandatory),
            comments: Set(None),
            acted_at: Set(None),
            created_at: Set(now),
        };
        row.insert(txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::ApproverRole;
    use expenza_core::workflow::{ApprovalStatus as CoreStatus, ApproverRole as CoreRole};

    fn step_row(sequence: i32, status: ApprovalStatus) -> approvals::Model {
        approvals::Model {
            id: Uuid::new_v4(),
            expense_id: Uuid::new_v4(),
            approver_id: Uuid::new_v4(),
            sequence,
            status,
            approver_role: Some(ApproverRole::Finance),
            is_mandatory: true,
            comments: None,
            acted_at: None,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_step_states_maps_rows() {
        let rows = vec![
            step_row(1, ApprovalStatus::Approved),
            step_row(2, ApprovalStatus::Pending),
        ];

        let states = step_states(&rows);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].status, CoreStatus::Approved);
        assert_eq!(states[0].role, Some(CoreRole::Finance));
        assert!(states[0].is_mandatory);
        assert_eq!(states[1].sequence, 2);
        assert_eq!(states[1].status, CoreStatus::Pending);
    }

    #[test]
    fn test_step_states_specific_step_has_no_role() {
        let mut row = step_row(3, ApprovalStatus::Pending);
        row.approver_role = None;

        let states = step_states(&[row]);
        assert_eq!(states[0].role, None);
        assert!(!states[0].counts_toward_threshold());
    }
}
