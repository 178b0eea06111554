//! Approval rule and flow repository.
//!
//! A company has at most one rule and one ordered flow. Both are read
//! at submission by the workflow compiler; the admin API edits them.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use expenza_core::workflow::{ApprovalRule, FlowStep};

use crate::entities::{
    approval_flows, approval_rules,
    sea_orm_active_enums::{ApproverRole, RuleKind},
};

/// Input for creating or replacing a company's approval rule.
#[derive(Debug, Clone)]
pub struct UpsertRuleInput {
    /// Company the rule belongs to.
    pub company_id: Uuid,
    /// Kind of rule.
    pub kind: RuleKind,
    /// Threshold for percentage/hybrid rules.
    pub threshold: Option<Decimal>,
    /// Named approver for specific/hybrid rules.
    pub specific_approver_id: Option<Uuid>,
}

/// One step of a flow replacement.
#[derive(Debug, Clone, Copy)]
pub struct FlowStepInput {
    /// Position in the flow.
    pub sequence: i32,
    /// Required approver role.
    pub approver_role: ApproverRole,
    /// Whether the step can never be skipped.
    pub is_mandatory: bool,
}

/// Converts a stored rule row into the core rule model.
#[must_use]
pub fn to_core_rule(model: &approval_rules::Model) -> ApprovalRule {
    ApprovalRule {
        kind: model.kind.into(),
        threshold: model.threshold,
        specific_approver_id: model.specific_approver_id,
    }
}

/// Converts a stored flow row into the core flow step.
#[must_use]
pub fn to_core_flow_step(model: &approval_flows::Model) -> FlowStep {
    FlowStep {
        sequence: model.sequence,
        approver_role: model.approver_role.into(),
        is_mandatory: model.is_mandatory,
    }
}

/// Rule repository for approval configuration.
#[derive(Debug, Clone)]
pub struct RuleRepository {
    db: DatabaseConnection,
}

impl RuleRepository {
    /// Creates a new rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches a company's approval rule, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_rule(&self, company_id: Uuid) -> Result<Option<approval_rules::Model>, DbErr> {
        approval_rules::Entity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
    }

    /// Creates or replaces a company's approval rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn upsert_rule(&self, input: UpsertRuleInput) -> Result<approval_rules::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let existing = self.get_rule(input.company_id).await?;

        if let Some(existing) = existing {
            let mut active: approval_rules::ActiveModel = existing.into();
            active.kind = Set(input.kind);
            active.threshold = Set(input.threshold);
            active.specific_approver_id = Set(input.specific_approver_id);
            active.updated_at = Set(now);
            active.update(&self.db).await
        } else {
            let rule = approval_rules::ActiveModel {
                id: Set(Uuid::new_v4()),
                company_id: Set(input.company_id),
                kind: Set(input.kind),
                threshold: Set(input.threshold),
                specific_approver_id: Set(input.specific_approver_id),
                created_at: Set(now),
                updated_at: Set(now),
            };
            rule.insert(&self.db).await
        }
    }

    /// Fetches a company's flow steps ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_flow(&self, company_id: Uuid) -> Result<Vec<approval_flows::Model>, DbErr> {
        approval_flows::Entity::find()
            .filter(approval_flows::Column::CompanyId.eq(company_id))
            .order_by_asc(approval_flows::Column::Sequence)
            .all(&self.db)
            .await
    }

    /// Replaces a company's flow with the given steps in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails (including duplicate
    /// sequences rejected by the unique constraint).
    pub async fn replace_flow(
        &self,
        company_id: Uuid,
        steps: &[FlowStepInput],
    ) -> Result<Vec<approval_flows::Model>, DbErr> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now().into();

        approval_flows::Entity::delete_many()
            .filter(approval_flows::Column::CompanyId.eq(company_id))
            .exec(&txn)
            .await?;

        let mut created = Vec::with_capacity(steps.len());
        for step in steps {
            let row = approval_flows::ActiveModel {
                id: Set(Uuid::new_v4()),
                company_id: Set(company_id),
                sequence: Set(step.sequence),
                approver_role: Set(step.approver_role),
                is_mandatory: Set(step.is_mandatory),
                created_at: Set(now),
                updated_at: Set(now),
            };
            created.push(row.insert(&txn).await?);
        }

        txn.commit().await?;
        Ok(created)
    }
}
