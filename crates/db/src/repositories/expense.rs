//! Expense read repository.
//!
//! Submission and decisions go through the workflow repository; this
//! one serves the listing and detail queries.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::{approvals, expenses, sea_orm_active_enums::ExpenseStatus};

/// Expense repository for queries.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an expense by id, scoped to a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<expenses::Model>, DbErr> {
        expenses::Entity::find_by_id(id)
            .filter(expenses::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
    }

    /// Lists an employee's own expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_employee(&self, employee_id: Uuid) -> Result<Vec<expenses::Model>, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::EmployeeId.eq(employee_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Lists every expense in a company, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<expenses::Model>, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Lists pending expenses whose current step belongs to `approver_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_pending_for_approver(
        &self,
        approver_id: Uuid,
    ) -> Result<Vec<expenses::Model>, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::CurrentApproverId.eq(approver_id))
            .filter(expenses::Column::Status.eq(ExpenseStatus::Pending))
            .order_by_asc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Lists an expense's approval steps ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_approvals(&self, expense_id: Uuid) -> Result<Vec<approvals::Model>, DbErr> {
        approvals::Entity::find()
            .filter(approvals::Column::ExpenseId.eq(expense_id))
            .order_by_asc(approvals::Column::Sequence)
            .all(&self.db)
            .await
    }
}
