//! Employee repository: reporting lines and manager chain resolution.

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use expenza_core::workflow::{ChainMember, WorkflowError};

use crate::entities::{employees, users};

/// Employee repository for reporting-line operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    db: DatabaseConnection,
}

impl EmployeeRepository {
    /// Creates a new employee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the employee record for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<employees::Model>, DbErr> {
        employees::Entity::find()
            .filter(employees::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Resolves a user's manager chain, nearest manager first.
    ///
    /// Walks `manager_id` links until the top of the chain. A visited
    /// set guards against reporting-line cycles; hitting one truncates
    /// the chain instead of looping.
    ///
    /// # Errors
    ///
    /// * `EmployeeNotFound` - the user has no employee record
    /// * `Database` - a query failed
    pub async fn manager_chain(&self, user_id: Uuid) -> Result<Vec<ChainMember>, WorkflowError> {
        let employee = self
            .find_by_user(user_id)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::EmployeeNotFound(user_id))?;

        let mut chain = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::from([user_id]);
        let mut next = employee.manager_id;

        while let Some(manager_id) = next {
            if !visited.insert(manager_id) {
                tracing::warn!(user_id = %user_id, manager_id = %manager_id,
                    "reporting-line cycle detected, truncating manager chain");
                break;
            }

            let manager = users::Entity::find_by_id(manager_id)
                .one(&self.db)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?;
            let Some(manager) = manager else {
                break;
            };

            chain.push(ChainMember {
                user_id: manager.id,
                approver_role: manager.approver_role.map(Into::into),
            });

            next = self
                .find_by_user(manager_id)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?
                .and_then(|record| record.manager_id);
        }

        Ok(chain)
    }

    /// Updates a user's direct manager.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeNotFound` if the user has no employee record,
    /// or `Database` if the update fails.
    pub async fn set_manager(
        &self,
        user_id: Uuid,
        manager_id: Option<Uuid>,
    ) -> Result<employees::Model, WorkflowError> {
        let employee = self
            .find_by_user(user_id)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::EmployeeNotFound(user_id))?;

        let mut active: employees::ActiveModel = employee.into();
        active.manager_id = Set(manager_id);
        active.updated_at = Set(chrono::Utc::now().into());

        active
            .update(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }
}
