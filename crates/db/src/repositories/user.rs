//! User repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    employees,
    sea_orm_active_enums::{ApproverRole, UserRole},
    users,
};

/// Input for creating a user within an existing company.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Company the user belongs to.
    pub company_id: Uuid,
    /// Unique email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Role within the company.
    pub role: UserRole,
    /// Approver role the user fills in flows, if any.
    pub approver_role: Option<ApproverRole>,
    /// Direct manager's user id, if any.
    pub manager_id: Option<Uuid>,
}

/// User repository for account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user and their employee record in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails (including a duplicate
    /// email).
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, DbErr> {
        let txn = self.db.begin().await?;

        let now = chrono::Utc::now().into();
        let user_id = Uuid::new_v4();

        let user = users::ActiveModel {
            id: Set(user_id),
            company_id: Set(input.company_id),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            name: Set(input.name),
            role: Set(input.role),
            approver_role: Set(input.approver_role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let user = user.insert(&txn).await?;

        let employee = employees::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            user_id: Set(user_id),
            manager_id: Set(input.manager_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        employee.insert(&txn).await?;

        txn.commit().await?;

        Ok(user)
    }

    /// Finds an active user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Finds a user by id, scoped to a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
    }

    /// Replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn update_password(
        &self,
        id: Uuid,
        password_hash: String,
    ) -> Result<users::Model, DbErr> {
        let user = users::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };
        user.update(&self.db).await
    }

    /// Lists a company's users, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}
