//! Company repository.

use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{companies, employees, sea_orm_active_enums::UserRole, users};

/// Input for creating a company together with its first admin.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    /// Company display name.
    pub name: String,
    /// Country the company operates in.
    pub country: String,
    /// Default currency expenses convert into.
    pub currency_code: String,
    /// Admin email.
    pub admin_email: String,
    /// Admin display name.
    pub admin_name: String,
    /// Pre-hashed admin password.
    pub admin_password_hash: String,
}

/// Company repository for company lifecycle operations.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company and its admin user in one transaction.
    ///
    /// The admin gets an employee record with no manager; they sit at
    /// the top of every manager chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails (including a duplicate
    /// admin email).
    pub async fn create_with_admin(
        &self,
        input: CreateCompanyInput,
    ) -> Result<(companies::Model, users::Model), DbErr> {
        let txn = self.db.begin().await?;

        let now = chrono::Utc::now().into();
        let company_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();

        let company = companies::ActiveModel {
            id: Set(company_id),
            name: Set(input.name),
            country: Set(input.country),
            currency_code: Set(input.currency_code),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let company = company.insert(&txn).await?;

        let admin = users::ActiveModel {
            id: Set(admin_id),
            company_id: Set(company_id),
            email: Set(input.admin_email),
            password_hash: Set(input.admin_password_hash),
            name: Set(input.admin_name),
            role: Set(UserRole::Admin),
            approver_role: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let admin = admin.insert(&txn).await?;

        let employee = employees::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            user_id: Set(admin_id),
            manager_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        employee.insert(&txn).await?;

        txn.commit().await?;

        Ok((company, admin))
    }

    /// Finds a company by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(id).one(&self.db).await
    }
}
