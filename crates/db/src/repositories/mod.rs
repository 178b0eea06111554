//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod company;
pub mod employee;
pub mod exchange_rate;
pub mod expense;
pub mod rule;
pub mod user;
pub mod workflow;

pub use company::{CompanyRepository, CreateCompanyInput};
pub use employee::EmployeeRepository;
pub use exchange_rate::ExchangeRateRepository;
pub use expense::ExpenseRepository;
pub use rule::{FlowStepInput, RuleRepository, UpsertRuleInput};
pub use user::{CreateUserInput, UserRepository};
pub use workflow::{DecisionRecord, SubmitExpenseInput, SubmittedExpense, WorkflowRepository};
