//! `SeaORM` entity definitions for the Expenza schema.

pub mod approval_flows;
pub mod approval_rules;
pub mod approvals;
pub mod companies;
pub mod employees;
pub mod exchange_rates;
pub mod expenses;
pub mod sea_orm_active_enums;
pub mod users;
