//! Multi-currency handling for expense amounts.
//!
//! Expenses are stored with both the submitted amount and the amount
//! converted to the company's default currency at submission time.

pub mod conversion;
pub mod exchange;

pub use conversion::convert_amount;
pub use exchange::RateTable;
