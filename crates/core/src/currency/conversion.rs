//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for converted amounts:
//! - Always round to 2 decimal places (company-currency money columns)
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Decimal places of converted company-currency amounts.
pub const CONVERTED_SCALE: u32 = 2;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative
/// errors across a company's expense history.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal) -> Decimal {
    let converted = amount * rate;
    converted.round_dp_with_strategy(CONVERTED_SCALE, RoundingStrategy::MidpointNearestEven)
}
