//! Exchange rate snapshot and cross-rate lookup.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::conversion::convert_amount;
use crate::workflow::error::WorkflowError;

/// A snapshot of exchange rates against one base currency, as served by
/// the rates provider.
///
/// Rates between two non-base currencies are derived as cross rates
/// through the base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    /// Base currency code the rates are quoted against.
    pub base: String,
    /// Date the snapshot was taken.
    pub effective_date: NaiveDate,
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    /// Creates an empty table for a base currency. The base itself is
    /// seeded with rate 1.
    #[must_use]
    pub fn new(base: impl Into<String>, effective_date: NaiveDate) -> Self {
        let base = base.into();
        let mut rates = HashMap::new();
        rates.insert(base.clone(), Decimal::ONE);
        Self {
            base,
            effective_date,
            rates,
        }
    }

    /// Records the rate for one unit of the base currency in `code`.
    pub fn insert(&mut self, code: impl Into<String>, rate: Decimal) {
        self.rates.insert(code.into(), rate);
    }

    /// Number of currencies in the table, base included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if the table holds only the base currency.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.len() <= 1
    }

    /// Returns the rate converting one unit of `from` into `to`.
    ///
    /// # Errors
    ///
    /// Returns `ConversionUnavailable` if either currency is missing
    /// from the snapshot or its rate is non-positive.
    pub fn rate_between(&self, from: &str, to: &str) -> Result<Decimal, WorkflowError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let unavailable = || WorkflowError::ConversionUnavailable {
            from: from.to_string(),
            to: to.to_string(),
        };

        let from_rate = self.rates.get(from).copied().ok_or_else(unavailable)?;
        let to_rate = self.rates.get(to).copied().ok_or_else(unavailable)?;
        if from_rate <= Decimal::ZERO || to_rate <= Decimal::ZERO {
            return Err(unavailable());
        }

        Ok(to_rate / from_rate)
    }

    /// Converts `amount` from one currency to another, rounded to the
    /// converted-amount scale.
    ///
    /// # Errors
    ///
    /// Returns `ConversionUnavailable` if no rate can be derived.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, WorkflowError> {
        let rate = self.rate_between(from, to)?;
        Ok(convert_amount(amount, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> RateTable {
        let mut table = RateTable::new("USD", NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        table.insert("EUR", dec!(0.92));
        table.insert("IDR", dec!(15000));
        table
    }

    #[test]
    fn test_base_to_quote() {
        let rate = table().rate_between("USD", "EUR").unwrap();
        assert_eq!(rate, dec!(0.92));
    }

    #[test]
    fn test_quote_to_base() {
        let converted = table().convert(dec!(92), "EUR", "USD").unwrap();
        assert_eq!(converted, dec!(100.00));
    }

    #[test]
    fn test_cross_rate_through_base() {
        // EUR -> IDR = 15000 / 0.92
        let converted = table().convert(dec!(0.92), "EUR", "IDR").unwrap();
        assert_eq!(converted, dec!(15000.00));
    }

    #[test]
    fn test_same_currency_is_identity() {
        let converted = table().convert(dec!(42.50), "EUR", "EUR").unwrap();
        assert_eq!(converted, dec!(42.50));
    }

    #[test]
    fn test_missing_currency_is_unavailable() {
        let result = table().rate_between("GBP", "USD");
        assert!(matches!(
            result,
            Err(WorkflowError::ConversionUnavailable { .. })
        ));
        let err = table().rate_between("USD", "GBP").unwrap_err();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_non_positive_rate_is_unavailable() {
        let mut table = table();
        table.insert("XXX", Decimal::ZERO);
        assert!(table.rate_between("XXX", "USD").is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = RateTable::new("USD", NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert!(table.is_empty());
        assert_eq!(table.len(), 1);
        assert!(!self::table().is_empty());
    }
}
