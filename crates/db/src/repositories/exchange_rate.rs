//! Exchange rate repository.
//!
//! Stores daily rate snapshots quoted against a base currency and
//! rebuilds the latest snapshot as a core `RateTable` for conversion.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use uuid::Uuid;

use expenza_core::currency::RateTable;

use crate::entities::exchange_rates;

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores one snapshot of rates for `effective_date`, upserting on
    /// the (company, base, currency, date) key.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn upsert_snapshot(
        &self,
        company_id: Uuid,
        base_currency: &str,
        effective_date: NaiveDate,
        rates: &[(String, Decimal)],
    ) -> Result<u64, DbErr> {
        if rates.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().into();
        let models: Vec<exchange_rates::ActiveModel> = rates
            .iter()
            .map(|(code, rate)| exchange_rates::ActiveModel {
                id: Set(Uuid::new_v4()),
                company_id: Set(company_id),
                base_currency: Set(base_currency.to_string()),
                currency: Set(code.clone()),
                rate: Set(*rate),
                effective_date: Set(effective_date),
                created_at: Set(now),
            })
            .collect();

        let inserted = u64::try_from(models.len()).unwrap_or(u64::MAX);
        exchange_rates::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    exchange_rates::Column::CompanyId,
                    exchange_rates::Column::BaseCurrency,
                    exchange_rates::Column::Currency,
                    exchange_rates::Column::EffectiveDate,
                ])
                .update_column(exchange_rates::Column::Rate)
                .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(inserted)
    }

    /// Rebuilds the most recent rate snapshot for a company as a
    /// `RateTable`, or `None` if no rates are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_table(
        &self,
        company_id: Uuid,
        base_currency: &str,
    ) -> Result<Option<RateTable>, DbErr> {
        let latest_date: Option<NaiveDate> = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::CompanyId.eq(company_id))
            .filter(exchange_rates::Column::BaseCurrency.eq(base_currency))
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .limit(1)
            .all(&self.db)
            .await?
            .first()
            .map(|row| row.effective_date);

        let Some(date) = latest_date else {
            return Ok(None);
        };

        let rows = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::CompanyId.eq(company_id))
            .filter(exchange_rates::Column::BaseCurrency.eq(base_currency))
            .filter(exchange_rates::Column::EffectiveDate.eq(date))
            .all(&self.db)
            .await?;

        let mut table = RateTable::new(base_currency, date);
        for row in rows {
            table.insert(row.currency, row.rate);
        }

        Ok(Some(table))
    }

    /// Lists all stored rates for a company, newest snapshot first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_rates(&self, company_id: Uuid) -> Result<Vec<exchange_rates::Model>, DbErr> {
        exchange_rates::Entity::find()
            .filter(exchange_rates::Column::CompanyId.eq(company_id))
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .order_by_asc(exchange_rates::Column::Currency)
            .all(&self.db)
            .await
    }
}
