//! Exchange rate routes: provider refresh and listing.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    AppState,
    middleware::AuthUser,
    routes::{app_error_response, database_error, require_role, workflow_error_response},
};
use expenza_core::workflow::WorkflowError;
use expenza_db::{CompanyRepository, ExchangeRateRepository};
use expenza_shared::AppError;

/// Creates the exchange rate routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rates", get(list_rates))
        .route("/rates/refresh", post(refresh_rates))
}

/// Rate provider response: a snapshot of rates quoted against one base.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    base: String,
    #[serde(default)]
    date: Option<NaiveDate>,
    rates: HashMap<String, Decimal>,
}

/// GET /rates - All stored rates for the company, newest snapshot first.
async fn list_rates(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    match ExchangeRateRepository::new((*state.db).clone())
        .list_rates(auth.company_id())
        .await
    {
        Ok(rates) => (StatusCode::OK, Json(json!({ "data": rates }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list exchange rates");
            database_error()
        }
    }
}

/// POST /rates/refresh - Pull today's snapshot from the rate provider.
///
/// Stores rates quoted against the company currency; conversions at
/// submission derive cross rates from the stored snapshot.
async fn refresh_rates(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let company = match CompanyRepository::new((*state.db).clone())
        .find_by_id(auth.company_id())
        .await
    {
        Ok(Some(c)) => c,
        Ok(None) => {
            return workflow_error_response(&WorkflowError::CompanyNotFound(auth.company_id()));
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch company");
            return database_error();
        }
    };

    let url = format!("{}/{}", state.rates.provider_url, company.currency_code);
    let snapshot = match fetch_snapshot(&url).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, url = %url, "Rate provider request failed");
            return app_error_response(&AppError::ExternalService(
                "exchange rate provider is unavailable".to_string(),
            ));
        }
    };

    if !snapshot.base.eq_ignore_ascii_case(&company.currency_code) {
        error!(
            expected = %company.currency_code,
            got = %snapshot.base,
            "Rate provider returned an unexpected base currency"
        );
        return app_error_response(&AppError::ExternalService(
            "exchange rate provider returned an unexpected base currency".to_string(),
        ));
    }

    let effective_date = snapshot
        .date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    // Non-positive rates are unusable for conversion; drop them.
    let rates: Vec<(String, Decimal)> = snapshot
        .rates
        .into_iter()
        .filter(|(_, rate)| *rate > Decimal::ZERO)
        .map(|(code, rate)| (code.to_uppercase(), rate))
        .collect();

    let stored = match ExchangeRateRepository::new((*state.db).clone())
        .upsert_snapshot(
            company.id,
            &company.currency_code,
            effective_date,
            &rates,
        )
        .await
    {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to store rate snapshot");
            return database_error();
        }
    };

    info!(
        company_id = %company.id,
        base = %company.currency_code,
        effective_date = %effective_date,
        rates = stored,
        "Exchange rate snapshot refreshed"
    );

    (
        StatusCode::OK,
        Json(json!({
            "base": company.currency_code,
            "effective_date": effective_date,
            "rates_stored": stored
        })),
    )
        .into_response()
}

async fn fetch_snapshot(url: &str) -> Result<ProviderResponse, reqwest::Error> {
    reqwest::Client::new()
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<ProviderResponse>()
        .await
}

fn require_admin(auth: &AuthUser) -> Result<(), axum::response::Response> {
    require_role(
        auth,
        |r| r.can_manage_rules(),
        "only admins can refresh exchange rates",
    )
}
