//! Health check endpoint with a database liveness probe.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status: `healthy` or `degraded`.
    pub status: &'static str,
    /// Database connectivity: `ok` or `unreachable`.
    pub database: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// GET /health - Service status including a database ping.
///
/// Returns 503 when the database is unreachable so load balancers can
/// rotate the instance out.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: "unreachable",
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
        }
    }
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_payload_shape() {
        let body = serde_json::to_value(HealthResponse {
            status: "degraded",
            database: "unreachable",
            version: "0.0.0",
        })
        .unwrap();

        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], "unreachable");
        assert_eq!(body["version"], "0.0.0");
    }
}
