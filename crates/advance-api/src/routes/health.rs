//! Liveness and readiness checks

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tracing::error;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// Answers 503 while the store is unreachable
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let (status, database, code) = match state.db.ping().await {
        Ok(()) => ("healthy", "up", StatusCode::OK),
        Err(e) => {
            error!("Health check could not reach the database: {}", e);
            ("degraded", "down", StatusCode::SERVICE_UNAVAILABLE)
        }
    };
    metrics::counter!("advance_health_checks_total", "status" => status).increment(1);

    (
        code,
        Json(HealthReport {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
}
