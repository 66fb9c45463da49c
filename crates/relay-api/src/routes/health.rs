//! Composite health endpoint

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::report;
use crate::state::AppState;

/// Health check handler
///
/// Always answers with a full report; a layer whose state could not be
/// determined shows up as an unknown probe instead of failing the
/// request.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    metrics::counter!("relay_health_checks_total").increment(1);

    let report = state.aggregator.evaluate().await;
    let status = report::health_status(report.overall);

    (status, Json(report::health_body(&report, state.started_at)))
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
}
