//! Read-only management endpoints

use axum::{Json, Router, extract::State, routing::get};
use relay_core::RuleTarget;
use serde::Serialize;

use crate::state::AppState;

/// One ingress rule as rendered in listings
#[derive(Serialize)]
struct RuleEntry {
    pattern: String,
    target: String,
}

/// One backend as rendered in listings
#[derive(Serialize)]
struct BackendEntry {
    name: String,
    address: String,
    port: u16,
    liveness_path: String,
}

/// GET /routes - the loaded ingress table, in evaluation order
async fn list_routes(State(state): State<AppState>) -> Json<Vec<RuleEntry>> {
    let entries = state
        .router
        .rules()
        .rules()
        .iter()
        .map(|rule| RuleEntry {
            pattern: rule.pattern.as_str().to_string(),
            target: match &rule.target {
                RuleTarget::Backend(name) => name.clone(),
                RuleTarget::NotFound => "not_found".to_string(),
            },
        })
        .collect();

    Json(entries)
}

/// GET /backends - the registry contents, in declaration order
async fn list_backends(State(state): State<AppState>) -> Json<Vec<BackendEntry>> {
    let entries = state
        .registry
        .iter()
        .map(|backend| BackendEntry {
            name: backend.name.clone(),
            address: backend.address.clone(),
            port: backend.port,
            liveness_path: backend.liveness_path.clone(),
        })
        .collect();

    Json(entries)
}

/// Create management routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/routes", get(list_routes))
        .route("/backends", get(list_backends))
}
