//! API routes

mod dispatch;
mod health;
mod manage;
pub mod metrics;

use axum::Router;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
///
/// The gateway's own endpoints are matched first; every other request
/// falls through to ingress dispatch.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Composite health
        .merge(health::routes())
        // Read-only management API
        .merge(manage::routes())
        // Everything else is routed by hostname
        .fallback(dispatch::dispatch)
        .with_state(state);

    // Add metrics endpoint if a recorder handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
