//! Relay gateway HTTP surface
//!
//! This crate provides the Axum-based API: ingress dispatch, the composite
//! health endpoint, and the read-only management endpoints.

pub mod error;
pub mod report;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
