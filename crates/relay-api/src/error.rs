//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No ingress route for host: {0}")]
    NoRoute(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Core error: {0}")]
    Core(#[from] relay_core::CoreError),

    #[error("Client error: {0}")]
    Client(#[from] relay_proxy::ClientError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // A missing route is terminal, never transient; the response
            // shape is fixed.
            ApiError::NoRoute(host) => (
                StatusCode::NOT_FOUND,
                "NO_ROUTE",
                format!("no ingress route for host {}", host),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
            ApiError::Core(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                e.to_string(),
            ),
            ApiError::Client(e) => match e {
                relay_proxy::ClientError::UnknownBackend(name) => (
                    StatusCode::BAD_GATEWAY,
                    "UNKNOWN_BACKEND",
                    format!("backend {} is not registered", name),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    e.to_string(),
                ),
            },
        };

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
