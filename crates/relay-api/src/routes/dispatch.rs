//! Ingress dispatch
//!
//! The fallback handler: match the request's host header against the
//! ingress table and relay the request to the selected backend, or answer
//! with the fixed no-route response.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use relay_core::{RouteDecision, normalize_host};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::report;
use crate::state::AppState;

/// Relay one request to the backend selected by its host header
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    metrics::counter!("relay_requests_total").increment(1);

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(normalize_host)
        .unwrap_or_default();

    let backend = match state.router.resolve(&host) {
        RouteDecision::Backend { backend, rule_index } => {
            debug!("Host {} matched rule {} -> {}", host, rule_index, backend.name);
            backend
        }
        RouteDecision::NoRoute { .. } => {
            metrics::counter!("relay_no_route_total").increment(1);
            return Err(ApiError::NoRoute(host));
        }
    };

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let mut forward_headers = HeaderMap::new();
    let request_id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        forward_headers.insert("x-request-id", value);
    }
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        forward_headers.insert(header::CONTENT_TYPE, content_type.clone());
    }

    let outcome = state
        .client
        .request(
            &backend.name,
            method,
            &path,
            forward_headers,
            (!body.is_empty()).then(|| body),
            state.dispatch_timeout,
        )
        .await?;

    if let Some(failure) = &outcome.failure {
        metrics::counter!("relay_call_failures_total", "kind" => failure.kind.as_str())
            .increment(1);
        info!(
            "Dispatch to {} failed: {} after {}ms (request {})",
            outcome.backend, failure.kind, outcome.elapsed_ms, request_id
        );
        let status = report::outcome_status(failure.kind);
        return Ok((status, Json(report::failure_body(&outcome))).into_response());
    }

    let status = StatusCode::from_u16(outcome.status.unwrap_or(200)).unwrap_or(StatusCode::OK);
    let mut response = (status, outcome.payload.clone().unwrap_or_default()).into_response();
    if let Some(content_type) = outcome.content_type.as_deref()
        && let Ok(value) = HeaderValue::from_str(content_type)
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }

    Ok(response)
}
