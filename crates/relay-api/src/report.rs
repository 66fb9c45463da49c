//! Rendering of health reports and call outcomes
//!
//! Pure formatting: the semantic content of a report or outcome passes
//! through verbatim so operators can act on a response without consulting
//! gateway logs.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use relay_core::{HealthReport, OverallHealth, ProbeResult};
use relay_proxy::{CallOutcome, FailureKind};
use serde::Serialize;
use serde_json::{Value, json};

/// Body of a health response
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: OverallHealth,
    pub probes: Vec<ProbeResult>,
    pub generated_at: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub version: &'static str,
}

/// Render a health report with gateway metadata attached
pub fn health_body(report: &HealthReport, started_at: DateTime<Utc>) -> HealthBody {
    HealthBody {
        status: report.overall,
        probes: report.probes.clone(),
        generated_at: report.generated_at,
        uptime_seconds: (Utc::now() - started_at).num_seconds(),
        version: env!("CARGO_PKG_VERSION"),
    }
}

/// HTTP status for a composite verdict
///
/// Degraded still serves traffic, so only unhealthy maps to an error
/// status.
pub fn health_status(overall: OverallHealth) -> StatusCode {
    match overall {
        OverallHealth::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        OverallHealth::Healthy | OverallHealth::Degraded => StatusCode::OK,
    }
}

/// HTTP status representing a failed call outcome
pub fn outcome_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::ConnectionRefused
        | FailureKind::Unreachable
        | FailureKind::BackendError => StatusCode::BAD_GATEWAY,
    }
}

/// Render a failed outcome; kind and diagnostics are surfaced verbatim
pub fn failure_body(outcome: &CallOutcome) -> Value {
    let failure = outcome.failure.as_ref();

    json!({
        "error": {
            "kind": failure.map(|f| f.kind.as_str()),
            "backend": outcome.backend,
            "address": outcome.address,
            "path": outcome.path,
            "elapsed_ms": outcome.elapsed_ms,
            "status": failure.and_then(|f| f.status),
            "diagnostics": failure.map(|f| &f.diagnostics),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::ProbeState;
    use relay_proxy::CallFailure;
    use std::collections::BTreeMap;

    fn failed_outcome() -> CallOutcome {
        let mut diagnostics = BTreeMap::new();
        diagnostics.insert("backend".to_string(), "app2".to_string());
        diagnostics.insert("address".to_string(), "127.0.0.1:5000".to_string());
        diagnostics.insert(
            "hint".to_string(),
            FailureKind::ConnectionRefused.remediation_hint().to_string(),
        );

        CallOutcome {
            backend: "app2".to_string(),
            address: "127.0.0.1:5000".to_string(),
            path: "/status".to_string(),
            elapsed_ms: 12,
            status: None,
            content_type: None,
            payload: None,
            failure: Some(CallFailure {
                kind: FailureKind::ConnectionRefused,
                status: None,
                diagnostics,
            }),
        }
    }

    #[test]
    fn failure_body_surfaces_kind_and_diagnostics() {
        let body = failure_body(&failed_outcome());

        assert_eq!(body["error"]["kind"], "connection_refused");
        assert_eq!(body["error"]["backend"], "app2");
        assert_eq!(body["error"]["address"], "127.0.0.1:5000");
        assert_eq!(
            body["error"]["diagnostics"]["hint"],
            FailureKind::ConnectionRefused.remediation_hint()
        );
    }

    #[test]
    fn outcome_status_mapping() {
        assert_eq!(
            outcome_status(FailureKind::Timeout),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            outcome_status(FailureKind::ConnectionRefused),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            outcome_status(FailureKind::Unreachable),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            outcome_status(FailureKind::BackendError),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn only_unhealthy_maps_to_an_error_status() {
        assert_eq!(health_status(OverallHealth::Healthy), StatusCode::OK);
        assert_eq!(health_status(OverallHealth::Degraded), StatusCode::OK);
        assert_eq!(
            health_status(OverallHealth::Unhealthy),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn health_body_keeps_probe_order() {
        let report = HealthReport {
            overall: OverallHealth::Healthy,
            probes: vec![
                ProbeResult::up("tunnel", 3),
                ProbeResult::up("app1", 8),
            ],
            generated_at: Utc::now(),
        };

        let body = health_body(&report, Utc::now());
        assert_eq!(body.probes[0].component, "tunnel");
        assert_eq!(body.probes[1].component, "app1");
        assert_eq!(body.probes[0].state, ProbeState::Up);
        assert!(body.uptime_seconds >= 0);
    }
}
