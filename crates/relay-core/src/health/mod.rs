//! Cross-layer health aggregation
//!
//! Independent probes of the layers a request crosses (tunnel daemon,
//! container runtime, each application) reduced into one composite
//! verdict. Partial information always beats total failure: a probe that
//! cannot run reports unknown instead of aborting the evaluation.

mod aggregator;
mod probe;

pub use aggregator::HealthAggregator;
pub use probe::{BackendProbe, CommandProbe, Probe};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Observed availability of one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeState {
    Up,
    Down,
    /// The probe could not determine the state at all
    Unknown,
}

/// Result of one bounded dependency check
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub component: String,
    pub state: ProbeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProbeResult {
    pub fn up(component: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            component: component.into(),
            state: ProbeState::Up,
            latency_ms: Some(latency_ms),
            detail: None,
        }
    }

    pub fn down(
        component: impl Into<String>,
        latency_ms: Option<u64>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            state: ProbeState::Down,
            latency_ms,
            detail: Some(detail.into()),
        }
    }

    pub fn unknown(component: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            state: ProbeState::Unknown,
            latency_ms: None,
            detail: Some(detail.into()),
        }
    }
}

/// Composite verdict over all probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    /// A non-critical layer is down or undeterminable
    Degraded,
    /// A layer critical to serving traffic is down
    Unhealthy,
}

/// One health evaluation, recomputed per request and never persisted
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub overall: OverallHealth,
    /// Probe results in caller-declared order
    pub probes: Vec<ProbeResult>,
    pub generated_at: DateTime<Utc>,
}
