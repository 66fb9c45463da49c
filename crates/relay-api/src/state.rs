//! Application state

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use relay_core::{HealthAggregator, IngressRouter};
use relay_proxy::{BackendRegistry, ServiceClient};

/// Application state shared across handlers
///
/// Everything here is read-only after startup; handlers never mutate
/// shared state across requests.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BackendRegistry>,
    pub router: Arc<IngressRouter>,
    pub client: Arc<ServiceClient>,
    pub aggregator: Arc<HealthAggregator>,
    /// Deadline for forwarded requests
    pub dispatch_timeout: Duration,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        registry: Arc<BackendRegistry>,
        router: Arc<IngressRouter>,
        client: Arc<ServiceClient>,
        aggregator: Arc<HealthAggregator>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            router,
            client,
            aggregator,
            dispatch_timeout,
            started_at: Utc::now(),
        }
    }
}

/// Handle to the installed Prometheus recorder
pub struct MetricsHandle {
    handle: PrometheusHandle,
}

impl MetricsHandle {
    /// Install the global recorder; call once at startup
    pub fn install() -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }
}
