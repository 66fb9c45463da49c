//! Concurrent probe execution and reduction

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::debug;

use super::{HealthReport, OverallHealth, Probe, ProbeResult, ProbeState};

/// Runs registered probes concurrently and reduces them to one verdict
pub struct HealthAggregator {
    probes: Vec<Arc<dyn Probe>>,
    probe_timeout: Duration,
}

impl HealthAggregator {
    pub fn new(probes: Vec<Arc<dyn Probe>>, probe_timeout: Duration) -> Self {
        Self {
            probes,
            probe_timeout,
        }
    }

    /// Evaluate every probe and reduce to a composite report
    ///
    /// Probes run as independent tasks, each bounded by the probe timeout,
    /// so one hung dependency cannot stall the report past its own
    /// deadline. A timed-out or crashed probe is demoted to unknown; the
    /// evaluation itself always produces a report. Results keep
    /// declaration order no matter when each probe finishes.
    pub async fn evaluate(&self) -> HealthReport {
        let tasks: Vec<_> = self
            .probes
            .iter()
            .map(|probe| {
                let probe = probe.clone();
                let deadline = self.probe_timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(deadline, probe.check()).await {
                        Ok(result) => result,
                        Err(_) => ProbeResult::unknown(
                            probe.name(),
                            format!("probe timed out after {}ms", deadline.as_millis()),
                        ),
                    }
                })
            })
            .collect();

        let mut results = Vec::with_capacity(self.probes.len());
        for (probe, outcome) in self.probes.iter().zip(join_all(tasks).await) {
            results.push(
                outcome.unwrap_or_else(|_| ProbeResult::unknown(probe.name(), "probe task crashed")),
            );
        }

        let overall = self.reduce(&results);
        debug!("Health evaluation: {:?} over {} probes", overall, results.len());

        HealthReport {
            overall,
            probes: results,
            generated_at: Utc::now(),
        }
    }

    fn reduce(&self, results: &[ProbeResult]) -> OverallHealth {
        let mut overall = OverallHealth::Healthy;
        for (probe, result) in self.probes.iter().zip(results) {
            match result.state {
                ProbeState::Down if probe.critical() => return OverallHealth::Unhealthy,
                ProbeState::Down | ProbeState::Unknown => overall = OverallHealth::Degraded,
                ProbeState::Up => {}
            }
        }
        overall
    }
}
