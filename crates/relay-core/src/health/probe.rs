//! Probe implementations for the dependency layers

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use relay_proxy::ServiceClient;
use tokio::process::Command;

use super::ProbeResult;
use crate::error::CoreError;

/// A bounded-time check of one dependency's availability
#[async_trait]
pub trait Probe: Send + Sync {
    /// Component name reported in the health report
    fn name(&self) -> &str;

    /// Whether this dependency gates traffic entirely
    fn critical(&self) -> bool;

    /// Run the check; implementations report their own failures as results
    async fn check(&self) -> ProbeResult;
}

/// Liveness probe over a registered backend's health path
pub struct BackendProbe {
    backend: String,
    client: Arc<ServiceClient>,
    critical: bool,
    timeout: Duration,
}

impl BackendProbe {
    pub fn new(
        backend: impl Into<String>,
        client: Arc<ServiceClient>,
        critical: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            backend: backend.into(),
            client,
            critical,
            timeout,
        }
    }
}

#[async_trait]
impl Probe for BackendProbe {
    fn name(&self) -> &str {
        &self.backend
    }

    fn critical(&self) -> bool {
        self.critical
    }

    async fn check(&self) -> ProbeResult {
        match self.client.probe(&self.backend, self.timeout).await {
            Ok(outcome) if outcome.is_success() => {
                ProbeResult::up(&self.backend, outcome.elapsed_ms)
            }
            Ok(outcome) => {
                let detail = outcome
                    .failure
                    .as_ref()
                    .map(|failure| {
                        let detail = failure
                            .diagnostics
                            .get("detail")
                            .map(String::as_str)
                            .unwrap_or("liveness check failed");
                        format!("{}: {}", failure.kind, detail)
                    })
                    .unwrap_or_else(|| "liveness check failed".to_string());
                ProbeResult::down(&self.backend, Some(outcome.elapsed_ms), detail)
            }
            Err(err) => ProbeResult::unknown(&self.backend, err.to_string()),
        }
    }
}

/// Probe that shells out to an external checking tool
///
/// Used for the layers the gateway cannot reach over HTTP: the tunnel
/// daemon and the container runtime. Exit 0 means up, a non-zero exit
/// means down, and a command that cannot be spawned at all means the
/// state is unknown.
pub struct CommandProbe {
    name: String,
    program: String,
    args: Vec<String>,
    critical: bool,
}

impl CommandProbe {
    pub fn new(name: String, command: Vec<String>, critical: bool) -> Result<Self, CoreError> {
        let mut parts = command.into_iter();
        let program = parts.next().ok_or(CoreError::EmptyProbeCommand(name.clone()))?;

        Ok(Self {
            name,
            program,
            args: parts.collect(),
            critical,
        })
    }
}

#[async_trait]
impl Probe for CommandProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn critical(&self) -> bool {
        self.critical
    }

    async fn check(&self) -> ProbeResult {
        let started = Instant::now();

        match Command::new(&self.program).args(&self.args).output().await {
            Ok(output) => {
                let latency = started.elapsed().as_millis() as u64;
                if output.status.success() {
                    ProbeResult::up(&self.name, latency)
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let detail = match (output.status.code(), stderr.lines().next()) {
                        (Some(code), Some(line)) if !line.trim().is_empty() => {
                            format!("{} exited with status {}: {}", self.program, code, line.trim())
                        }
                        (Some(code), _) => {
                            format!("{} exited with status {}", self.program, code)
                        }
                        (None, _) => format!("{} terminated by signal", self.program),
                    };
                    ProbeResult::down(&self.name, Some(latency), detail)
                }
            }
            // A missing checking tool says nothing about the layer itself.
            Err(err) => ProbeResult::unknown(
                &self.name,
                format!("failed to run {}: {}", self.program, err),
            ),
        }
    }
}
