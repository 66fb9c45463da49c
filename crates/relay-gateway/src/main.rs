//! Relay gateway - hostname ingress, internal dispatch, and composite
//! health for a tunnel-fronted service deployment

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use relay_api::{AppState, MetricsHandle, create_router};
use relay_core::{
    BackendProbe, CommandProbe, HealthAggregator, HostPattern, IngressRouter, IngressRule, Probe,
    RuleSet, RuleTarget,
};
use relay_proxy::{Backend, BackendRegistry, ServiceClient, ServiceClientConfig};

/// Relay gateway - reachability edge for internal services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "RELAY_GATEWAY_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "RELAY_GATEWAY_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting relay gateway v{}", env!("CARGO_PKG_VERSION"));

    // Build the backend table
    let backends = config
        .backends
        .iter()
        .map(|entry| Backend {
            name: entry.name.clone(),
            address: entry.address.clone(),
            port: entry.port,
            liveness_path: entry.liveness_path.clone(),
        })
        .collect();
    let registry = Arc::new(BackendRegistry::new(backends)?);

    // Initialize the outbound client
    let dispatch_timeout = Duration::from_millis(config.proxy.timeout_ms);
    let client = Arc::new(ServiceClient::new(
        registry.clone(),
        ServiceClientConfig {
            default_timeout: dispatch_timeout,
            forwarded_by: config.proxy.forwarded_by.clone(),
        },
    )?);

    // Load the ingress table
    let declared = config
        .ingress
        .iter()
        .map(|entry| IngressRule {
            pattern: HostPattern::parse(&entry.hostname),
            target: RuleTarget::Backend(entry.backend.clone()),
        })
        .collect();
    let rules = RuleSet::load(declared, &registry)?;
    let rule_count = rules.rules().len();
    let router = Arc::new(IngressRouter::new(rules, registry.clone()));

    // Assemble the probe set: external layers first, then per-backend
    // liveness, in declaration order.
    let probe_timeout = Duration::from_millis(config.health.probe_timeout_ms);
    let mut probes: Vec<Arc<dyn Probe>> = Vec::new();
    for entry in &config.probes {
        probes.push(Arc::new(CommandProbe::new(
            entry.name.clone(),
            entry.command.clone(),
            entry.critical,
        )?));
    }
    for entry in &config.backends {
        probes.push(Arc::new(BackendProbe::new(
            entry.name.clone(),
            client.clone(),
            entry.critical,
            probe_timeout,
        )));
    }
    let aggregator = Arc::new(HealthAggregator::new(probes, probe_timeout));

    // Install the metrics recorder
    let metrics_handle = match MetricsHandle::install() {
        Ok(handle) => Some(Arc::new(handle)),
        Err(e) => {
            warn!("Failed to install metrics recorder: {}", e);
            None
        }
    };

    // Create application state
    let state = AppState::new(
        registry.clone(),
        router,
        client,
        aggregator,
        dispatch_timeout,
    );

    // Create router
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);
    info!(
        "{} backends, {} ingress rules (terminal included)",
        registry.len(),
        rule_count
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
