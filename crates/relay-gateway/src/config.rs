//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// Backend table, in declaration order
    #[serde(default)]
    pub backends: Vec<BackendEntry>,
    /// Ingress rules, in evaluation order
    #[serde(default)]
    pub ingress: Vec<IngressEntry>,
    /// External layer checks run alongside the backend liveness probes
    #[serde(default)]
    pub probes: Vec<ProbeEntry>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Outbound call configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Deadline for forwarded requests, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Value of the X-Forwarded-By header added to relayed requests
    #[serde(default = "default_forwarded_by")]
    pub forwarded_by: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            forwarded_by: default_forwarded_by(),
        }
    }
}

/// Health evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Per-probe deadline, in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// One backend service entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendEntry {
    /// Unique logical name, referenced by ingress rules
    pub name: String,
    pub address: String,
    pub port: u16,
    /// Path probed for liveness checks
    #[serde(default = "default_liveness_path")]
    pub liveness_path: String,
    /// Whether this backend must be up for traffic to be served
    #[serde(default = "default_critical")]
    pub critical: bool,
}

/// One hostname-to-backend ingress binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressEntry {
    pub hostname: String,
    pub backend: String,
}

/// One external command probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeEntry {
    pub name: String,
    /// Program and arguments
    pub command: Vec<String>,
    #[serde(default = "default_critical")]
    pub critical: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_forwarded_by() -> String {
    "relay-gateway".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    4000
}

fn default_liveness_path() -> String {
    "/health".to_string()
}

fn default_critical() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1"
            port = 9090

            [proxy]
            timeout_ms = 2500

            [[backends]]
            name = "app1"
            address = "127.0.0.1"
            port = 3000

            [[backends]]
            name = "app2"
            address = "127.0.0.1"
            port = 5000
            liveness_path = "/ping"
            critical = false

            [[ingress]]
            hostname = "app1.example.com"
            backend = "app1"

            [[probes]]
            name = "tunnel"
            command = ["systemctl", "is-active", "--quiet", "cloudflared"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.proxy.timeout_ms, 2500);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[0].liveness_path, "/health");
        assert!(config.backends[0].critical);
        assert_eq!(config.backends[1].liveness_path, "/ping");
        assert!(!config.backends[1].critical);
        assert_eq!(config.ingress[0].backend, "app1");
        assert_eq!(config.probes[0].command[0], "systemctl");
        assert!(config.probes[0].critical);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.proxy.timeout_ms, 5000);
        assert_eq!(config.health.probe_timeout_ms, 4000);
        assert!(config.backends.is_empty());
        assert!(config.ingress.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/relay-gateway.toml").unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
