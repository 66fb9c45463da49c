//! Reachability core for the relay gateway
//!
//! This crate provides ingress routing over an ordered hostname rule table
//! and cross-layer health aggregation over bounded probes.

pub mod error;
pub mod health;
pub mod ingress;

pub use error::CoreError;
pub use health::{
    BackendProbe, CommandProbe, HealthAggregator, HealthReport, OverallHealth, Probe, ProbeResult,
    ProbeState,
};
pub use ingress::{
    HostPattern, IngressRouter, IngressRule, RouteDecision, RuleSet, RuleTarget, normalize_host,
};
