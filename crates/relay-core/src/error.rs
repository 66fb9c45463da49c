//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Client error: {0}")]
    Client(#[from] relay_proxy::ClientError),

    #[error("Ingress rule references unknown backend: {0}")]
    UnknownRuleBackend(String),

    #[error("The catch-all pattern is reserved for the terminal not-found rule")]
    ReservedCatchAll,

    #[error("Probe {0} has an empty command")]
    EmptyProbeCommand(String),
}
