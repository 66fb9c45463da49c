//! Client error types and failure classification

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Duplicate backend name: {0}")]
    DuplicateBackend(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Why an outbound call failed
///
/// Kinds are deliberately distinct so operators and alerting can branch on
/// them instead of re-deriving the cause from logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response within the deadline
    Timeout,
    /// The backend process is not listening on the target port
    ConnectionRefused,
    /// The backend hostname did not resolve, or there is no network path
    Unreachable,
    /// The backend answered with a non-success status
    BackendError,
}

impl FailureKind {
    /// Stable identifier used in response bodies and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectionRefused => "connection_refused",
            FailureKind::Unreachable => "unreachable",
            FailureKind::BackendError => "backend_error",
        }
    }

    /// Operator-facing remediation hint for this failure kind
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            FailureKind::Timeout => {
                "increase the call timeout or check the backend for a hung handler"
            }
            FailureKind::ConnectionRefused => {
                "verify the backend process is running and attached to the same network"
            }
            FailureKind::Unreachable => {
                "check internal DNS for the backend hostname and the network path between hosts"
            }
            FailureKind::BackendError => {
                "inspect the backend's own logs; the process is reachable but returned an error status"
            }
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a transport-level reqwest error onto a failure kind
///
/// Refused connections are told apart from resolution and routing failures
/// by walking the error source chain down to the socket error.
pub(crate) fn classify(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        return FailureKind::Timeout;
    }

    if err.is_connect() {
        let mut source = std::error::Error::source(err);
        while let Some(inner) = source {
            if let Some(io) = inner.downcast_ref::<std::io::Error>() {
                return match io.kind() {
                    std::io::ErrorKind::ConnectionRefused => FailureKind::ConnectionRefused,
                    _ => FailureKind::Unreachable,
                };
            }
            source = inner.source();
        }
        return FailureKind::Unreachable;
    }

    FailureKind::Unreachable
}
