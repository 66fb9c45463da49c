//! Static backend table

use crate::error::ClientError;

/// A named internal service reachable by address and port
#[derive(Debug, Clone)]
pub struct Backend {
    /// Unique logical name, referenced by ingress rules
    pub name: String,
    pub address: String,
    pub port: u16,
    /// Path probed for liveness checks
    pub liveness_path: String,
}

impl Backend {
    /// Origin part of this backend's URL
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }

    /// Full URL for a request path
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin(), path)
        } else {
            format!("{}/{}", self.origin(), path)
        }
    }

    /// The address:port pair reported in diagnostics
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Read-only table of backends, keyed uniquely by name
///
/// Built once at startup and never mutated afterwards. Declaration order
/// is preserved so listings and probe sets are deterministic.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Backend>,
}

impl BackendRegistry {
    /// Build the table, rejecting duplicate names
    pub fn new(backends: Vec<Backend>) -> Result<Self, ClientError> {
        for (idx, backend) in backends.iter().enumerate() {
            if backends[..idx].iter().any(|b| b.name == backend.name) {
                return Err(ClientError::DuplicateBackend(backend.name.clone()));
            }
        }
        Ok(Self { backends })
    }

    /// Look up a backend by name
    pub fn get(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Backends in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
