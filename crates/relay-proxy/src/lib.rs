//! Outbound HTTP plumbing for the relay gateway
//!
//! This crate holds the static backend table and the single-attempt
//! service client with failure classification.

pub mod client;
pub mod error;
pub mod registry;

pub use client::{CallFailure, CallOutcome, ServiceClient, ServiceClientConfig};
pub use error::{ClientError, FailureKind};
pub use registry::{Backend, BackendRegistry};
