//! Single-attempt service client with failure classification

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method};
use tracing::{debug, warn};

use crate::error::{ClientError, FailureKind, classify};
use crate::registry::{Backend, BackendRegistry};

/// Service client configuration
#[derive(Clone, Debug)]
pub struct ServiceClientConfig {
    /// Deadline applied when a call does not override it
    pub default_timeout: Duration,
    /// Value of the X-Forwarded-By header added to relayed requests
    pub forwarded_by: String,
}

impl Default for ServiceClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(5000),
            forwarded_by: "relay-gateway".to_string(),
        }
    }
}

/// A classified call failure with operator-facing diagnostics
#[derive(Debug, Clone)]
pub struct CallFailure {
    pub kind: FailureKind,
    /// Status returned by the backend, when it answered at all
    pub status: Option<u16>,
    /// Always carries the backend name, the attempted address, the failure
    /// detail, and a remediation hint keyed by the kind.
    pub diagnostics: BTreeMap<String, String>,
}

/// Result of one outbound call, success or not
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub backend: String,
    pub address: String,
    pub path: String,
    pub elapsed_ms: u64,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub payload: Option<Bytes>,
    pub failure: Option<CallFailure>,
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// HTTP client for calling registered backends
///
/// Every call is a single attempt bounded by a deadline; failures come back
/// as data inside the outcome rather than as errors, so callers decide per
/// failure whether to degrade or retry. Only a backend name missing from
/// the registry is an `Err`.
pub struct ServiceClient {
    registry: Arc<BackendRegistry>,
    http: Client,
    config: ServiceClientConfig,
}

impl ServiceClient {
    /// Create a new service client
    pub fn new(
        registry: Arc<BackendRegistry>,
        config: ServiceClientConfig,
    ) -> Result<Self, ClientError> {
        // Connect timeout stays below the default deadline so refused and
        // unreachable targets fail fast.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            registry,
            http,
            config,
        })
    }

    /// Call a named backend with GET and the default timeout
    pub async fn call(&self, backend: &str, path: &str) -> Result<CallOutcome, ClientError> {
        self.request(
            backend,
            Method::GET,
            path,
            HeaderMap::new(),
            None,
            self.config.default_timeout,
        )
        .await
    }

    /// Probe a backend's liveness path with a bounded deadline
    pub async fn probe(&self, backend: &str, timeout: Duration) -> Result<CallOutcome, ClientError> {
        let path = self
            .registry
            .get(backend)
            .ok_or_else(|| ClientError::UnknownBackend(backend.to_string()))?
            .liveness_path
            .clone();

        self.request(backend, Method::GET, &path, HeaderMap::new(), None, timeout)
            .await
    }

    /// Issue a single request to a named backend
    ///
    /// Any 2xx response is a success. Transport failures and backend error
    /// statuses are classified and returned inside the outcome.
    pub async fn request(
        &self,
        backend: &str,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
        timeout: Duration,
    ) -> Result<CallOutcome, ClientError> {
        let target = self
            .registry
            .get(backend)
            .ok_or_else(|| ClientError::UnknownBackend(backend.to_string()))?
            .clone();

        let url = target.url_for(path);
        debug!("Calling {} ({} {})", target.name, method, url);

        let started = Instant::now();
        let mut request = self
            .http
            .request(method, &url)
            .timeout(timeout)
            .headers(headers)
            .header("X-Forwarded-By", &self.config.forwarded_by);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let elapsed = started.elapsed();
                let kind = classify(&err);
                warn!(
                    "Call to {} failed after {}ms: {} ({})",
                    target.name,
                    elapsed.as_millis(),
                    err,
                    kind
                );
                return Ok(Self::failed_outcome(
                    &target,
                    path,
                    elapsed,
                    kind,
                    None,
                    &err.to_string(),
                ));
            }
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let elapsed = started.elapsed();
            let detail = format!("backend returned HTTP {}", status.as_u16());
            warn!("Call to {} failed: {}", target.name, detail);
            return Ok(Self::failed_outcome(
                &target,
                path,
                elapsed,
                FailureKind::BackendError,
                Some(status.as_u16()),
                &detail,
            ));
        }

        // The body read shares the per-request deadline.
        let payload = match response.bytes().await {
            Ok(payload) => payload,
            Err(err) => {
                let elapsed = started.elapsed();
                let kind = classify(&err);
                return Ok(Self::failed_outcome(
                    &target,
                    path,
                    elapsed,
                    kind,
                    Some(status.as_u16()),
                    &err.to_string(),
                ));
            }
        };

        let elapsed = started.elapsed();
        debug!(
            "Call to {} succeeded in {}ms ({})",
            target.name,
            elapsed.as_millis(),
            status
        );

        Ok(CallOutcome {
            backend: target.name.clone(),
            address: target.authority(),
            path: path.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
            status: Some(status.as_u16()),
            content_type,
            payload: Some(payload),
            failure: None,
        })
    }

    fn failed_outcome(
        target: &Backend,
        path: &str,
        elapsed: Duration,
        kind: FailureKind,
        status: Option<u16>,
        detail: &str,
    ) -> CallOutcome {
        let mut diagnostics = BTreeMap::new();
        diagnostics.insert("backend".to_string(), target.name.clone());
        diagnostics.insert("address".to_string(), target.authority());
        diagnostics.insert("detail".to_string(), detail.to_string());
        diagnostics.insert("hint".to_string(), kind.remediation_hint().to_string());
        if let Some(status) = status {
            diagnostics.insert("status".to_string(), status.to_string());
        }

        CallOutcome {
            backend: target.name.clone(),
            address: target.authority(),
            path: path.to_string(),
            elapsed_ms: elapsed.as_millis() as u64,
            status,
            content_type: None,
            payload: None,
            failure: Some(CallFailure {
                kind,
                status,
                diagnostics,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener as StdTcpListener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const OK_RESPONSE: &str = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 15\r\nconnection: close\r\n\r\n{\"status\":\"ok\"}";
    const ERR_RESPONSE: &str =
        "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

    fn client_for(port: u16) -> ServiceClient {
        let registry = Arc::new(
            BackendRegistry::new(vec![Backend {
                name: "app2".to_string(),
                address: "127.0.0.1".to_string(),
                port,
                liveness_path: "/health".to_string(),
            }])
            .unwrap(),
        );
        ServiceClient::new(registry, ServiceClientConfig::default()).unwrap()
    }

    /// Answer one connection with a canned HTTP response after a delay
    async fn serve_once(listener: TcpListener, response: &'static str, delay: Duration) {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(response.as_bytes()).await;
        }
    }

    #[tokio::test]
    async fn successful_call_returns_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(serve_once(listener, OK_RESPONSE, Duration::ZERO));

        let outcome = client_for(port).call("app2", "/status").await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.status, Some(200));
        assert_eq!(
            outcome.payload.as_deref(),
            Some(br#"{"status":"ok"}"#.as_slice())
        );
        assert_eq!(
            outcome.content_type.as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn refused_connection_is_classified() {
        // Bind then drop to find a local port with nothing listening.
        let port = StdTcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let outcome = client_for(port).call("app2", "/status").await.unwrap();

        let failure = outcome.failure.expect("call should fail");
        assert_eq!(failure.kind, FailureKind::ConnectionRefused);
        assert_eq!(
            failure.diagnostics.get("backend").map(String::as_str),
            Some("app2")
        );
        assert_eq!(
            failure.diagnostics.get("address").map(String::as_str),
            Some(format!("127.0.0.1:{}", port).as_str())
        );
        assert!(failure.diagnostics.contains_key("hint"));
        // Refusal is immediate, nowhere near the 5s default deadline.
        assert!(outcome.elapsed_ms < 5000);
    }

    #[tokio::test]
    async fn slow_backend_times_out_near_the_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(serve_once(listener, OK_RESPONSE, Duration::from_secs(5)));

        let outcome = client_for(port)
            .request(
                "app2",
                Method::GET,
                "/status",
                HeaderMap::new(),
                None,
                Duration::from_millis(100),
            )
            .await
            .unwrap();

        let failure = outcome.failure.expect("call should time out");
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(outcome.elapsed_ms >= 100);
        assert!(outcome.elapsed_ms < 1000);
    }

    #[tokio::test]
    async fn backend_error_carries_the_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(serve_once(listener, ERR_RESPONSE, Duration::ZERO));

        let outcome = client_for(port).call("app2", "/status").await.unwrap();

        let failure = outcome.failure.expect("call should fail");
        assert_eq!(failure.kind, FailureKind::BackendError);
        assert_eq!(failure.status, Some(500));
        assert_eq!(
            failure.diagnostics.get("status").map(String::as_str),
            Some("500")
        );
    }

    #[tokio::test]
    async fn unknown_backend_is_a_precondition_error() {
        let client = client_for(1);

        match client.call("nope", "/status").await {
            Err(ClientError::UnknownBackend(name)) => assert_eq!(name, "nope"),
            other => panic!("expected UnknownBackend, got {:?}", other.map(|o| o.backend)),
        }
    }
}
