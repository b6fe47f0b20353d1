//! Connectivity guard: liveness probing and resilient request delivery.
//!
//! Every outbound call is wrapped with a per-attempt timeout and retried
//! with exponential backoff. Failures are classified at the boundary:
//! transport and timeout errors and 5xx responses are retryable, a definite
//! 4xx is returned immediately rather than burning attempts on a
//! deterministic rejection.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Tri-state reachability for UI consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Checking,
}

/// Retry/backoff knobs. Defaults match the production contract; tests use
/// shorter delays.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts in total, including the first
    pub max_attempts: u32,
    /// Backoff before retry n is `base_delay * 2^(n-1)`
    pub base_delay: Duration,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
    /// Deadline for the liveness probe
    pub probe_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based): 1s, 2s, 4s, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Error payload shape shared by all API error responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<String>,
    pub message: Option<String>,
    pub errors: Option<BTreeMap<String, String>>,
}

/// Classified outcome of a failed call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network connection failed: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("server responded with status {status}")]
    Server {
        status: u16,
        detail: Option<String>,
        message: Option<String>,
        errors: Option<BTreeMap<String, String>>,
    },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Unexpected(String),
}

impl ClientError {
    fn from_status(status: u16, body: ErrorBody) -> Self {
        ClientError::Server {
            status,
            detail: body.detail,
            message: body.message,
            errors: body.errors,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Timeout => true,
            ClientError::Server { status, .. } => *status >= 500,
            ClientError::NotAuthenticated | ClientError::Unexpected(_) => false,
        }
    }

    /// True when the server rejected the presented token or no token was
    /// presented; the session cache must be cleared on this outcome.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Server { status: 401, .. })
    }

    /// Field-keyed validation errors, when the server returned any.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ClientError::Server { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }

    /// Actionable message for a UI banner or form error.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Network connection failed: unable to reach the server. Check your connection."
                    .to_string()
            }
            ClientError::Timeout => {
                "Request timeout: the server took too long to respond. Please try again."
                    .to_string()
            }
            ClientError::Server {
                status,
                detail,
                message,
                ..
            } => message
                .clone()
                .or_else(|| detail.clone())
                .unwrap_or_else(|| format!("Server error ({status})")),
            ClientError::NotAuthenticated => "Please log in to continue.".to_string(),
            ClientError::Unexpected(msg) => msg.clone(),
        }
    }
}

/// One attempt: per-attempt deadline, then status classification.
async fn send_once(policy: &RetryPolicy, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
    let outcome = tokio::time::timeout(policy.attempt_timeout, request.send()).await;
    match outcome {
        Err(_) => Err(ClientError::Timeout),
        Ok(Err(e)) if e.is_timeout() => Err(ClientError::Timeout),
        Ok(Err(e)) => Err(ClientError::Network(e.to_string())),
        Ok(Ok(response)) => {
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            Err(ClientError::from_status(status.as_u16(), body))
        }
    }
}

/// Deliver a request through the retry loop. The last classified error is
/// surfaced after the attempt cap; earlier failures are only logged.
pub async fn execute_with_retry(
    policy: &RetryPolicy,
    request: RequestBuilder,
) -> Result<reqwest::Response, ClientError> {
    let mut attempt = 1;
    loop {
        let this_attempt = request
            .try_clone()
            .ok_or_else(|| ClientError::Unexpected("request body is not retryable".to_string()))?;

        match send_once(policy, this_attempt).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                if !err.is_retryable() || attempt >= policy.max_attempts {
                    return Err(err);
                }
                let delay = policy.backoff_delay(attempt);
                tracing::warn!(
                    "attempt {attempt}/{} failed ({err}), retrying in {delay:?}",
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Lightweight reachability check against the server's liveness endpoint.
/// No retries, no side effects.
pub async fn probe(http: &reqwest::Client, base_url: &str, policy: &RetryPolicy) -> bool {
    let url = format!("{base_url}/ping");
    match tokio::time::timeout(policy.probe_timeout, http.get(&url).send()).await {
        Ok(Ok(response)) => response.status().is_success(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_millis(500),
        }
    }

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn retry_eligibility_by_classification() {
        assert!(ClientError::Network("refused".into()).is_retryable());
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::from_status(500, ErrorBody::default()).is_retryable());
        assert!(ClientError::from_status(503, ErrorBody::default()).is_retryable());
        assert!(!ClientError::from_status(400, ErrorBody::default()).is_retryable());
        assert!(!ClientError::from_status(401, ErrorBody::default()).is_retryable());
        assert!(!ClientError::from_status(404, ErrorBody::default()).is_retryable());
    }

    #[tokio::test]
    async fn server_errors_are_retried_to_success() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/flaky",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
                    } else {
                        "ok".into_response()
                    }
                }
            }),
        );
        let base = spawn_server(app).await;

        let http = reqwest::Client::new();
        let response = execute_with_retry(&fast_policy(), http.get(format!("{base}/flaky")))
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/rejected",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::BAD_REQUEST,
                        axum::Json(serde_json::json!({ "detail": "Validation failed" })),
                    )
                }
            }),
        );
        let base = spawn_server(app).await;

        let http = reqwest::Client::new();
        let err = execute_with_retry(&fast_policy(), http.get(format!("{base}/rejected")))
            .await
            .unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        match err {
            ClientError::Server { status, detail, .. } => {
                assert_eq!(status, 400);
                assert_eq!(detail.as_deref(), Some("Validation failed"));
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_classifies_as_network_error() {
        let http = reqwest::Client::new();
        // Port from the reserved loopback range with nothing listening.
        let err = execute_with_retry(
            &RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(5),
                ..fast_policy()
            },
            http.get("http://127.0.0.1:9/ping"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn probe_reports_reachability() {
        let app = Router::new().route("/ping", get(|| async { "pong" }));
        let base = spawn_server(app).await;
        let http = reqwest::Client::new();

        assert!(probe(&http, &base, &fast_policy()).await);
        assert!(!probe(&http, "http://127.0.0.1:9", &fast_policy()).await);
    }
}
