//! Ordered-fallback request dispatch.
//!
//! A read is attempted with each [`Strategy`] of the current mode in turn.
//! The first attempt that yields any HTTP response wins; transport failures
//! and timeouts move on to the next strategy.  Mutations are never repeated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use strum::Display;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RuntimeMode;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    /// Same-origin development proxy.
    Proxy,
    /// Only `Accept: */*`, which a browser sends without a CORS preflight.
    SimpleHeaders,
    /// Explicit JSON accept header.
    FullHeaders,
}

const PROXY_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json"),
    ("content-type", "application/json"),
];
const SIMPLE_HEADERS: &[(&str, &str)] = &[("accept", "*/*")];
const FULL_HEADERS: &[(&str, &str)] = &[("accept", "application/json")];

impl Strategy {
    pub fn headers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Strategy::Proxy => PROXY_HEADERS,
            Strategy::SimpleHeaders => SIMPLE_HEADERS,
            Strategy::FullHeaders => FULL_HEADERS,
        }
    }

    /// Strategies tried, in order, for reads in `mode`.
    pub fn for_mode(mode: RuntimeMode) -> &'static [Strategy] {
        match mode {
            RuntimeMode::Development => &[Strategy::Proxy],
            RuntimeMode::Production => &[Strategy::SimpleHeaders, Strategy::FullHeaders],
        }
    }

    /// The single strategy used for mutations in `mode`.
    pub fn for_mutation(mode: RuntimeMode) -> Strategy {
        match mode {
            RuntimeMode::Development => Strategy::Proxy,
            RuntimeMode::Production => Strategy::FullHeaders,
        }
    }
}

/// One request as handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub strategy: Strategy,
    pub body: Option<serde_json::Value>,
}

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }
}

/// Performs a single attempt.  Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("inventario-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.strategy.headers() {
            builder = builder.header(*name, *value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        Ok(ApiResponse { status, body })
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    mode: RuntimeMode,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, mode: RuntimeMode) -> Self {
        Self { transport, mode }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// GET `url`, falling back through the mode's strategies.
    pub async fn fetch(&self, url: Url, timeout: Duration) -> Result<ApiResponse, ClientError> {
        let strategies = Strategy::for_mode(self.mode);
        let mut last_err = None;

        for (attempt, strategy) in strategies.iter().copied().enumerate() {
            let request = ApiRequest {
                method: Method::GET,
                url: url.clone(),
                strategy,
                body: None,
            };
            let started = Instant::now();
            match self.attempt(request, timeout).await {
                Ok(resp) => {
                    info!(
                        url = %url,
                        %strategy,
                        attempt = attempt + 1,
                        status = resp.status.as_u16(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "request completed"
                    );
                    return Ok(resp);
                }
                Err(e) if e.is_transport() => {
                    warn!(url = %url, %strategy, attempt = attempt + 1, error = %e, "request strategy failed");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        let last = last_err
            .unwrap_or_else(|| ClientError::Validation("no request strategy available".into()));
        Err(ClientError::Exhausted {
            attempts: strategies.len(),
            last: Box::new(last),
        })
    }

    /// Single attempt for a request that must not be repeated.
    pub async fn send_once(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<ApiResponse, ClientError> {
        let strategy = Strategy::for_mutation(self.mode);
        debug!(%method, url = %url, %strategy, "sending mutation");
        let request = ApiRequest { method, url, strategy, body };
        self.attempt(request, timeout).await
    }

    async fn attempt(&self, request: ApiRequest, timeout: Duration) -> Result<ApiResponse, ClientError> {
        let url = request.url.to_string();
        match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                url,
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    /// Replays scripted outcomes and records the strategies it was called with.
    struct ScriptedTransport {
        outcomes: Mutex<Vec<Outcome>>,
        seen: Mutex<Vec<Strategy>>,
    }

    enum Outcome {
        Status(u16),
        Timeout,
        Hang,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Outcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<Strategy> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
            self.seen.lock().unwrap().push(request.strategy);
            let next = self.outcomes.lock().unwrap().pop();
            match next {
                Some(Outcome::Status(code)) => Ok(ApiResponse::new(
                    StatusCode::from_u16(code).unwrap(),
                    "[]",
                )),
                Some(Outcome::Timeout) | None => Err(ClientError::Timeout {
                    url: request.url.to_string(),
                    timeout_ms: 0,
                }),
                Some(Outcome::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ApiResponse::new(StatusCode::OK, "[]"))
                }
            }
        }
    }

    fn url() -> Url {
        Url::parse("https://backend.test/inventario/").unwrap()
    }

    #[tokio::test]
    async fn test_first_success_skips_fallback() {
        let t = ScriptedTransport::new(vec![Outcome::Status(200)]);
        let d = Dispatcher::new(t.clone(), RuntimeMode::Production);
        let resp = d.fetch(url(), Duration::from_secs(1)).await.unwrap();
        assert!(resp.is_success());
        assert_eq!(t.seen(), vec![Strategy::SimpleHeaders]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_primary_failure_makes_exactly_one_fallback() {
        let t = ScriptedTransport::new(vec![Outcome::Timeout, Outcome::Status(200)]);
        let d = Dispatcher::new(t.clone(), RuntimeMode::Production);
        d.fetch(url(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(t.seen(), vec![Strategy::SimpleHeaders, Strategy::FullHeaders]);
        assert!(logs_contain("request strategy failed"));
    }

    #[tokio::test]
    async fn test_all_strategies_failing_is_exhausted() {
        let t = ScriptedTransport::new(vec![Outcome::Timeout, Outcome::Timeout]);
        let d = Dispatcher::new(t.clone(), RuntimeMode::Production);
        let err = d.fetch(url(), Duration::from_secs(1)).await.unwrap_err();
        match err {
            ClientError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, ClientError::Timeout { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(t.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_status_ends_dispatch() {
        let t = ScriptedTransport::new(vec![Outcome::Status(500), Outcome::Status(200)]);
        let d = Dispatcher::new(t.clone(), RuntimeMode::Production);
        let resp = d.fetch(url(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.seen().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_attempt_times_out() {
        let t = ScriptedTransport::new(vec![Outcome::Hang, Outcome::Hang]);
        let d = Dispatcher::new(t.clone(), RuntimeMode::Development);
        let err = d.fetch(url(), Duration::from_millis(250)).await.unwrap_err();
        let ClientError::Exhausted { attempts, last } = err else {
            panic!("expected exhausted");
        };
        assert_eq!(attempts, 1);
        assert!(matches!(*last, ClientError::Timeout { timeout_ms: 250, .. }));
        assert_eq!(t.seen(), vec![Strategy::Proxy]);
    }

    #[tokio::test]
    async fn test_mutation_is_attempted_once() {
        let t = ScriptedTransport::new(vec![Outcome::Timeout, Outcome::Status(200)]);
        let d = Dispatcher::new(t.clone(), RuntimeMode::Production);
        let err = d
            .send_once(Method::DELETE, url(), None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout { .. }));
        assert_eq!(t.seen(), vec![Strategy::FullHeaders]);
    }
}
