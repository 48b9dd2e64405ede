//! The HTTP transport abstraction and its blocking-client implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use coleta_types::RetryConfig;

use crate::error::TransportError;
use crate::multipart::MultipartForm;

/// Body of a POST request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartForm),
}

/// Async JSON-over-HTTP transport.
///
/// The three service clients (registry, directory, geolocation) all talk
/// through this trait, which is what lets tests substitute a scripted
/// transport for the whole network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` relative to the transport's base URL.
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, TransportError>;

    /// POST `body` to `path` relative to the transport's base URL.
    async fn post(&self, path: &str, body: RequestBody) -> Result<Value, TransportError>;
}

/// [`Transport`] over a blocking HTTP agent.
///
/// The agent runs on the blocking thread pool via `spawn_blocking`, so the
/// async caller is never stalled by a slow socket. GETs are retried per
/// [`RetryConfig`] when the failure is transient, POSTs go out exactly
/// once.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    agent: ureq::Agent,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Default request timeout in seconds.
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connect timeout in seconds.
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeouts(
            base_url,
            Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            agent: build_agent(timeout, connect_timeout),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn build_agent(timeout: Duration, connect_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .timeout_connect(connect_timeout)
        .build()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, TransportError> {
        let url = self.url_for(path);
        let mut attempt = 0;
        loop {
            let agent = self.agent.clone();
            let task_url = url.clone();
            let task_path = path.to_string();
            let task_query = query.to_vec();
            let result = tokio::task::spawn_blocking(move || {
                blocking_get(&agent, &task_url, &task_path, &task_query)
            })
            .await
            .map_err(|join| TransportError::Runtime(join.to_string()))?;

            match result {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.retry.retries && error.is_retryable() => {
                    let backoff = self.retry.backoff_for(attempt);
                    attempt += 1;
                    warn!(
                        %error,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "GET failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<Value, TransportError> {
        let url = self.url_for(path);
        let agent = self.agent.clone();
        let task_path = path.to_string();
        debug!(path, "posting");
        tokio::task::spawn_blocking(move || blocking_post(&agent, &url, &task_path, body))
            .await
            .map_err(|join| TransportError::Runtime(join.to_string()))?
    }
}

fn blocking_get(
    agent: &ureq::Agent,
    url: &str,
    path: &str,
    query: &[(String, String)],
) -> Result<Value, TransportError> {
    let mut request = agent.get(url);
    for (name, value) in query {
        request = request.query(name, value);
    }
    let response = request
        .call()
        .map_err(|error| TransportError::from_ureq(path, error))?;
    response
        .into_json()
        .map_err(|error| TransportError::decode(path, error))
}

fn blocking_post(
    agent: &ureq::Agent,
    url: &str,
    path: &str,
    body: RequestBody,
) -> Result<Value, TransportError> {
    let response = match body {
        RequestBody::Json(value) => agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_json(&value),
        RequestBody::Multipart(form) => agent
            .post(url)
            .set("Content-Type", &form.content_type())
            .send_bytes(&form.encode()),
    }
    .map_err(|error| TransportError::from_ureq(path, error))?;
    response
        .into_json()
        .map_err(|error| TransportError::decode(path, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_normalizes_slashes() {
        let transport = HttpTransport::new("http://localhost:3333/");
        assert_eq!(transport.url_for("/points"), "http://localhost:3333/points");
        assert_eq!(transport.url_for("points/7"), "http://localhost:3333/points/7");
    }
}
