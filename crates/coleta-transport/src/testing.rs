//! Test doubles for the transport layer.
//!
//! Provides a scripted [`MockTransport`] so flows can be exercised without
//! a network. Responses are registered per method and path and consumed in
//! order; every request is recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::TransportError;
use crate::http::{RequestBody, Transport};

/// A request the mock has served, in arrival order.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Multipart bodies are kept as their encoded bytes plus the
    /// `Content-Type` header value.
    pub body: Option<RecordedBody>,
}

#[derive(Debug, Clone)]
pub enum RecordedBody {
    Json(Value),
    Multipart { content_type: String, bytes: Vec<u8> },
}

impl RecordedRequest {
    /// The value of a query parameter, if the request carried it.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Scripted [`Transport`] for tests.
///
/// # Example
///
/// ```
/// use coleta_transport::testing::MockTransport;
/// use serde_json::json;
///
/// let mock = MockTransport::new();
/// mock.on_get("items", json!([{"id": 1, "title": "Lâmpadas"}]));
/// ```
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(&'static str, String), VecDeque<Result<Value, TransportError>>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful GET response for `path`.
    pub fn on_get(&self, path: &str, response: Value) {
        self.push("GET", path, Ok(response));
    }

    /// Queue a failing GET response for `path`.
    pub fn on_get_error(&self, path: &str, error: TransportError) {
        self.push("GET", path, Err(error));
    }

    /// Queue a successful POST response for `path`.
    pub fn on_post(&self, path: &str, response: Value) {
        self.push("POST", path, Ok(response));
    }

    /// Queue a failing POST response for `path`.
    pub fn on_post_error(&self, path: &str, error: TransportError) {
        self.push("POST", path, Err(error));
    }

    /// Every request served so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// How many requests hit `path` with the given method.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    fn push(&self, method: &'static str, path: &str, response: Result<Value, TransportError>) {
        self.responses
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    fn pop(&self, method: &'static str, path: &str) -> Result<Value, TransportError> {
        let mut responses = self.responses.lock();
        let queue = responses
            .get_mut(&(method, path.to_string()))
            .unwrap_or_else(|| panic!("no scripted response for {method} {path}"));
        queue
            .pop_front()
            .unwrap_or_else(|| panic!("scripted responses for {method} {path} exhausted"))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, TransportError> {
        self.requests.lock().push(RecordedRequest {
            method: "GET",
            path: path.to_string(),
            query: query.to_vec(),
            body: None,
        });
        self.pop("GET", path)
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<Value, TransportError> {
        let recorded = match body {
            RequestBody::Json(value) => RecordedBody::Json(value),
            RequestBody::Multipart(form) => RecordedBody::Multipart {
                content_type: form.content_type(),
                bytes: form.encode(),
            },
        };
        self.requests.lock().push(RecordedRequest {
            method: "POST",
            path: path.to_string(),
            query: Vec::new(),
            body: Some(recorded),
        });
        self.pop("POST", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_responses_are_served_in_registration_order() {
        let mock = MockTransport::new();
        mock.on_get("items", json!([1]));
        mock.on_get("items", json!([2]));

        assert_eq!(mock.get("items", &[]).await.unwrap(), json!([1]));
        assert_eq!(mock.get("items", &[]).await.unwrap(), json!([2]));
        assert_eq!(mock.count("GET", "items"), 2);
    }

    #[tokio::test]
    async fn test_recorded_requests_keep_query_parameters() {
        let mock = MockTransport::new();
        mock.on_get("points", json!([]));

        let query = vec![("uf".to_string(), "SP".to_string())];
        mock.get("points", &query).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query_value("uf"), Some("SP"));
        assert_eq!(requests[0].query_value("city"), None);
    }

    #[tokio::test]
    async fn test_scripted_errors_are_returned() {
        let mock = MockTransport::new();
        mock.on_get_error(
            "items",
            TransportError::Status {
                path: "items".into(),
                status: 500,
                body: String::new(),
            },
        );
        let err = mock.get("items", &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500, .. }));
    }
}
