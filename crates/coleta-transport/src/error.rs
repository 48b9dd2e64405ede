//! Transport-level errors.

use thiserror::Error;

/// What went wrong while talking to an HTTP service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response: DNS, connect, TLS or timeout.
    #[error("request to `{path}` failed: {detail}")]
    Request { path: String, detail: String },

    /// The service answered with a non-success status.
    #[error("`{path}` returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("failed to decode response from `{path}`: {detail}")]
    Decode { path: String, detail: String },

    /// The blocking request task was cancelled or panicked.
    #[error("background request task failed: {0}")]
    Runtime(String),
}

impl TransportError {
    pub(crate) fn from_ureq(path: &str, error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                Self::Status {
                    path: path.to_string(),
                    status,
                    body: truncated(&body),
                }
            }
            ureq::Error::Transport(transport) => Self::Request {
                path: path.to_string(),
                detail: transport.to_string(),
            },
        }
    }

    pub(crate) fn decode(path: &str, detail: impl std::fmt::Display) -> Self {
        Self::Decode {
            path: path.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Whether retrying the same request can plausibly succeed.
    ///
    /// Connection-level failures and 5xx answers are transient, 4xx answers
    /// and decode failures will just repeat.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode { .. } | Self::Runtime(_) => false,
        }
    }
}

// Error bodies can be whole HTML pages, keep the useful prefix.
fn truncated(body: &str) -> String {
    const LIMIT: usize = 300;
    if body.len() <= LIMIT {
        return body.to_string();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
