//! Upstream AI call error types.

use std::sync::Arc;

use super::response::error_message;

/// Failure of a single upstream call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// Credential rejected (401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request timeout")]
    Timeout,

    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("upstream returned no text")]
    EmptyResponse,
}

impl UpstreamError {
    /// Classify a non-2xx response, preferring its structured message.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = error_message(body).unwrap_or_else(|| format!("HTTP {status}"));
        match status {
            401 | 403 => UpstreamError::Auth(message),
            429 => UpstreamError::RateLimited(message),
            _ => UpstreamError::Http { status, message },
        }
    }

    /// The request never got an answer from the upstream.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Timeout | UpstreamError::Network(_))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { UpstreamError::Timeout } else { UpstreamError::Network(Arc::new(err)) }
    }
}
