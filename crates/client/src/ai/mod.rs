//! AI key-rotation proxy.
//!
//! Holds an ordered list of upstream credentials and exposes one logical chat
//! call. Candidates are tried in order until one succeeds:
//!
//! - candidates marked `invalid` are skipped without a call
//! - every attempt is bounded by the per-candidate timeout; a timeout counts
//!   as that candidate failing
//! - when every attempt failed at the transport level, a bounded connectivity
//!   probe decides between "all keys failed" and "network unreachable"
//!
//! Secrets are never logged; attempts are identified by their position.

pub mod error;
pub mod gemini;
pub mod request;
pub mod response;

use std::sync::Arc;
use std::time::Duration;

use outpost_core::{AppConfig, CredentialSources, Error};

pub use error::UpstreamError;
pub use gemini::{GeminiClient, GeminiConfig, Upstream};
pub use request::{ChatContent, ChatMessage, ContentPart, GenerateRequest};

const ALL_MARKED_INVALID: &str = "every configured credential is marked invalid";

pub struct KeyRotationProxy {
    upstream: Arc<dyn Upstream>,
    candidate_timeout: Duration,
    self_test_timeout: Duration,
}

impl KeyRotationProxy {
    pub fn new(upstream: Arc<dyn Upstream>, candidate_timeout: Duration, self_test_timeout: Duration) -> Self {
        Self { upstream, candidate_timeout, self_test_timeout }
    }

    pub fn from_app(config: &AppConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self::new(upstream, config.candidate_timeout(), config.self_test_timeout())
    }

    /// Run one chat turn against the first working credential.
    pub async fn chat(&self, sources: &CredentialSources, messages: &[ChatMessage]) -> Result<String, Error> {
        let candidates = sources.resolve();
        if candidates.is_empty() {
            tracing::warn!("chat requested but no AI credential is configured");
            return Err(Error::NoCredential);
        }

        let request = GenerateRequest::from_messages(messages)?;

        let mut attempted = 0;
        let mut last: Option<UpstreamError> = None;
        let mut all_transport = true;

        for (index, candidate) in candidates.iter().enumerate() {
            if candidate.is_skippable() {
                tracing::debug!(index, "skipping credential marked invalid");
                continue;
            }
            attempted += 1;

            let outcome = tokio::time::timeout(self.candidate_timeout, self.upstream.generate(&candidate.secret, &request))
                .await
                .unwrap_or(Err(UpstreamError::Timeout));

            match outcome {
                Ok(text) => {
                    tracing::info!(index, attempted, "upstream call succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "credential failed, trying next");
                    all_transport &= e.is_transport();
                    last = Some(e);
                }
            }
        }

        let Some(last) = last else {
            return Err(Error::CredentialsExhausted { attempted: 0, last: ALL_MARKED_INVALID.to_string() });
        };

        if all_transport && !self.self_test().await {
            return Err(Error::Unreachable(format!("upstream unreachable after {attempted} attempts: {last}")));
        }

        Err(Error::CredentialsExhausted { attempted, last: last.to_string() })
    }

    /// Best-effort reachability check, abandoned after the self-test timeout.
    async fn self_test(&self) -> bool {
        match tokio::time::timeout(self.self_test_timeout, self.upstream.probe()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "connectivity self-test failed");
                false
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.self_test_timeout.as_millis() as u64, "connectivity self-test timed out");
                false
            }
        }
    }
}
