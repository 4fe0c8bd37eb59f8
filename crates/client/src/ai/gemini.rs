//! Generative Language API client.
//!
//! - **Endpoint**: `POST {base}/models/{model}:generateContent`
//! - **Authentication**: `x-goog-api-key` header, one credential per call.
//! - **Result**: text at `candidates[0].content.parts[0].text`.

use std::time::Duration;

use async_trait::async_trait;
use outpost_core::AppConfig;
use reqwest::header;

use super::error::UpstreamError;
use super::request::GenerateRequest;
use super::response::GenerateResponse;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_USER_AGENT: &str = "outpost/0.1";

/// A text-generation backend addressed with a caller-supplied credential.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn generate(&self, secret: &str, request: &GenerateRequest) -> Result<String, UpstreamError>;

    /// Reachability check that needs no credential. Any HTTP answer counts.
    async fn probe(&self) -> Result<(), UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    /// Transport-level timeout, applied to every call.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            base_url: config.ai_base_url.clone(),
            model: config.ai_model.clone(),
            timeout: config.candidate_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl Upstream for GeminiClient {
    async fn generate(&self, secret: &str, request: &GenerateRequest) -> Result<String, UpstreamError> {
        let url = self.config.generate_url();
        tracing::debug!(model = %self.config.model, turns = request.contents.len(), "calling upstream");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", secret)
            .header(header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(UpstreamError::from_status(status.as_u16(), &bytes));
        }

        let parsed: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Parse(e.to_string()))?;
        parsed.into_text().ok_or(UpstreamError::EmptyResponse)
    }

    async fn probe(&self) -> Result<(), UpstreamError> {
        let response = self.http.get(&self.config.base_url).send().await?;
        tracing::debug!(status = %response.status(), "upstream reachable");
        Ok(())
    }
}
