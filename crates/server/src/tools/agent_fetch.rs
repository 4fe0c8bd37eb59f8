//! agent_fetch tool implementation.
//!
//! Sends one request through the interception agent and reports which
//! strategy answered it and where the response came from.

use outpost_client::Request;
use outpost_client::fetch::resolve;
use outpost_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;

const PREVIEW_CHARS: usize = 500;

/// Parameters for the agent_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentFetchParams {
    /// Absolute URL or a path resolved against the application origin.
    pub url: String,

    /// Treat the request as a full-page navigation.
    #[serde(default)]
    pub navigate: bool,
}

/// Output from the agent_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentFetchOutput {
    pub url: String,
    pub status: u16,
    /// "network", "cache" or "root-fallback".
    pub source: String,
    pub strategy: String,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    pub body_preview: String,
}

/// Implementation of the agent_fetch tool.
pub async fn fetch_impl(state: &AppState, params: AgentFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&state.origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let request = if params.navigate { Request::navigate(url) } else { Request::get(url) };

    let handled = state.agent.handle(&request).await?;
    let response = &handled.response;
    let preview: String = String::from_utf8_lossy(&response.body).chars().take(PREVIEW_CHARS).collect();

    json_result(&AgentFetchOutput {
        url: request.url.to_string(),
        status: response.status,
        source: handled.source.as_str().to_string(),
        strategy: handled.strategy.as_str().to_string(),
        content_type: response.header("content-type").map(str::to_string),
        body_bytes: response.body.len(),
        body_preview: preview,
    })
}
