//! device_tokens tool implementation.

use outpost_core::{Error, TokenStore};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;

/// Parameters for the device_tokens tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeviceTokensParams {
    /// Account identifier the tokens were recorded under.
    pub uid: String,
}

/// Output from the device_tokens tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeviceTokensOutput {
    pub uid: String,
    pub tokens: Vec<String>,
}

/// Implementation of the device_tokens tool.
pub async fn tokens_impl(state: &AppState, params: DeviceTokensParams) -> Result<CallToolResult, McpError> {
    let uid = params.uid.trim();
    if uid.is_empty() {
        return Err(Error::InvalidInput("uid must not be empty".into()).into());
    }

    let tokens = state.store()?.tokens(uid).await?;
    json_result(&DeviceTokensOutput { uid: uid.to_string(), tokens })
}
