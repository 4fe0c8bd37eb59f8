//! cache_generations tool implementation.
//!
//! Lists every cache generation with its entry count.

use outpost_core::CacheStore;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    pub entries: u64,
    /// Whether this is the generation the agent serves from.
    pub current: bool,
}

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    pub current: String,
    pub agent_state: String,
    pub pass_through: bool,
    pub generations: Vec<GenerationInfo>,
}

/// Implementation of the cache_generations tool.
pub async fn generations_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let db = state.store()?;
    let current = state.config.cache_version.clone();

    let mut generations = Vec::new();
    for name in db.generation_names().await? {
        let entries = db.generation_size(&name).await?;
        let is_current = name == current;
        generations.push(GenerationInfo { name, entries, current: is_current });
    }

    json_result(&CacheGenerationsOutput {
        agent_state: state.agent.state().await.as_str().to_string(),
        pass_through: state.agent.is_pass_through().await,
        current,
        generations,
    })
}
