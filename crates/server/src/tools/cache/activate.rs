//! cache_activate tool implementation.
//!
//! Installs the configured generation (precaching the shell) and retires
//! every other generation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::tools::json_result;

/// Output from the cache_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheActivateOutput {
    pub generation: String,
    pub precached: usize,
    pub pass_through: bool,
    /// Generations deleted by this activation.
    pub evicted: Vec<String>,
}

/// Implementation of the cache_activate tool.
pub async fn activate_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let report = state.agent.install().await?;
    let evicted = state.agent.activate().await?;

    json_result(&CacheActivateOutput {
        generation: report.generation,
        precached: report.precached,
        pass_through: report.pass_through,
        evicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{self, FakeNetwork};
    use outpost_client::AgentState;
    use outpost_core::{CacheStore, CachedResponse, RequestKey};

    #[tokio::test]
    async fn test_activate_precaches_and_evicts() {
        let state = testing::state().await;
        let db = state.store().unwrap();
        let old = CachedResponse { status: 200, headers: Vec::new(), body: b"v0".to_vec(), stored_at: String::new() };
        db.open("outpost-v0").await.unwrap();
        db.put("outpost-v0", &RequestKey::new("GET", "https://shop.test/"), &old)
            .await
            .unwrap();

        let result = activate_impl(&state).await.unwrap();
        let output: CacheActivateOutput = testing::output(&result);

        assert_eq!(output.generation, "outpost-v1");
        assert_eq!(output.precached, 2);
        assert_eq!(output.evicted, vec!["outpost-v0".to_string()]);
        assert_eq!(db.generation_names().await.unwrap(), vec!["outpost-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_fails_when_shell_unreachable() {
        let state = testing::state_with(testing::config(), FakeNetwork::serving(&[])).await;
        let err = activate_impl(&state).await.unwrap_err();
        assert_eq!(err.code.0, -32006);
    }

    #[tokio::test]
    async fn test_failed_reactivation_keeps_agent_active() {
        let network = FakeNetwork::serving(&testing::shell());
        let state = testing::state_with(testing::config(), network.clone()).await;
        state.agent.start().await.unwrap();

        network.go_offline();
        let err = activate_impl(&state).await.unwrap_err();
        assert_eq!(err.code.0, -32006);
        assert_eq!(state.agent.state().await, AgentState::Activated);

        let generations = state.store().unwrap().generation_names().await.unwrap();
        assert_eq!(generations, vec!["outpost-v1".to_string()]);
    }
}
