//! MCP server handler implementation.
//!
//! This module defines the operations server that routes tool calls to the
//! pipeline components held in [`AppState`].
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::agent_fetch::{AgentFetchParams, fetch_impl};
use crate::tools::ai_chat::{AiChatParams, chat_impl};
use crate::tools::badge_count::{BadgeCountParams, count_impl};
use crate::tools::cache::{activate_impl, generations_impl};
use crate::tools::device_tokens::{DeviceTokensParams, tokens_impl};
use crate::tools::push_preview::{PushPreviewParams, preview_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for outpost.
#[derive(Clone)]
pub struct OutpostServer {
    tool_router: ToolRouter<Self>,
    state: Arc<AppState>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl OutpostServer {
    /// Create a new server handler around shared pipeline state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { tool_router: Self::tool_router(), state }
    }

    /// Send a request through the interception agent.
    #[tool(
        description = "Fetch a URL through the offline interception agent. Reports the strategy used and whether the response came from the network, the cache or the root-document fallback."
    )]
    async fn agent_fetch(&self, params: Parameters<AgentFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "List cache generations with their entry counts and the agent lifecycle state.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.state).await
    }

    /// Reinstall the current generation and retire the others.
    #[tool(
        description = "Install the configured cache generation (precaching the shell manifest) and delete every other generation."
    )]
    async fn cache_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    #[tool(
        description = "Preview how a push envelope would be shown: as a system notification (focused=false) or an in-app toast with sound cue (focused=true)."
    )]
    async fn push_preview(&self, params: Parameters<PushPreviewParams>) -> Result<CallToolResult, McpError> {
        preview_impl(&self.state, params.0).await
    }

    #[tool(description = "Compute the attention badge count from messages, orders, requests and the signed-in identity.")]
    async fn badge_count(&self, params: Parameters<BadgeCountParams>) -> Result<CallToolResult, McpError> {
        count_impl(params.0)
    }

    #[tool(description = "List the push delivery tokens recorded for an account.")]
    async fn device_tokens(&self, params: Parameters<DeviceTokensParams>) -> Result<CallToolResult, McpError> {
        tokens_impl(&self.state, params.0).await
    }

    /// Run a chat turn through the key-rotation proxy.
    ///
    /// Credentials are tried in priority order; the error code tells a
    /// missing key apart from exhausted keys and an unreachable upstream.
    #[tool(
        description = "Send a conversation to the generative AI upstream, rotating through configured API keys until one succeeds. Images are base64 data URLs."
    )]
    async fn ai_chat(&self, params: Parameters<AiChatParams>) -> Result<CallToolResult, McpError> {
        chat_impl(&self.state, params.0).await
    }
}

impl ServerHandler for OutpostServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "outpost".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
