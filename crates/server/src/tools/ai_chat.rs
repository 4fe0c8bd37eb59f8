//! ai_chat tool implementation.
//!
//! Runs one chat turn through the key-rotation proxy using the configured
//! credential sources.

use outpost_client::ai::{ChatContent, ChatMessage, ContentPart};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;

/// One message of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatTurn {
    /// "user", "assistant" or any other role (sent as user).
    pub role: String,

    /// Message text.
    #[serde(default)]
    pub text: String,

    /// Attached images as base64 `data:` URLs.
    #[serde(default)]
    pub images: Vec<String>,
}

impl From<ChatTurn> for ChatMessage {
    fn from(turn: ChatTurn) -> Self {
        if turn.images.is_empty() {
            return ChatMessage::new(turn.role, ChatContent::Text(turn.text));
        }

        let mut parts = Vec::with_capacity(turn.images.len() + 1);
        if !turn.text.is_empty() {
            parts.push(ContentPart::Text { text: turn.text });
        }
        parts.extend(turn.images.into_iter().map(|url| ContentPart::Image { url }));
        ChatMessage::new(turn.role, ChatContent::Parts(parts))
    }
}

/// Parameters for the ai_chat tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AiChatParams {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatTurn>,
}

/// Output from the ai_chat tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AiChatOutput {
    pub text: String,
}

/// Implementation of the ai_chat tool.
pub async fn chat_impl(state: &AppState, params: AiChatParams) -> Result<CallToolResult, McpError> {
    let messages: Vec<ChatMessage> = params.messages.into_iter().map(ChatMessage::from).collect();
    let text = state
        .proxy
        .chat(&state.config.credential_sources(), &messages)
        .await?;
    json_result(&AiChatOutput { text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{self, FakeNetwork};
    use outpost_core::{CredentialCandidate, CredentialStatus};

    fn turn(role: &str, text: &str) -> ChatTurn {
        ChatTurn { role: role.into(), text: text.into(), images: Vec::new() }
    }

    #[test]
    fn test_turn_with_images_becomes_parts() {
        let message = ChatMessage::from(ChatTurn {
            role: "user".into(),
            text: "what is this?".into(),
            images: vec!["data:image/png;base64,AAAA".into()],
        });
        match message.content {
            ChatContent::Parts(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected parts, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_chat_without_credentials() {
        let state = testing::state().await;
        let params = AiChatParams { messages: vec![turn("user", "hi")] };

        let err = chat_impl(&state, params).await.unwrap_err();
        assert_eq!(err.code.0, -32020);
    }

    #[tokio::test]
    async fn test_chat_rotates_to_good_key() {
        let config = outpost_core::AppConfig {
            ai_keys: vec![
                CredentialCandidate::new("bad-key", CredentialStatus::Valid),
                CredentialCandidate::new("good-key", CredentialStatus::Unchecked),
            ],
            ..testing::config()
        };
        let state = testing::state_with(config, FakeNetwork::serving(&testing::shell())).await;
        let params = AiChatParams { messages: vec![turn("user", "hi"), turn("assistant", "hello"), turn("user", "?")] };

        let result = chat_impl(&state, params).await.unwrap();
        let output: AiChatOutput = testing::output(&result);
        assert_eq!(output.text, "echo 3 turns");
    }

    #[tokio::test]
    async fn test_chat_all_keys_failing() {
        let config = outpost_core::AppConfig { ai_fallback_key: Some("bad-key".into()), ..testing::config() };
        let state = testing::state_with(config, FakeNetwork::serving(&testing::shell())).await;

        let err = chat_impl(&state, AiChatParams { messages: vec![turn("user", "hi")] }).await.unwrap_err();
        assert_eq!(err.code.0, -32021);
        assert!(err.message.contains("API key not valid"));
    }
}
