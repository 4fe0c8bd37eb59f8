//! push_preview tool implementation.
//!
//! Shows what a push envelope would turn into on either surface without
//! displaying anything: a system notification when no page has focus, an
//! in-app toast with its sound cue otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use outpost_client::PushMessage;
use outpost_client::push::{
    AppWindow, BackgroundReceiver, ForegroundRouter, NotificationSurface, NotifyError, SoundEvent, SoundPlayer,
    SystemNotification, Toast, ToastSurface, WindowHost,
};
use outpost_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::json_result;
use crate::state::AppState;

/// Parameters for the push_preview tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushPreviewParams {
    /// Push envelope: `notification`, `data` and `fcmOptions` as delivered.
    pub envelope: serde_json::Value,

    /// Route as if an application page had focus.
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "surface", rename_all = "lowercase")]
pub enum PushPreviewOutput {
    System { notification: SystemNotification },
    Toast { toast: Toast },
}

/// Host surface that accepts everything and shows nothing.
struct Dry;

#[async_trait]
impl NotificationSurface for Dry {
    async fn show(&self, _notification: &SystemNotification) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn close(&self, _id: u64) {}
}

#[async_trait]
impl WindowHost for Dry {
    async fn windows(&self) -> Result<Vec<AppWindow>, NotifyError> {
        Ok(Vec::new())
    }

    async fn focus(&self, _id: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn open(&self, _url: &Url) -> Result<(), NotifyError> {
        Ok(())
    }
}

impl ToastSurface for Dry {
    fn show(&self, _toast: &Toast) -> Result<(), NotifyError> {
        Ok(())
    }
}

impl SoundPlayer for Dry {
    fn play(&self, _event: SoundEvent) {}
}

/// Implementation of the push_preview tool.
pub async fn preview_impl(state: &AppState, params: PushPreviewParams) -> Result<CallToolResult, McpError> {
    let message: PushMessage = serde_json::from_value(params.envelope)
        .map_err(|e| Error::InvalidInput(format!("malformed push envelope: {e}")))?;
    let dry = Arc::new(Dry);

    let output = if params.focused {
        let router = ForegroundRouter::new(
            state.config.default_notification_title.clone(),
            state.config.chat_link.clone(),
            dry.clone(),
            dry,
        );
        PushPreviewOutput::Toast { toast: router.compose(&message) }
    } else {
        let receiver = BackgroundReceiver::new(
            state.origin.clone(),
            state.config.default_notification_title.clone(),
            dry.clone(),
            dry,
        );
        PushPreviewOutput::System { notification: receiver.compose(&message) }
    };

    tracing::debug!(focused = params.focused, "push envelope previewed");
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;
    use serde_json::{Value, json};

    async fn preview(envelope: Value, focused: bool) -> Value {
        let state = testing::state().await;
        let result = preview_impl(&state, PushPreviewParams { envelope, focused }).await.unwrap();
        testing::output(&result)
    }

    #[tokio::test]
    async fn test_background_uses_defaults() {
        let output = preview(json!({ "data": { "body": "Order shipped" } }), false).await;

        assert_eq!(output["surface"], "system");
        assert_eq!(output["notification"]["title"], "New notification");
        assert_eq!(output["notification"]["body"], "Order shipped");
        assert_eq!(output["notification"]["link"], Value::Null);
    }

    #[tokio::test]
    async fn test_foreground_redacts_chat() {
        let envelope = json!({
            "notification": { "title": "New message from Dana", "body": "Dana: see you at 5" },
            "data": { "link": "/chat/42" }
        });
        let output = preview(envelope, true).await;

        assert_eq!(output["surface"], "toast");
        assert_eq!(output["toast"]["body"], "You have a new message");
        assert_eq!(output["toast"]["redacted"], true);
        assert_eq!(output["toast"]["action"]["link"], "/chat/42");
        assert_eq!(output["toast"]["sound"], "newMessage");
    }

    #[tokio::test]
    async fn test_numeric_data_values_are_accepted() {
        let envelope = json!({ "notification": { "title": "Order shipped" }, "data": { "orderId": 7, "link": "/orders/7" } });
        let output = preview(envelope, false).await;

        assert_eq!(output["surface"], "system");
        assert_eq!(output["notification"]["title"], "Order shipped");
        assert!(output["notification"]["link"].as_str().unwrap().ends_with("/orders/7"));
    }

    #[tokio::test]
    async fn test_malformed_envelope() {
        let state = testing::state().await;
        let params = PushPreviewParams { envelope: json!({ "data": "not a map" }), focused: false };
        let err = preview_impl(&state, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
