//! Push envelope handling.
//!
//! Two independent subscribers consume the same push channel; the host
//! delivers each envelope to exactly one of them depending on page focus:
//!
//! - [`BackgroundReceiver`]: no focused page, renders a system notification
//!   and resolves clicks to a window.
//! - [`ForegroundRouter`]: a focused page, renders a redacted toast and asks
//!   the sound player for a cue.

pub mod background;
pub mod classify;
pub mod foreground;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use background::{AppWindow, BackgroundReceiver, ClickOutcome, NotificationSurface, SystemNotification, WindowHost};
pub use classify::{Classification, MESSAGE_PLACEHOLDER, SoundEvent, classify, strip_ticket_id};
pub use foreground::{ForegroundRouter, SoundPlayer, Toast, ToastAction, ToastSurface};

/// Failure of a notification surface; always logged, never propagated.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifyError {
    #[error("notification display failed: {0}")]
    Display(String),

    #[error("window operation failed: {0}")]
    Window(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FcmOptions {
    #[serde(default)]
    pub link: Option<String>,
}

/// Inbound push envelope. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    #[serde(default)]
    pub notification: Option<NotificationPayload>,
    /// Provider data payload; only string values are read.
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub fcm_options: Option<FcmOptions>,
}

impl PushMessage {
    /// Structured title first, then the data payload.
    pub fn title(&self) -> Option<&str> {
        self.notification
            .as_ref()
            .and_then(|n| non_empty(n.title.as_deref()))
            .or_else(|| non_empty(self.data_str("title")))
    }

    pub fn body(&self) -> Option<&str> {
        self.notification
            .as_ref()
            .and_then(|n| non_empty(n.body.as_deref()))
            .or_else(|| non_empty(self.data_str("body")))
    }

    /// The "open" link first, then the data payload.
    pub fn link(&self) -> Option<&str> {
        self.fcm_options
            .as_ref()
            .and_then(|o| non_empty(o.link.as_deref()))
            .or_else(|| non_empty(self.data_str("link")))
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
