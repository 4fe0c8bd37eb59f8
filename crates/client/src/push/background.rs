//! Background push receiver.
//!
//! Runs when no application page has focus. Builds a system notification from
//! the envelope and, on click, routes the user to an existing window for the
//! target link or opens a new one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use super::{NotifyError, PushMessage};
use crate::fetch::resolve;

/// A system-level notification as handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemNotification {
    pub id: u64,
    pub title: String,
    pub body: String,
    /// Target link carried as metadata for click handling.
    pub link: Option<String>,
}

/// An open application window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppWindow {
    pub id: String,
    pub url: Url,
}

#[async_trait]
pub trait NotificationSurface: Send + Sync {
    async fn show(&self, notification: &SystemNotification) -> Result<(), NotifyError>;

    async fn close(&self, id: u64);
}

#[async_trait]
pub trait WindowHost: Send + Sync {
    async fn windows(&self) -> Result<Vec<AppWindow>, NotifyError>;

    async fn focus(&self, id: &str) -> Result<(), NotifyError>;

    async fn open(&self, url: &Url) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Focused(String),
    Opened(Url),
    Failed,
}

pub struct BackgroundReceiver {
    origin: Url,
    default_title: String,
    surface: Arc<dyn NotificationSurface>,
    windows: Arc<dyn WindowHost>,
    next_id: AtomicU64,
}

impl BackgroundReceiver {
    pub fn new(
        origin: Url, default_title: impl Into<String>, surface: Arc<dyn NotificationSurface>, windows: Arc<dyn WindowHost>,
    ) -> Self {
        Self { origin, default_title: default_title.into(), surface, windows, next_id: AtomicU64::new(1) }
    }

    /// Build the notification an envelope would produce, without showing it.
    pub fn compose(&self, message: &PushMessage) -> SystemNotification {
        SystemNotification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            title: message.title().unwrap_or(self.default_title.as_str()).to_string(),
            body: message.body().unwrap_or_default().to_string(),
            link: message.link().map(str::to_string),
        }
    }

    /// Show a system notification for `message`.
    ///
    /// Returns `None` when the host refused to display it; the failure is
    /// logged and not propagated.
    pub async fn on_push(&self, message: &PushMessage) -> Option<SystemNotification> {
        let notification = self.compose(message);
        match self.surface.show(&notification).await {
            Ok(()) => {
                tracing::debug!(id = notification.id, link = ?notification.link, "notification shown");
                Some(notification)
            }
            Err(e) => {
                tracing::warn!(id = notification.id, error = %e, "failed to show notification");
                None
            }
        }
    }

    /// Close the notification, then focus a window already at the target or
    /// open a new one there.
    pub async fn on_click(&self, notification: &SystemNotification) -> ClickOutcome {
        self.surface.close(notification.id).await;

        let target = match resolve(&self.origin, notification.link.as_deref().unwrap_or_default()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(link = ?notification.link, error = %e, "unusable notification link");
                return ClickOutcome::Failed;
            }
        };

        let windows = self.windows.windows().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "window enumeration failed");
            Vec::new()
        });

        if let Some(window) = windows.iter().find(|w| same_location(&w.url, &target)) {
            return match self.windows.focus(&window.id).await {
                Ok(()) => ClickOutcome::Focused(window.id.clone()),
                Err(e) => {
                    tracing::warn!(window = %window.id, error = %e, "failed to focus window");
                    ClickOutcome::Failed
                }
            };
        }

        match self.windows.open(&target).await {
            Ok(()) => ClickOutcome::Opened(target),
            Err(e) => {
                tracing::warn!(url = %target, error = %e, "failed to open window");
                ClickOutcome::Failed
            }
        }
    }
}

fn same_location(current: &Url, target: &Url) -> bool {
    let mut current = current.clone();
    current.set_fragment(None);
    current == *target
}
