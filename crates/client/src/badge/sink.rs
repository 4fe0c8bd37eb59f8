//! Surfaces the badge count is projected onto.

use std::sync::Arc;

use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BadgeError {
    /// The base icon could not be loaded; the overlay is skipped.
    #[error("base icon unavailable: {0}")]
    IconUnavailable(String),

    #[error("badge render failed: {0}")]
    Render(String),

    #[error("platform badge call failed: {0}")]
    Platform(String),
}

#[async_trait]
pub trait BadgeSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn project(&self, count: u32) -> Result<(), BadgeError>;
}

/// Host badge API. Optional on most platforms.
pub trait BadgeApi: Send + Sync {
    fn set_badge(&self, count: u32) -> Result<(), BadgeError>;

    fn clear_badge(&self) -> Result<(), BadgeError>;
}

/// Sets the count when positive, clears it explicitly at zero.
pub struct PlatformBadge {
    api: Option<Arc<dyn BadgeApi>>,
}

impl PlatformBadge {
    pub fn new(api: Option<Arc<dyn BadgeApi>>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BadgeSink for PlatformBadge {
    fn name(&self) -> &'static str {
        "platform"
    }

    async fn project(&self, count: u32) -> Result<(), BadgeError> {
        let Some(api) = self.api.as_ref() else {
            return Ok(());
        };
        if count > 0 { api.set_badge(count) } else { api.clear_badge() }
    }
}
