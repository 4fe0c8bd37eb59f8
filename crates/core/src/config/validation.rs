//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` or `user_agent` is empty
    /// - `origin` is not an http(s) URL
    /// - `root_document` or `offline_fallback` is missing from `shell_manifest`
    /// - `timeout_ms` or `candidate_timeout_ms` is outside 100ms..=5 minutes
    /// - `self_test_timeout_ms` is outside 100ms..=1 minute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(invalid("origin", "must be an http:// or https:// URL"));
        }

        if !self.shell_manifest.contains(&self.root_document) {
            return Err(invalid("shell_manifest", "must include root_document"));
        }
        if !self.shell_manifest.contains(&self.offline_fallback) {
            return Err(invalid("shell_manifest", "must include offline_fallback"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.candidate_timeout_ms < 100 || self.candidate_timeout_ms > 300_000 {
            return Err(invalid("candidate_timeout_ms", "must be between 100ms and 300000ms"));
        }

        if self.self_test_timeout_ms < 100 || self.self_test_timeout_ms > 60_000 {
            return Err(invalid("self_test_timeout_ms", "must be between 100ms and 60000ms"));
        }

        if self.push_public_key.is_none() {
            tracing::warn!("push_public_key is not set; push delivery tokens will not be requested");
        }

        if self.credential_sources().resolve().is_empty() {
            tracing::warn!("no AI credential configured; chat requests will fail with NO_CREDENTIAL");
        }

        Ok(())
    }
}
