//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OUTPOST_*)
//! 2. TOML config file (if OUTPOST_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::credentials::{AiConfigDocument, CredentialCandidate, CredentialSources, SettingsDocument};

mod validation;

pub use validation::ConfigError;

/// Process-level fallback credential read when nothing else is configured.
const FALLBACK_KEY_ENV: &str = "GEMINI_API_KEY";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OUTPOST_*)
/// 2. TOML config file (if OUTPOST_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store holding cache generations and device tokens.
    ///
    /// Set via OUTPOST_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Name of the current cache generation. Changing it retires every
    /// previous generation on the next activation.
    ///
    /// Set via OUTPOST_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the application is served from; relative paths resolve against it.
    ///
    /// Set via OUTPOST_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Root document served when an offline navigation has no exact match.
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// Designated offline fallback page.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,

    /// Shell assets fetched eagerly on install.
    ///
    /// Set via OUTPOST_SHELL_MANIFEST environment variable (TOML array syntax).
    #[serde(default = "default_shell_manifest")]
    pub shell_manifest: Vec<String>,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds for intercepted requests.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Public key used to scope push delivery tokens.
    ///
    /// Set via OUTPOST_PUSH_PUBLIC_KEY environment variable.
    /// Without it the push token flow stays disabled.
    #[serde(default)]
    pub push_public_key: Option<String>,

    /// Title used when a push envelope carries none.
    #[serde(default = "default_notification_title")]
    pub default_notification_title: String,

    /// Destination for chat-like notifications that carry no link.
    #[serde(default = "default_chat_link")]
    pub chat_link: String,

    /// Base icon drawn under the unread badge overlay.
    #[serde(default)]
    pub badge_icon_path: Option<PathBuf>,

    /// Base URL of the generative AI endpoint.
    #[serde(default = "default_ai_base_url")]
    pub ai_base_url: String,

    /// Model addressed on the generative AI endpoint.
    #[serde(default = "default_ai_model")]
    pub ai_model: String,

    /// Key from the dedicated AI-configuration document.
    #[serde(default)]
    pub ai_config_key: Option<String>,

    /// Ordered candidates from the general settings document.
    #[serde(default)]
    pub ai_keys: Vec<CredentialCandidate>,

    /// Legacy single key from the general settings document.
    #[serde(default)]
    pub ai_legacy_key: Option<String>,

    /// Process-level fallback key.
    ///
    /// Set via OUTPOST_AI_FALLBACK_KEY, or GEMINI_API_KEY when unset.
    #[serde(default)]
    pub ai_fallback_key: Option<String>,

    /// Upper bound for a single credential attempt, in milliseconds.
    #[serde(default = "default_candidate_timeout_ms")]
    pub candidate_timeout_ms: u64,

    /// Upper bound for the connectivity self-test, in milliseconds.
    #[serde(default = "default_self_test_timeout_ms")]
    pub self_test_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./outpost.sqlite")
}

fn default_cache_version() -> String {
    "outpost-v1".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_root_document() -> String {
    "/".into()
}

fn default_offline_fallback() -> String {
    "/offline.html".into()
}

fn default_shell_manifest() -> Vec<String> {
    vec![
        "/".into(),
        "/manifest.json".into(),
        "/icons/icon-192x192.png".into(),
        "/icons/icon-512x512.png".into(),
        "/offline.html".into(),
    ]
}

fn default_user_agent() -> String {
    "outpost/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_notification_title() -> String {
    "New notification".into()
}

fn default_chat_link() -> String {
    "/chat".into()
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_ai_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_candidate_timeout_ms() -> u64 {
    30_000
}

fn default_self_test_timeout_ms() -> u64 {
    5_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            root_document: default_root_document(),
            offline_fallback: default_offline_fallback(),
            shell_manifest: default_shell_manifest(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            push_public_key: None,
            default_notification_title: default_notification_title(),
            chat_link: default_chat_link(),
            badge_icon_path: None,
            ai_base_url: default_ai_base_url(),
            ai_model: default_ai_model(),
            ai_config_key: None,
            ai_keys: Vec::new(),
            ai_legacy_key: None,
            ai_fallback_key: None,
            candidate_timeout_ms: default_candidate_timeout_ms(),
            self_test_timeout_ms: default_self_test_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_millis(self.candidate_timeout_ms)
    }

    pub fn self_test_timeout(&self) -> Duration {
        Duration::from_millis(self.self_test_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OUTPOST_`
    /// 2. TOML file from `OUTPOST_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OUTPOST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OUTPOST_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let mut config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        if config.ai_fallback_key.is_none() {
            config.ai_fallback_key = std::env::var(FALLBACK_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }

        config.validate()?;

        Ok(config)
    }

    /// Check if the push public key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the push public key is not set.
    pub fn require_push_public_key(&self) -> Result<&str, ConfigError> {
        self.push_public_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "push_public_key".into(),
                hint: "Set OUTPOST_PUSH_PUBLIC_KEY environment variable".into(),
            })
    }

    /// Credential documents as the key-rotation proxy sees them.
    pub fn credential_sources(&self) -> CredentialSources {
        CredentialSources {
            ai_config: self
                .ai_config_key
                .as_ref()
                .map(|key| AiConfigDocument { api_key: Some(key.clone()) }),
            settings: if self.ai_keys.is_empty() && self.ai_legacy_key.is_none() {
                None
            } else {
                Some(SettingsDocument { api_keys: self.ai_keys.clone(), api_key: self.ai_legacy_key.clone() })
            },
            fallback: self.ai_fallback_key.clone(),
        }
    }
}
