//! Credential candidates for the AI key-rotation proxy.
//!
//! Candidates come from three sources checked in order. The first source that
//! yields at least one non-empty secret wins; sources are never merged.

use serde::{Deserialize, Serialize};

/// Operator-assigned health hint for a credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Valid,
    Invalid,
    #[default]
    Unchecked,
}

/// One upstream API key in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CredentialCandidate {
    #[serde(alias = "key")]
    pub secret: String,
    #[serde(default)]
    pub status: CredentialStatus,
}

impl CredentialCandidate {
    pub fn new(secret: impl Into<String>, status: CredentialStatus) -> Self {
        Self { secret: secret.into(), status }
    }

    /// `invalid` is a hint to skip; anything else is worth a call.
    pub fn is_skippable(&self) -> bool {
        self.status == CredentialStatus::Invalid
    }
}

/// Dedicated AI-configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfigDocument {
    #[serde(default, alias = "apiKey")]
    pub api_key: Option<String>,
}

/// General settings document holding keyed candidates and a legacy key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default, alias = "apiKeys")]
    pub api_keys: Vec<CredentialCandidate>,
    #[serde(default, alias = "apiKey")]
    pub api_key: Option<String>,
}

/// All places a credential may come from, in priority order.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub ai_config: Option<AiConfigDocument>,
    pub settings: Option<SettingsDocument>,
    pub fallback: Option<String>,
}

impl CredentialSources {
    /// Select the ordered candidate list from the first productive source.
    pub fn resolve(&self) -> Vec<CredentialCandidate> {
        if let Some(key) = self.ai_config.as_ref().and_then(|doc| non_empty(doc.api_key.as_deref())) {
            tracing::debug!(source = "ai_config", "credential source selected");
            return vec![CredentialCandidate::new(key, CredentialStatus::Unchecked)];
        }

        if let Some(settings) = &self.settings {
            let keyed: Vec<CredentialCandidate> = settings
                .api_keys
                .iter()
                .filter(|c| !c.secret.trim().is_empty())
                .cloned()
                .collect();
            if !keyed.is_empty() {
                tracing::debug!(source = "settings", count = keyed.len(), "credential source selected");
                return keyed;
            }
            if let Some(key) = non_empty(settings.api_key.as_deref()) {
                tracing::debug!(source = "settings_legacy", "credential source selected");
                return vec![CredentialCandidate::new(key, CredentialStatus::Unchecked)];
            }
        }

        if let Some(key) = non_empty(self.fallback.as_deref()) {
            tracing::debug!(source = "fallback", "credential source selected");
            return vec![CredentialCandidate::new(key, CredentialStatus::Unchecked)];
        }

        Vec::new()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
