//! Delivery-token lifecycle.
//!
//! Each activation (app start, identity change) walks permission, agent
//! registration, token fetch and the account-store write. Any step may fail;
//! a failure ends that activation only and is retried on the next trigger.
//! Nothing here returns an error to the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use outpost_core::{AppConfig, TokenStore};
use tokio::sync::watch;

use crate::identity::Identity;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct PlatformError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Not decided yet; the user will be asked.
    Prompt,
    Granted,
    Denied,
}

/// Handle to the background agent registration tokens are scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub scope: String,
}

/// Host push facilities.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    fn is_supported(&self) -> bool;

    fn permission(&self) -> PermissionState;

    async fn request_permission(&self) -> Result<PermissionState, PlatformError>;

    async fn registration_ready(&self) -> Result<Registration, PlatformError>;

    /// Ask the push provider for this install's token.
    async fn delivery_token(&self, registration: &Registration, public_key: &str) -> Result<Option<String>, PlatformError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStage {
    Permission,
    Registration,
    Token,
    Store,
}

/// How an activation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    MissingPublicKey,
    Unsupported,
    PermissionDenied,
    Failed(TokenStage),
    NoToken,
    NoIdentity,
    /// The token was already synced for this identity by this manager.
    AlreadyRecorded,
    Recorded { newly_added: bool },
}

pub struct TokenManager {
    platform: Arc<dyn PushPlatform>,
    store: Arc<dyn TokenStore>,
    public_key: Option<String>,
    /// Last token synced per identity.
    recorded: Mutex<HashMap<String, String>>,
}

impl TokenManager {
    pub fn new(platform: Arc<dyn PushPlatform>, store: Arc<dyn TokenStore>, public_key: Option<String>) -> Self {
        let public_key = public_key.filter(|k| !k.trim().is_empty());
        Self { platform, store, public_key, recorded: Mutex::new(HashMap::new()) }
    }

    /// Build from configuration; without a public key every activation stops
    /// at [`TokenOutcome::MissingPublicKey`].
    pub fn from_app(config: &AppConfig, platform: Arc<dyn PushPlatform>, store: Arc<dyn TokenStore>) -> Self {
        let public_key = match config.require_push_public_key() {
            Ok(key) => Some(key.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "push delivery disabled");
                None
            }
        };
        Self::new(platform, store, public_key)
    }

    pub async fn activate(&self, identity: Option<&Identity>) -> TokenOutcome {
        let Some(public_key) = self.public_key.as_deref() else {
            tracing::warn!("no push public key configured, push delivery disabled");
            return TokenOutcome::MissingPublicKey;
        };

        if !self.platform.is_supported() {
            tracing::debug!("push not supported on this platform");
            return TokenOutcome::Unsupported;
        }

        let permission = match self.platform.permission() {
            PermissionState::Prompt => match self.platform.request_permission().await {
                Ok(state) => state,
                Err(e) => return failed(TokenStage::Permission, &e),
            },
            state => state,
        };
        if permission != PermissionState::Granted {
            tracing::info!("push permission not granted");
            return TokenOutcome::PermissionDenied;
        }

        let registration = match self.platform.registration_ready().await {
            Ok(registration) => registration,
            Err(e) => return failed(TokenStage::Registration, &e),
        };

        let token = match self.platform.delivery_token(&registration, public_key).await {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                tracing::debug!(scope = %registration.scope, "provider returned no token");
                return TokenOutcome::NoToken;
            }
            Err(e) => return failed(TokenStage::Token, &e),
        };

        let Some(identity) = identity else {
            tracing::debug!("token obtained but no identity is signed in");
            return TokenOutcome::NoIdentity;
        };

        if self.is_recorded(&identity.uid, &token) {
            return TokenOutcome::AlreadyRecorded;
        }

        match self.store.append_token(&identity.uid, &token).await {
            Ok(newly_added) => {
                if let Ok(mut recorded) = self.recorded.lock() {
                    recorded.insert(identity.uid.clone(), token);
                }
                tracing::info!(uid = %identity.uid, newly_added, "delivery token synced");
                TokenOutcome::Recorded { newly_added }
            }
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "failed to store delivery token");
                TokenOutcome::Failed(TokenStage::Store)
            }
        }
    }

    /// Re-run activation on every identity change until the sender is dropped.
    pub async fn run(&self, mut identities: watch::Receiver<Option<Identity>>) {
        loop {
            let identity = identities.borrow_and_update().clone();
            self.activate(identity.as_ref()).await;
            if identities.changed().await.is_err() {
                break;
            }
        }
    }

    fn is_recorded(&self, uid: &str, token: &str) -> bool {
        self.recorded
            .lock()
            .map(|recorded| recorded.get(uid).is_some_and(|t| t == token))
            .unwrap_or(false)
    }
}

fn failed(stage: TokenStage, error: &PlatformError) -> TokenOutcome {
    tracing::warn!(stage = ?stage, error = %error, "token flow aborted");
    TokenOutcome::Failed(stage)
}
