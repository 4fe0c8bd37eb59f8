//! Network interception agent.
//!
//! A single long-lived agent per origin that owns the cache generations and
//! answers every intercepted request with the strategy its route selects.
//!
//! ### Lifecycle
//! - **Install**: open the generation named by the agent version and precache
//!   the shell manifest. Control is taken right away; there is no waiting phase.
//! - **Activate**: delete every generation other than the current one. This is
//!   the only eviction; entries have no TTL.
//! - A store that fails to open degrades the agent to network pass-through.

pub mod request;
pub mod strategy;

use std::sync::Arc;

use outpost_core::{AppConfig, CacheStore, Error, RequestKey};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Fetcher, canonicalize, resolve};
use strategy::StrategyContext;

pub use request::{Destination, Request, RequestMode};
pub use strategy::{Handled, ROUTES, ResponseSource, Route, Strategy, select};

/// Static definition of an agent build.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Generation name; a new version supersedes every older generation.
    pub version: String,
    pub origin: Url,
    pub shell_manifest: Vec<String>,
    pub root_document: String,
}

impl AgentConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = canonicalize(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        Ok(Self {
            version: config.cache_version.clone(),
            origin,
            shell_manifest: config.shell_manifest.clone(),
            root_document: config.root_document.clone(),
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, Error> {
        resolve(&self.origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this build never takes control.
    Redundant,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Parsed => "parsed",
            AgentState::Installing => "installing",
            AgentState::Installed => "installed",
            AgentState::Activating => "activating",
            AgentState::Activated => "activated",
            AgentState::Redundant => "redundant",
        }
    }
}

/// Result of an install pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub generation: String,
    pub precached: usize,
    pub pass_through: bool,
}

pub struct InterceptionAgent {
    config: AgentConfig,
    cache: RwLock<Option<Arc<dyn CacheStore>>>,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<AgentState>,
    routes: &'static [Route],
}

impl InterceptionAgent {
    pub fn new(config: AgentConfig, cache: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            cache: RwLock::new(Some(cache)),
            fetcher,
            state: RwLock::new(AgentState::Parsed),
            routes: ROUTES,
        }
    }

    /// An agent without a cache store: every request goes to the network.
    pub fn pass_through(config: AgentConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            cache: RwLock::new(None),
            fetcher,
            state: RwLock::new(AgentState::Parsed),
            routes: ROUTES,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub async fn state(&self) -> AgentState {
        *self.state.read().await
    }

    pub async fn is_pass_through(&self) -> bool {
        self.cache.read().await.is_none()
    }

    async fn set_state(&self, next: AgentState) {
        let mut state = self.state.write().await;
        tracing::info!(version = %self.config.version, from = ?*state, to = ?next, "agent state change");
        *state = next;
    }

    /// Install then activate immediately.
    pub async fn start(&self) -> Result<InstallReport, Error> {
        let report = self.install().await?;
        self.activate().await?;
        Ok(report)
    }

    /// Open the current generation and precache the shell manifest.
    ///
    /// # Errors
    ///
    /// Fails when a manifest asset cannot be fetched or stored; the agent is
    /// then redundant, unless it was already active, in which case it keeps
    /// serving its generation. A store that cannot be opened is not an error: the
    /// agent continues as a network pass-through.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let previous = self.state().await;
        self.set_state(AgentState::Installing).await;

        let cache = self.cache.read().await.clone();
        let Some(cache) = cache else {
            self.set_state(AgentState::Installed).await;
            return Ok(self.pass_through_report());
        };

        if let Err(e) = cache.open(&self.config.version).await {
            tracing::warn!(version = %self.config.version, error = %e, "cache store unavailable, passing through");
            *self.cache.write().await = None;
            self.set_state(AgentState::Installed).await;
            return Ok(self.pass_through_report());
        }

        match self.precache(cache.as_ref()).await {
            Ok(precached) => {
                self.set_state(AgentState::Installed).await;
                Ok(InstallReport { generation: self.config.version.clone(), precached, pass_through: false })
            }
            Err(e) if previous == AgentState::Activated => {
                tracing::warn!(version = %self.config.version, error = %e, "reinstall failed, keeping active generation");
                self.set_state(AgentState::Activated).await;
                Err(e)
            }
            Err(e) => {
                tracing::warn!(version = %self.config.version, error = %e, "install failed");
                self.set_state(AgentState::Redundant).await;
                Err(e)
            }
        }
    }

    async fn precache(&self, cache: &dyn CacheStore) -> Result<usize, Error> {
        let mut precached = 0;
        for path in &self.config.shell_manifest {
            let request = Request::get(self.config.url_for(path)?);
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| Error::Network(format!("precache {path}: {e}")))?;
            if !response.is_success() {
                return Err(Error::Network(format!("precache {path}: status {}", response.status)));
            }
            cache
                .put(&self.config.version, &request.key(), &response.to_cached())
                .await?;
            precached += 1;
        }
        tracing::info!(version = %self.config.version, precached, "shell precached");
        Ok(precached)
    }

    fn pass_through_report(&self) -> InstallReport {
        InstallReport { generation: self.config.version.clone(), precached: 0, pass_through: true }
    }

    /// Delete every generation other than the current one.
    ///
    /// Returns the names of the generations that were removed.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        if self.state().await == AgentState::Redundant {
            return Err(Error::InvalidInput(format!("agent {} failed to install", self.config.version)));
        }
        self.set_state(AgentState::Activating).await;

        let mut deleted = Vec::new();
        let cache = self.cache.read().await.clone();
        if let Some(cache) = cache {
            match cache.generation_names().await {
                Ok(names) => {
                    for name in names.into_iter().filter(|name| *name != self.config.version) {
                        match cache.delete_generation(&name).await {
                            Ok(_) => deleted.push(name),
                            Err(e) => tracing::warn!(generation = %name, error = %e, "failed to delete generation"),
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to list cache generations"),
            }
        }

        if !deleted.is_empty() {
            tracing::info!(current = %self.config.version, ?deleted, "retired old cache generations");
        }
        self.set_state(AgentState::Activated).await;
        Ok(deleted)
    }

    /// Answer an intercepted request.
    ///
    /// The returned future stays pending until the selected strategy has a
    /// response; stale-while-revalidate hands back its background refresh.
    pub async fn handle(&self, request: &Request) -> Result<Handled, Error> {
        let ctx = StrategyContext {
            cache: self.cache.read().await.clone(),
            fetcher: Arc::clone(&self.fetcher),
            generation: Arc::from(self.config.version.as_str()),
        };

        match select(self.routes, request) {
            Strategy::NetworkFirst => ctx.network_first(request, &self.root_key()?).await,
            Strategy::StaleWhileRevalidate => ctx.stale_while_revalidate(request).await,
            Strategy::NetworkOnly => ctx.network_only(request).await,
        }
    }

    fn root_key(&self) -> Result<RequestKey, Error> {
        Ok(Request::get(self.config.url_for(&self.config.root_document)?).key())
    }
}
