//! Long-lived components shared by every tool call.

use std::sync::Arc;

use outpost_client::{
    AgentConfig, FetchConfig, Fetcher, GeminiClient, GeminiConfig, HttpFetcher, InterceptionAgent, KeyRotationProxy,
    Upstream,
};
use outpost_core::{AppConfig, Error, LocalDb};
use url::Url;

pub struct AppState {
    pub config: AppConfig,
    pub origin: Url,
    /// `None` when the store failed to open; the agent then passes through.
    pub db: Option<LocalDb>,
    pub agent: Arc<InterceptionAgent>,
    pub proxy: KeyRotationProxy,
}

impl AppState {
    /// Open the local store and wire the agent and proxy to real HTTP clients.
    ///
    /// A store that cannot be opened is logged and leaves the server running
    /// with a pass-through agent.
    pub async fn open(config: AppConfig) -> anyhow::Result<Arc<Self>> {
        let db = match LocalDb::open(&config.db_path).await {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(db = %config.db_path.display(), error = %e, "local store unavailable, agent will pass through");
                None
            }
        };
        let fetcher = Arc::new(HttpFetcher::new(FetchConfig {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        })?);
        let upstream = Arc::new(GeminiClient::new(GeminiConfig::from_app(&config))?);
        Self::assemble(config, db, fetcher, upstream)
    }

    /// Build state around caller-supplied network seams.
    pub fn assemble(
        config: AppConfig, db: Option<LocalDb>, fetcher: Arc<dyn Fetcher>, upstream: Arc<dyn Upstream>,
    ) -> anyhow::Result<Arc<Self>> {
        let agent_config = AgentConfig::from_app(&config)?;
        let origin = agent_config.origin.clone();
        let agent = match &db {
            Some(db) => InterceptionAgent::new(agent_config, Arc::new(db.clone()), fetcher),
            None => InterceptionAgent::pass_through(agent_config, fetcher),
        };
        let proxy = KeyRotationProxy::from_app(&config, upstream);
        Ok(Arc::new(Self { config, origin, db, agent: Arc::new(agent), proxy }))
    }

    /// The local store, or `STORE_UNAVAILABLE` when it failed to open.
    pub fn store(&self) -> Result<&LocalDb, Error> {
        self.db
            .as_ref()
            .ok_or_else(|| Error::StoreUnavailable(format!("{} could not be opened", self.config.db_path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{self, FakeNetwork};
    use crate::tools::{agent_fetch, badge_count, cache, device_tokens};

    #[tokio::test]
    async fn test_unopenable_store_degrades_to_pass_through() {
        let blocker = std::env::temp_dir().join(format!("outpost-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();
        let config = AppConfig { db_path: blocker.join("outpost.sqlite"), ..AppConfig::default() };

        let state = AppState::open(config).await.unwrap();
        assert!(state.db.is_none());
        assert!(state.agent.is_pass_through().await);
        assert!(matches!(state.store(), Err(Error::StoreUnavailable(_))));

        let report = state.agent.start().await.unwrap();
        assert!(report.pass_through);
        assert_eq!(report.precached, 0);

        let _ = std::fs::remove_file(&blocker);
    }

    #[tokio::test]
    async fn test_tools_without_store() {
        let network = FakeNetwork::serving(&testing::shell());
        let state = AppState::assemble(testing::config(), None, network, Arc::new(testing::FakeUpstream)).unwrap();

        let err = cache::generations_impl(&state).await.unwrap_err();
        assert_eq!(err.code.0, -32001);

        let params = device_tokens::DeviceTokensParams { uid: "u1".into() };
        let err = device_tokens::tokens_impl(&state, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);

        let activated: cache::activate::CacheActivateOutput =
            testing::output(&cache::activate_impl(&state).await.unwrap());
        assert!(activated.pass_through);

        let params = agent_fetch::AgentFetchParams { url: "/".into(), navigate: true };
        let fetched: agent_fetch::AgentFetchOutput = testing::output(&agent_fetch::fetch_impl(&state, params).await.unwrap());
        assert_eq!(fetched.source, "network");

        let sources = serde_json::json!({ "identity": { "uid": "s1", "role": "admin" } });
        assert!(badge_count::count_impl(badge_count::BadgeCountParams { sources }).is_ok());
    }
}
