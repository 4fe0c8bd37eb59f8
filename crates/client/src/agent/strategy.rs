//! Per-request-class caching strategies.
//!
//! Routing is an ordered table of `(predicate, strategy)` rows evaluated
//! top-to-bottom; the first matching row wins.

use std::sync::Arc;

use outpost_core::{CacheStore, Error, RequestKey};
use tokio::task::JoinHandle;

use super::request::Request;
use crate::fetch::{FetchResponse, Fetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Network, then the cached exact request, then the cached root document.
    NetworkFirst,
    /// Cached copy immediately, refreshed in the background.
    StaleWhileRevalidate,
    /// Network; cache is read only when the network fails and never written.
    NetworkOnly,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkOnly => "network-only",
        }
    }
}

/// One row of the routing table.
pub struct Route {
    pub name: &'static str,
    pub matches: fn(&Request) -> bool,
    pub strategy: Strategy,
}

fn any_request(_: &Request) -> bool {
    true
}

pub const ROUTES: &[Route] = &[
    Route { name: "navigation", matches: Request::is_navigation, strategy: Strategy::NetworkFirst },
    Route { name: "static-asset", matches: Request::is_static_asset, strategy: Strategy::StaleWhileRevalidate },
    Route { name: "default", matches: any_request, strategy: Strategy::NetworkOnly },
];

/// Pick the strategy of the first route matching `request`.
pub fn select(routes: &[Route], request: &Request) -> Strategy {
    routes
        .iter()
        .find(|route| (route.matches)(request))
        .map(|route| {
            tracing::debug!(route = route.name, url = %request.url, "route selected");
            route.strategy
        })
        .unwrap_or(Strategy::NetworkOnly)
}

/// Where the returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    /// The cached root document stood in for an uncached navigation.
    RootFallback,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::RootFallback => "root-fallback",
        }
    }
}

/// Outcome of handling one intercepted request.
#[derive(Debug)]
pub struct Handled {
    pub response: FetchResponse,
    pub source: ResponseSource,
    pub strategy: Strategy,
    /// Background refresh spawned by stale-while-revalidate.
    pub revalidation: Option<JoinHandle<()>>,
}

impl Handled {
    fn new(response: FetchResponse, source: ResponseSource, strategy: Strategy) -> Self {
        Self { response, source, strategy, revalidation: None }
    }
}

/// Everything a strategy needs, cheap to clone into background tasks.
#[derive(Clone)]
pub(crate) struct StrategyContext {
    pub cache: Option<Arc<dyn CacheStore>>,
    pub fetcher: Arc<dyn Fetcher>,
    pub generation: Arc<str>,
}

impl StrategyContext {
    async fn read(&self, key: &RequestKey) -> Option<FetchResponse> {
        let cache = self.cache.as_ref()?;
        match cache.get(&self.generation, key).await {
            Ok(hit) => hit.map(FetchResponse::from),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed");
                None
            }
        }
    }

    /// Store a successful response. Failures are logged and swallowed.
    async fn write(&self, key: &RequestKey, response: &FetchResponse) {
        if !response.is_success() {
            return;
        }
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(e) = cache.put(&self.generation, key, &response.to_cached()).await {
            tracing::warn!(key = %key, error = %e, "cache write failed");
        }
    }

    pub async fn network_first(&self, request: &Request, root: &RequestKey) -> Result<Handled, Error> {
        let key = request.key();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.write(&key, &response).await;
                Ok(Handled::new(response, ResponseSource::Network, Strategy::NetworkFirst))
            }
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "navigation failed, trying cache");
                if let Some(cached) = self.read(&key).await {
                    return Ok(Handled::new(cached, ResponseSource::Cache, Strategy::NetworkFirst));
                }
                if let Some(shell) = self.read(root).await {
                    return Ok(Handled::new(shell, ResponseSource::RootFallback, Strategy::NetworkFirst));
                }
                Err(Error::Network(format!("{key}: {err}")))
            }
        }
    }

    pub async fn stale_while_revalidate(&self, request: &Request) -> Result<Handled, Error> {
        let key = request.key();

        if let Some(cached) = self.read(&key).await {
            let ctx = self.clone();
            let request = request.clone();
            let revalidation = tokio::spawn(async move {
                match ctx.fetcher.fetch(&request).await {
                    Ok(fresh) => ctx.write(&request.key(), &fresh).await,
                    Err(e) => tracing::debug!(url = %request.url, error = %e, "background refresh failed"),
                }
            });
            let mut handled = Handled::new(cached, ResponseSource::Cache, Strategy::StaleWhileRevalidate);
            handled.revalidation = Some(revalidation);
            return Ok(handled);
        }

        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| Error::Network(format!("{key}: {e}")))?;
        self.write(&key, &response).await;
        Ok(Handled::new(response, ResponseSource::Network, Strategy::StaleWhileRevalidate))
    }

    pub async fn network_only(&self, request: &Request) -> Result<Handled, Error> {
        let key = request.key();
        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(Handled::new(response, ResponseSource::Network, Strategy::NetworkOnly)),
            Err(err) => match self.read(&key).await {
                Some(cached) => Ok(Handled::new(cached, ResponseSource::Cache, Strategy::NetworkOnly)),
                None => Err(Error::Network(format!("{key}: {err}"))),
            },
        }
    }
}
