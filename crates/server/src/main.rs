//! outpost server entry point.
//!
//! Boots the operations server on stdio transport. Logging goes to stderr to
//! avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = outpost_core::AppConfig::load()?;
    tracing::info!(db = %config.db_path.display(), version = %config.cache_version, "starting outpost on stdio transport");

    let state = state::AppState::open(config).await?;

    let agent = state.agent.clone();
    tokio::spawn(async move {
        if let Err(e) = agent.start().await {
            tracing::warn!(error = %e, "agent install failed, serving from network only");
        }
    });

    let handler = handler::OutpostServer::new(state);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
