//! Gatekeeper host entry point.
//!
//! Boots the worker the way a browser registers a service worker: install
//! (precache), then activate when skip-waiting is enabled. The fetch hook is
//! then served over MCP on stdio. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use gatekeeper_client::{FetchClient, FetchConfig};
use gatekeeper_core::{AppConfig, CacheDb};
use gatekeeper_worker::Gatekeeper;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let names = config.store_names();
    tracing::info!(
        origin = %config.origin,
        precache = names.precache(),
        runtime = names.runtime(),
        db_path = %config.db_path.display(),
        "starting gatekeeper"
    );

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    tracing::debug!(
        max_bytes = network.config().max_bytes,
        timeout = ?network.config().timeout,
        "fetch client ready"
    );
    let worker = Arc::new(Gatekeeper::new(&config, storage, Arc::clone(&network))?);

    let installed = worker.install().await.context("worker install failed")?;
    if installed.skip_waiting {
        worker.activate().await.context("worker activation failed")?;
    } else {
        tracing::info!("worker installed and waiting; call sw_activate to take control");
    }

    let handler = handler::GatekeeperServer::new(Arc::clone(&worker), network, config.origin.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    worker.settle().await;

    Ok(())
}
