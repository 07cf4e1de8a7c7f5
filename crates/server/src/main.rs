//! offgrid server entry point.
//!
//! Loads configuration, installs and activates the current cache store
//! version, then serves the MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offgrid_client::{FetchClient, FetchConfig, Router, Transport};
use offgrid_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
#[cfg(test)]
mod testing;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, store = %config.store_name(), "Starting offgrid server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let transport: Arc<dyn Transport> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let router = Arc::new(Router::new(&config, db, transport.clone())?);

    let installed = router.install().await?;
    tracing::info!(store = %installed.store, cached = installed.cached, failed = installed.failed, "install complete");
    let activated = router.activate().await?;
    tracing::info!(current = %activated.current, deleted = ?activated.deleted, "activation complete");

    let handler = handler::OffgridServer::new(router.clone(), transport);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    router.settle().await;
    tracing::info!("offgrid server stopped");

    Ok(())
}
