//! vodgate server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use vodgate_client::Proxy;
use vodgate_core::{AesGcmDecryptor, AppConfig, CacheDb, SystemClock};

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
    let decryptor = AesGcmDecryptor::from_base64(config.require_envelope_key()?).context("invalid envelope key")?;

    let clock = Arc::new(SystemClock);
    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache at {}", config.db_path.display()))?;
    let purged = db.purge_expired().await?;
    tracing::debug!(purged, "dropped expired cache rows");

    let proxy = Proxy::from_config(&config, Arc::new(db), Arc::new(decryptor), clock)?;

    tracing::info!(upstream = %config.upstream_base_url, "Starting vodgate server on stdio transport");

    let handler = handler::VodgateServer::new(proxy);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
