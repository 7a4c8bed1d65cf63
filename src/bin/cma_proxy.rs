// src/bin/cma_proxy.rs
//! CORS proxy in front of the content repository and its Content
//! Management API. Listens on `PORT` (default 3000) and serves the UI
//! bundle from `web_static/`.

use std::sync::Arc;

use anyhow::Context;
use cma_console::proxy::{ProxyConfig, ProxyServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ProxyConfig::from_env();
    let server = Arc::new(ProxyServer::new(config).context("invalid proxy configuration")?);

    server.run().await.context("proxy server failed")?;
    Ok(())
}
