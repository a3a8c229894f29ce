//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the router over a hierarchy, registering configured filters
//! - Bind the listener last, so traffic only arrives once routing is ready

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, DispatchConfig, ListenerConfig, LoadError};
use crate::error::ConfigError;
use crate::hierarchy::Hierarchy;
use crate::routing::Router;

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Load(#[from] LoadError),

    #[error("router: {0}")]
    Router(#[from] ConfigError),

    #[error("invalid bind address {0:?}")]
    Address(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Load the config file, or fall back to defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<DispatchConfig, StartupError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => {
            tracing::info!("No config file given, using defaults");
            Ok(DispatchConfig::default())
        }
    }
}

/// Build the shared router from the `[routing]` section.
pub fn build_router(hierarchy: Arc<Hierarchy>, config: &DispatchConfig) -> Result<Arc<Router>, StartupError> {
    let router = Router::from_config(hierarchy, &config.routing)?;
    Ok(Arc::new(router))
}

/// Bind the configured listener address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|_| StartupError::Address(config.bind_address.clone()))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    tracing::info!(address = %addr, "Listener bound");
    Ok(listener)
}
