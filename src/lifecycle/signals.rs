//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A failure to install the handler is logged and treated as a signal

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to install Ctrl+C handler"),
    }
}

/// Trigger `shutdown` on the first Ctrl+C.
pub fn spawn_signal_handler(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        shutdown_signal().await;
        let notified = shutdown.trigger();
        tracing::debug!(subscribers = notified, "Shutdown broadcast");
    })
}
