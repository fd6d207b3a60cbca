//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the worker pool with the configured thread count
//! - Initialize metrics, proxy state and the listener in dependency order
//! - Run the accept loop until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, after state has loaded

use std::net::SocketAddr;
use std::path::Path;

use crate::config::loader::{finalize, load_config};
use crate::config::ProxyConfig;
use crate::error::StartupError;
use crate::http::ProxyServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::net::Listener;
use crate::observability::metrics;

/// Resolve the effective configuration: optional TOML file, then
/// `overrides`, then validation.
pub fn prepare_config(
    file: Option<&Path>,
    overrides: impl FnOnce(&mut ProxyConfig),
) -> Result<ProxyConfig, StartupError> {
    let mut config = match file {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    overrides(&mut config);
    Ok(finalize(config)?)
}

/// Run the proxy to completion on a dedicated multi-threaded runtime.
pub fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let workers = config.listener.worker_threads();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("proxy-worker")
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    tracing::info!(workers, "Worker pool started");
    runtime.block_on(serve(config))
}

/// Initialize every subsystem and serve until a termination signal arrives.
pub async fn serve(config: ProxyConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = ProxyServer::new(&config).await?;
    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_signal(shutdown));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
