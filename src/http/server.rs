//! Connection dispatcher.
//!
//! # Responsibilities
//! - Build the shared proxy state (blacklist, journal, cache) once
//! - Accept connections sequentially and spawn one session task per connection
//! - Stop accepting on shutdown and write a final cache snapshot
//!
//! # Design Decisions
//! - Spawning never waits for a free worker; pending sessions queue in the
//!   runtime without bound
//! - Accept errors end the server; session errors stay in their session

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::error::StartupError;
use crate::http::session::serve_session;
use crate::journal::Journal;
use crate::net::connection::ConnectionTracker;
use crate::net::{Listener, ListenerError};
use crate::routing::{OriginClient, ProxyRouter};
use crate::security::Blacklist;

/// The forward caching proxy.
pub struct ProxyServer {
    router: Arc<ProxyRouter>,
    cache: Arc<CacheStore>,
    journal: Arc<Journal>,
    tracker: ConnectionTracker,
}

impl ProxyServer {
    /// Prepare the state directory and load all process-wide state.
    pub async fn new(config: &ProxyConfig) -> Result<Self, StartupError> {
        let state_dir = &config.storage.state_dir;
        tokio::fs::create_dir_all(state_dir)
            .await
            .map_err(|source| StartupError::StateDir {
                path: state_dir.clone(),
                source,
            })?;

        let blacklist = Blacklist::load(&config.blacklist_path());

        let journal_path = config.journal_path();
        let journal = Journal::create(&journal_path)
            .await
            .map_err(|source| StartupError::Journal {
                path: journal_path,
                source,
            })?;
        let journal = Arc::new(journal);

        let cache = Arc::new(CacheStore::open(config.cache_path()));

        let router = Arc::new(ProxyRouter::new(
            blacklist,
            Arc::clone(&cache),
            Arc::clone(&journal),
            OriginClient::new(config.origin.default_port),
            config.storage.snapshot_threshold,
        ));

        tracing::info!(
            state_dir = ?state_dir,
            cached_entries = cache.len(),
            snapshot_threshold = config.storage.snapshot_threshold,
            "Proxy state initialized"
        );

        Ok(Self {
            router,
            cache,
            journal,
            tracker: ConnectionTracker::new(),
        })
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }

    pub fn router(&self) -> &Arc<ProxyRouter> {
        &self.router
    }

    /// Accept connections until `shutdown` fires or accepting fails.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Proxy accepting connections");
        }

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            };

            let guard = self.tracker.track();
            tokio::spawn(serve_session(stream, peer, Arc::clone(&self.router), guard));
        }

        self.persist_on_shutdown().await;
        Ok(())
    }

    async fn persist_on_shutdown(&self) {
        let open_sessions = self.tracker.active_count();
        if open_sessions > 0 {
            tracing::info!(open_sessions, "Abandoning open sessions");
        }

        let cache = Arc::clone(&self.cache);
        match tokio::task::spawn_blocking(move || cache.snapshot_to_disk()).await {
            Ok(Ok(entries)) => tracing::info!(path = ?self.cache.path(), entries, "Final cache snapshot written"),
            Ok(Err(e)) => tracing::warn!(path = ?self.cache.path(), error = %e, "Final cache snapshot failed"),
            Err(e) => tracing::error!(error = %e, "Final cache snapshot task panicked"),
        }
    }
}
