//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the caching proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, worker pool).
    pub listener: ListenerConfig,

    /// On-disk state: cache snapshot, journal, blacklist.
    pub storage: StorageConfig,

    /// Outbound origin settings.
    pub origin: OriginConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Path of the binary cache snapshot.
    pub fn cache_path(&self) -> PathBuf {
        self.storage.state_dir.join("cache.bin")
    }

    /// Path of the plain-text journal.
    pub fn journal_path(&self) -> PathBuf {
        self.storage.state_dir.join("log.txt")
    }

    /// Path of the blacklist file, resolved against the state directory.
    pub fn blacklist_path(&self) -> PathBuf {
        self.storage.state_dir.join(&self.storage.blacklist_file)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Worker threads serving sessions. `None` uses the host's available parallelism.
    pub workers: Option<usize>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            workers: None,
        }
    }
}

impl ListenerConfig {
    /// Resolved worker count.
    pub fn worker_threads(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Persistent state configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `cache.bin`, `log.txt` and the blacklist.
    pub state_dir: PathBuf,

    /// Blacklist file, relative to `state_dir`.
    pub blacklist_file: PathBuf,

    /// Cache updates tolerated before a snapshot is written.
    pub snapshot_threshold: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: std::env::temp_dir(),
            blacklist_file: PathBuf::from("blacklist.cfg"),
            snapshot_threshold: 100,
        }
    }
}

/// Origin connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Port used when the request target carries none.
    pub default_port: u16,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self { default_port: 80 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
