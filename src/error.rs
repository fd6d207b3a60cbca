//! Crate-level error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::net::listener::ListenerError;

/// Boxed error used where body and transport errors are type-erased.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that abort a client session.
///
/// Everything else the router encounters is turned into a response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to read request body from client: {0}")]
    RequestBody(#[source] BoxError),
}

/// Failures that stop the process before it starts accepting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to prepare state directory {path:?}: {source}")]
    StateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open journal {path:?}: {source}")]
    Journal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
