//! Forward HTTP proxy with ETag revalidation, a persistent response cache,
//! a host blacklist and an append-only audit journal.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod journal;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
