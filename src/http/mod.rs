//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP connection
//!     → server.rs (dispatcher: spawn one session per connection)
//!     → session.rs (HTTP/1.1 keep-alive loop, one request at a time)
//!     → [routing layer decides and forwards]
//!     → response.rs (proxy-generated rejections)
//!     → Send to client
//! ```

pub mod response;
pub mod server;
pub mod session;

pub use server::ProxyServer;
