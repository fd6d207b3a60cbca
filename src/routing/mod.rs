//! Proxy routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed client request
//!     → target.rs (host, port, path with trailing '/', cache key)
//!     → router.rs (method check, blacklist, conditional GET, cache/journal update)
//!     → origin.rs (fresh TCP connection, single HTTP/1.1 exchange)
//!     → Response back to the session
//! ```
//!
//! # Design Decisions
//! - One origin connection per request, never reused
//! - Every origin answer is revalidated against the cache via `If-None-Match`
//! - Rejections are ordinary responses; only client transport failures are errors

pub mod origin;
pub mod router;
pub mod target;

pub use origin::{OriginClient, OriginError};
pub use router::ProxyRouter;
pub use target::OriginTarget;
