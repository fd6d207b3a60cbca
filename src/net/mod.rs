//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → connection.rs (session id, open-session count)
//!     → Hand off to the HTTP session on the worker pool
//! ```
//!
//! # Design Decisions
//! - The accept queue is unbounded; overload shows up as queued sessions
//! - Each connection is tracked so shutdown can report what it abandons

pub mod connection;
pub mod listener;

pub use listener::{Listener, ListenerError};
