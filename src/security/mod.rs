//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → blacklist.rs (reject requests to blocked hosts)
//!     → Pass to origin forwarding
//! ```
//!
//! # Design Decisions
//! - Policy is loaded once and never reloaded
//! - Fail open on a missing policy file: nothing is blocked

pub mod blacklist;

pub use blacklist::Blacklist;
