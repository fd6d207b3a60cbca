//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build runtime → Load state → Bind listener → Accept loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Final cache snapshot → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
