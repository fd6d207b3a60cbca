//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, per-request spans)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! The audit journal in `crate::journal` is separate: it is part of the
//! proxy's persisted state, not operator diagnostics.

pub mod logging;
pub mod metrics;
