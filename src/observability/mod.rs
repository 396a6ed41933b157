//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! subsystems → tracing macros → logging.rs (subscriber, level filter)
//! pipeline events → metrics.rs → Prometheus exposition endpoint
//! ```

pub mod logging;
pub mod metrics;
