//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! normalizer / slugger / cache / http:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (redirect, rejection and cache counters)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the HTTP span
//! - Metric calls are no-ops until a recorder is installed
//! - Log level comes from `RUST_LOG`, falling back to configuration

pub mod logging;
pub mod metrics;
