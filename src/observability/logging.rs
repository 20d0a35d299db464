//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the filter from `RUST_LOG` or the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor configuration says otherwise.
pub const DEFAULT_FILTER: &str = "pretty_router=info,tower_http=info";

/// Builds the filter: `RUST_LOG` wins, then `level`, then [`DEFAULT_FILTER`].
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| match level {
            Some(level) if !level.trim().is_empty() => EnvFilter::try_new(level),
            _ => EnvFilter::try_new(DEFAULT_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(level: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
