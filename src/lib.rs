//! Virtual routing and URL canonicalization for a forum front controller.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::middleware ──▶ request::RequestNormalizer
//!                                               │
//!                        ┌──────────────────────┼───────────────────────┐
//!                        ▼                      ▼                       ▼
//!                 routing::Registry   security::ProxyTrustResolver  store::TopicLocator
//!                 (pretty ⇄ params)   (ban-check address)           (msg → topic)
//!                        │
//!                        ▼
//!     Client Response ◀── routing::UrlRewriter ◀── slug::Slugger ◀── cache
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod request;
pub mod routing;
pub mod security;
pub mod slug;
pub mod store;

pub use config::schema::RouterConfig;
pub use error::RequestError;
pub use http::HttpServer;
pub use request::{CleanRequest, Normalized, RawRequest, RequestNormalizer};
pub use routing::{Registry, UrlRewriter};
