//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → middleware.rs (normalize: 400 / redirect / CleanRequest)
//!     → handlers.rs (canonical slug check, page output)
//!     → middleware.rs (rewrite internal links in HTML)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, Collaborators, HttpServer};
