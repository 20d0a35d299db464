//! Request normalization.
//!
//! # Data Flow
//! ```text
//! RawRequest ──▶ reject checks ──▶ parse_query ──▶ Registry::parse_route
//!                                                        │
//!      Normalized::Redirect ◀── legacy links ◀───────────┘
//!      Normalized::Clean    ◀── addressing + escaping + client address
//! ```

pub mod addressing;
pub mod normalizer;
pub mod query;
pub mod redirect;

pub use addressing::Start;
pub use normalizer::{CleanRequest, Normalized, RawRequest, RequestNormalizer};
pub use query::{check_keys, parse_query, Separator};
pub use redirect::{Redirect, RedirectReason};
