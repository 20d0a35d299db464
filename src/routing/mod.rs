//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path info (/topics/42.slug/20)
//!     → registry.rs (discriminator lookup)
//!     → translator.rs contract, entities.rs built-ins
//!     → Return: RouteParams merged under the query string
//!
//! Rendered output:
//!     → rewrite.rs (find base?query links)
//!     → registry.rs build_route
//!     → base/topics/42.slug/?rest
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - No regex in the parse path (segment splitting only)
//! - Deterministic: same params always build the same route
//! - Unknown discriminators fall back to the legacy flat formats

pub mod entities;
pub mod params;
pub mod registry;
pub mod rewrite;
pub mod translator;

pub use entities::EntityTranslator;
pub use params::{ParamValue, RouteParams, RoutePath};
pub use registry::{decode_legacy, ExtensionEntry, Registry, RegistryBuilder};
pub use rewrite::UrlRewriter;
pub use translator::{ParsedRoute, Translator};
