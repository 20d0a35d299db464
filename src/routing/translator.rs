//! The route translation contract.

use std::fmt::Debug;

use crate::routing::params::{RouteParams, RoutePath};
use crate::slug::{RequestedSlug, SlugLookup};

/// Result of parsing a route: merged parameters plus the slug segment the
/// path carried, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRoute {
    pub params: RouteParams,
    pub requested_slug: Option<RequestedSlug>,
}

impl ParsedRoute {
    pub fn unchanged(params: RouteParams) -> Self {
        Self {
            params,
            requested_slug: None,
        }
    }
}

/// Bidirectional mapping between path segments and parameters for one
/// resource type.
pub trait Translator: Send + Sync + Debug {
    /// Emits segments (discriminator first) for the keys this translator
    /// understands and returns every other entry untouched.
    fn build_route(&self, params: RouteParams, slugs: &dyn SlugLookup) -> (RoutePath, RouteParams);

    /// Rebuilds parameters from `route`. Entries already present in
    /// `params` win over path-derived values.
    fn parse_route(&self, route: &RoutePath, params: RouteParams) -> ParsedRoute;
}
