//! Cached slug generation and canonical URL enforcement.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{slug_key, Cache};
use crate::observability::metrics;
use crate::request::redirect::{Redirect, RedirectReason};
use crate::routing::params::RouteParams;
use crate::slug::clean::{clean_title, SlugOptions};
use crate::slug::patterns::RedirectPatterns;
use crate::slug::{RequestedSlug, Slug, SlugKind, SlugLookup};

/// Result of resolving a slug against the requested one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum SlugOutcome {
    /// The request already uses the canonical slug (or carried none).
    Canonical(Slug),
    /// The request must be redirected before rendering.
    Redirect(Redirect),
}

/// Request-scoped slug generator.
pub struct Slugger {
    options: Arc<SlugOptions>,
    patterns: Arc<RedirectPatterns>,
    cache: Arc<dyn Cache>,
    base_url: String,
    separator: String,
    known: HashMap<(SlugKind, u64), String>,
    requested: Option<RequestedSlug>,
}

impl Slugger {
    pub fn new(
        options: Arc<SlugOptions>,
        patterns: Arc<RedirectPatterns>,
        cache: Arc<dyn Cache>,
        base_url: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            options,
            patterns,
            cache,
            base_url: base_url.into(),
            separator: separator.into(),
            known: HashMap::new(),
            requested: None,
        }
    }

    /// Records the slug segment from the incoming path.
    pub fn with_requested(mut self, requested: Option<RequestedSlug>) -> Self {
        self.requested = requested;
        self
    }

    pub fn requested(&self) -> Option<&RequestedSlug> {
        self.requested.as_ref()
    }

    /// Slug for an entity: request cache, then external cache, then computed
    /// and persisted. An empty `source` gives an empty slug.
    pub fn slug(&mut self, source: &str, kind: SlugKind, id: u64) -> Slug {
        let value = self.value(source, kind, id);
        Slug { kind, id, value }
    }

    /// Like [`Slugger::slug`], but asks for a redirect when the request
    /// addressed this entity with a different slug.
    pub fn resolve(&mut self, source: &str, kind: SlugKind, id: u64, ambient: &RouteParams) -> SlugOutcome {
        let slug = self.slug(source, kind, id);

        let mismatch = self
            .requested
            .as_ref()
            .is_some_and(|r| r.kind == kind && r.id == id && r.value != slug.value);
        if !mismatch {
            return SlugOutcome::Canonical(slug);
        }

        let Some(pattern) = self.patterns.get(kind) else {
            tracing::warn!(kind = %kind, "No redirect pattern for slug kind");
            return SlugOutcome::Canonical(slug);
        };

        let params = pattern.render(id, ambient);
        let location = format!("{}?{}", self.base_url, params.serialize_encoded(&self.separator));
        tracing::info!(
            kind = %kind,
            id,
            requested = self.requested.as_ref().map(|r| r.value.as_str()).unwrap_or_default(),
            canonical = %slug.value,
            "Redirecting to canonical slug"
        );

        // The redirect settles the mismatch for the rest of this request.
        self.requested = None;
        SlugOutcome::Redirect(Redirect::permanent(location, RedirectReason::CanonicalSlug))
    }

    fn value(&mut self, source: &str, kind: SlugKind, id: u64) -> String {
        if source.trim().is_empty() {
            return String::new();
        }
        if let Some(value) = self.known.get(&(kind, id)) {
            metrics::record_slug_lookup("request");
            return value.clone();
        }

        let key = slug_key(kind, id);
        let value = match self.cache.get(&key) {
            Some(value) => {
                metrics::record_slug_lookup("external");
                value
            }
            None => {
                metrics::record_slug_lookup("computed");
                let value = clean_title(source, id, &self.options);
                if !value.is_empty() {
                    self.cache.put(&key, &value, None);
                }
                value
            }
        };

        self.known.insert((kind, id), value.clone());
        value
    }
}

impl SlugLookup for Slugger {
    fn lookup(&self, kind: SlugKind, id: u64) -> Option<String> {
        self.known
            .get(&(kind, id))
            .cloned()
            .or_else(|| self.cache.get(&slug_key(kind, id)))
            .filter(|s| !s.is_empty())
    }
}

impl std::fmt::Debug for Slugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slugger")
            .field("base_url", &self.base_url)
            .field("known", &self.known.len())
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}
