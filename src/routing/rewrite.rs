//! Output rewriting: turns internal `base?query` links into pretty routes.
//!
//! # Design Decisions
//! - Only URLs starting with the configured base URL are touched
//! - Links containing `action=admin` are never rewritten
//! - Query values are carried verbatim (they are already encoded markup)

use regex::{Captures, Regex};

use crate::routing::params::RouteParams;
use crate::routing::registry::Registry;
use crate::slug::SlugLookup;

/// Rewrites links in rendered pages.
#[derive(Debug, Clone)]
pub struct UrlRewriter {
    base_url: String,
    pattern: Regex,
}

impl UrlRewriter {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let pattern = Regex::new(&format!(
            r#"{}\?([^"'#\s<>]*)(#[^"'\s<>]*)?"#,
            regex::escape(&base_url)
        ))
        .expect("escaped base URL always forms a valid pattern");
        Self { base_url, pattern }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rewrites every internal link in `html`.
    pub fn rewrite(&self, html: &str, registry: &Registry, slugs: &dyn SlugLookup) -> String {
        self.pattern
            .replace_all(html, |caps: &Captures<'_>| {
                let query = caps.get(1).map_or("", |m| m.as_str());
                let fragment = caps.get(2).map_or("", |m| m.as_str());
                match self.pretty(query, fragment, registry, slugs) {
                    Some(url) => url,
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Rewrites a single absolute URL, or returns it unchanged when it is
    /// external or excluded.
    pub fn rewrite_url(&self, url: &str, registry: &Registry, slugs: &dyn SlugLookup) -> String {
        let Some(rest) = url.strip_prefix(&self.base_url) else {
            return url.to_string();
        };
        let Some(rest) = rest.strip_prefix('?') else {
            return url.to_string();
        };
        let (query, fragment) = match rest.find('#') {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };
        self.pretty(query, fragment, registry, slugs)
            .unwrap_or_else(|| url.to_string())
    }

    fn pretty(&self, query: &str, fragment: &str, registry: &Registry, slugs: &dyn SlugLookup) -> Option<String> {
        if query.contains("action=admin") {
            return None;
        }
        let route = registry.build_route(raw_query_params(query), slugs);
        Some(format!("{}{}{}", self.base_url, route, fragment))
    }
}

/// Splits a query from markup on `;`, `&amp;` and `&` without decoding.
fn raw_query_params(query: &str) -> RouteParams {
    let mut params = RouteParams::new();
    for pair in query.replace("&amp;", "&").split(['&', ';']) {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if let Some(key) = key.strip_suffix("[]") {
            params.push_list(key, value);
        } else {
            params.insert(key, value);
        }
    }
    params
}
