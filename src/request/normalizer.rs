//! The request entry point: raw transport data → canonical parameters.
//!
//! # Responsibilities
//! - Reject attacker-shaped input before anything else reads it
//! - Parse the query string under the configured separator
//! - Merge pretty-route parameters (query string wins)
//! - Canonicalize board/topic/start addressing
//! - Issue legacy-link redirects (activation links, bare `msg=`)
//! - Escape every value and resolve the ban-check address
//!
//! # Design Decisions
//! - Rejections are terminal and never partially applied
//! - Redirects are returned as values; the caller emits them and stops
//! - The normalizer is synchronous; collaborators are blocking calls

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::RequestError;
use crate::observability::metrics;
use crate::request::addressing::{leading_int, parse_id, split_addressing, Start};
use crate::request::query::{check_keys, parse_query, Separator};
use crate::request::redirect::{Redirect, RedirectReason};
use crate::routing::params::{ParamValue, RouteParams};
use crate::routing::registry::Registry;
use crate::security::proxy::{ClientAddr, ProxyTrustResolver};
use crate::slug::RequestedSlug;
use crate::store::TopicLocator;

/// Keys that only make sense as scalars; list values are discarded.
const SCALAR_KEYS: [&str; 6] = ["action", "board", "topic", "threadid", "start", "msg"];

/// Prefix of an over-encoded activation link.
const ACTIVATION_PREFIX: &str = "action=activate%3b";

/// Raw transport-level request data.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Extra path after the script, e.g. `/topics/42.slug/`.
    pub path_info: String,
    pub query_string: String,
    /// Query string before server-side rewriting, if any.
    pub original_query_string: Option<String>,
    pub remote_addr: Option<String>,
    pub headers: HeaderMap,
}

impl RawRequest {
    pub fn new(path_info: impl Into<String>, query_string: impl Into<String>) -> Self {
        Self {
            path_info: path_info.into(),
            query_string: query_string.into(),
            ..Self::default()
        }
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_original_query(mut self, query: impl Into<String>) -> Self {
        self.original_query_string = Some(query.into());
        self
    }

    /// Adds a header; invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }
}

/// Canonical view of a request, read-only from here on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanRequest {
    pub params: RouteParams,
    /// Canonical params before HTML escaping, for building URLs.
    #[serde(skip)]
    pub unescaped: RouteParams,
    pub requested_slug: Option<RequestedSlug>,
    pub client: ClientAddr,
}

/// Outcome of normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Clean(CleanRequest),
    Redirect(Redirect),
}

/// Converts raw requests into canonical parameter maps.
#[derive(Debug, Clone)]
pub struct RequestNormalizer {
    registry: Arc<Registry>,
    resolver: ProxyTrustResolver,
    locator: Option<TopicLocator>,
    separator: Separator,
    base_url: String,
}

impl RequestNormalizer {
    pub fn new(
        registry: Arc<Registry>,
        resolver: ProxyTrustResolver,
        separator: Separator,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            resolver,
            locator: None,
            separator,
            base_url: base_url.into(),
        }
    }

    /// Enables the bare `msg=` → topic redirect.
    pub fn with_topic_locator(mut self, locator: TopicLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn separator(&self) -> Separator {
        self.separator
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Normalizes one request.
    pub fn clean(&self, raw: &RawRequest) -> Result<Normalized, RequestError> {
        let query = if raw.query_string.starts_with("url=/") {
            raw.original_query_string.as_deref().unwrap_or_default()
        } else {
            raw.query_string.as_str()
        };

        if query.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("http")) {
            return Err(reject(RequestError::UrlInQuery));
        }

        let params = parse_query(query, self.separator);
        check_keys(&params).map_err(reject)?;

        if let Some(redirect) = self.activation_redirect(query) {
            return Ok(Normalized::Redirect(redirected(redirect)));
        }

        let parsed = self.registry.parse_route(&raw.path_info, params);
        let mut params = parsed.params;
        check_keys(&params).map_err(reject)?;

        for key in SCALAR_KEYS {
            if matches!(params.get(key), Some(ParamValue::List(_))) {
                params.remove(key);
            }
        }

        if let Some(redirect) = self.message_redirect(&params) {
            return Ok(Normalized::Redirect(redirected(redirect)));
        }

        canonicalize_addressing(&mut params);
        let unescaped = params.clone();
        params.map_scalars(|s| html_escape::encode_quoted_attribute(s).into_owned());

        let client = self.resolver.resolve(raw.remote_addr.as_deref(), &raw.headers);

        tracing::debug!(
            params = %params.serialize(self.separator.as_str()),
            ban_check_ip = %client.ban_check_ip,
            "Request normalized"
        );

        Ok(Normalized::Clean(CleanRequest {
            params,
            unescaped,
            requested_slug: parsed.requested_slug,
            client,
        }))
    }

    /// `action=activate%3bu=1%3bcode=x` → `action=activate;u=1;code=x`.
    fn activation_redirect(&self, query: &str) -> Option<Redirect> {
        if !query.to_ascii_lowercase().starts_with(ACTIVATION_PREFIX) {
            return None;
        }
        let decoded = query
            .replace("%3b", ";")
            .replace("%3B", ";")
            .replace("%3d", "=")
            .replace("%3D", "=");
        Some(Redirect::permanent(
            format!("{}?{}", self.base_url, decoded),
            RedirectReason::ActivationLink,
        ))
    }

    /// A request carrying only `msg=N` is sent to `topic=T.msgN#msgN`.
    fn message_redirect(&self, params: &RouteParams) -> Option<Redirect> {
        if ["action", "topic", "board", "threadid"]
            .iter()
            .any(|key| params.contains(key))
        {
            return None;
        }
        let msg = params.get_str("msg").and_then(parse_id).filter(|m| *m > 0)?;
        let topic = self.locator.as_ref()?.locate(msg)?;

        let mut rest = params.clone();
        rest.remove("msg");

        let sep = self.separator.as_str();
        let mut location = format!("{}?topic={}.msg{}", self.base_url, topic, msg);
        if !rest.is_empty() {
            location.push_str(sep);
            location.push_str(&rest.serialize_encoded(sep));
        }
        location.push_str(&format!("#msg{msg}"));

        Some(Redirect::temporary(location, RedirectReason::MessageToTopic))
    }
}

/// Applies the three id/offset encodings to `board` and `topic`, aliases
/// `threadid`, and always leaves a canonical `start`.
fn canonicalize_addressing(params: &mut RouteParams) {
    if !params.contains("topic") {
        if let Some(thread) = params.get_str("threadid").map(str::to_string) {
            params.insert("topic", thread);
        }
    }

    for key in ["board", "topic"] {
        let Some(value) = params.get_str(key).map(str::to_string) else {
            continue;
        };
        let (id, start) = split_addressing(&value);
        if let Some(start) = start {
            params.insert("start", start);
        }
        params.insert(key, leading_int(id));
    }

    let start = params.get_str("start").map(Start::parse).unwrap_or(Start::Offset(0));
    params.insert("start", start.to_string());
}

fn reject(error: RequestError) -> RequestError {
    tracing::warn!(reason = error.reason(), error = %error, "Rejecting request");
    metrics::record_rejection(error.reason());
    error
}

fn redirected(redirect: Redirect) -> Redirect {
    tracing::info!(
        location = %redirect.location,
        reason = redirect.reason.as_str(),
        "Redirecting legacy request"
    );
    metrics::record_redirect(redirect.reason.as_str());
    redirect
}
