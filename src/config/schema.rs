//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::query::Separator;
use crate::security::proxy::ProxyPolicy;
use crate::slug::{RedirectPattern, RedirectPatterns, SlugKind, SlugMode, SlugOptions, DEFAULT_MAX_LENGTH};

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, timeout).
    pub listener: ListenerConfig,

    /// Forum site settings.
    pub site: SiteConfig,

    /// Forwarding header trust.
    pub proxy: ProxyConfig,

    /// Slug generation settings.
    pub slugs: SlugConfig,

    /// Cache lifetimes.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Site-wide URL settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute URL of the forum entry script.
    pub base_url: String,

    /// `;` accepts both separators, `&` only ampersands.
    pub argument_separator: Separator,

    /// Rewrite outgoing links to pretty routes.
    pub pretty_urls: bool,

    /// Whether the server passes path info through. Off means only `?`
    /// routes are emitted.
    pub path_info_supported: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/index.php".to_string(),
            argument_separator: Separator::Semicolon,
            pretty_urls: true,
            path_info_supported: true,
        }
    }
}

/// Reverse proxy trust settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// `disabled`, `autodetect` or a header name.
    pub policy: ProxyPolicy,

    /// Trusted proxy addresses or CIDR ranges.
    pub allowlist: Vec<String>,
}

/// Slug generation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlugConfig {
    pub mode: SlugMode,

    /// Maximum slug length in characters.
    pub max_length: usize,

    /// Words shorter than this are dropped.
    pub min_word_length: usize,

    pub stopwords: Vec<String>,

    /// Per-kind overrides of the canonical redirect targets.
    pub redirect_patterns: HashMap<SlugKind, RedirectPattern>,
}

impl Default for SlugConfig {
    fn default() -> Self {
        Self {
            mode: SlugMode::Ascii,
            max_length: DEFAULT_MAX_LENGTH,
            min_word_length: 2,
            stopwords: Vec::new(),
            redirect_patterns: HashMap::new(),
        }
    }
}

impl SlugConfig {
    pub fn options(&self) -> Arc<SlugOptions> {
        Arc::new(
            SlugOptions {
                mode: self.mode,
                max_length: self.max_length,
                min_word_length: self.min_word_length,
                ..SlugOptions::default()
            }
            .with_stopwords(&self.stopwords),
        )
    }

    pub fn patterns(&self) -> Arc<RedirectPatterns> {
        Arc::new(RedirectPatterns::with_overrides(&self.redirect_patterns))
    }
}

/// Cache lifetimes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of cached message → topic lookups in seconds.
    pub msg_topic_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { msg_topic_ttl_secs: 120 }
    }
}

impl CacheConfig {
    pub fn msg_topic_ttl(&self) -> Duration {
        Duration::from_secs(self.msg_topic_ttl_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
