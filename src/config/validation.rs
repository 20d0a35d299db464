//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the base URL, proxy allowlist and header name
//! - Validate value ranges (slug length > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;
use crate::security::cidr::CidrRange;
use crate::security::proxy::{header_name, ProxyPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("site.base_url is not an absolute http(s) URL: {0}")]
    BaseUrl(String),

    #[error("site.base_url must not carry a query or fragment: {0}")]
    BaseUrlQuery(String),

    #[error("listener.bind_address is invalid: {0}")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    RequestTimeout,

    #[error("observability.metrics_address is invalid: {0}")]
    MetricsAddress(String),

    #[error("proxy.allowlist entry is invalid: {0}")]
    AllowlistEntry(String),

    #[error("proxy.policy header name is invalid: {0}")]
    HeaderName(String),

    #[error("slugs.max_length must be greater than zero")]
    SlugLength,
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.site.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::BaseUrlQuery(config.site.base_url.clone()));
            }
        }
        _ => errors.push(ValidationError::BaseUrl(config.site.base_url.clone())),
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    for entry in &config.proxy.allowlist {
        if entry.parse::<CidrRange>().is_err() {
            errors.push(ValidationError::AllowlistEntry(entry.clone()));
        }
    }

    if let ProxyPolicy::Header(name) = &config.proxy.policy {
        if header_name(name).is_none() {
            errors.push(ValidationError::HeaderName(name.clone()));
        }
    }

    if config.slugs.max_length == 0 {
        errors.push(ValidationError::SlugLength);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
