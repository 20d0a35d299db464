//! Client address resolution through forwarding headers.
//!
//! # Responsibilities
//! - Walk the configured forwarding headers in priority order
//! - Gate header trust on the direct peer (allowlist or private address)
//! - Produce the ban-check address used for bans and rate limits
//!
//! # Design Decisions
//! - Chains and single values follow one rule: rightmost non-private entry
//! - Without an allowlist, only a private-looking peer is trusted
//! - The result is never used for authentication

use std::net::IpAddr;
use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderName};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::security::cidr::CidrRange;

/// Headers tried in order when the policy is `autodetect`.
pub const AUTODETECT_HEADERS: [&str; 4] = [
    "x-forwarded-for",
    "client-ip",
    "x-real-ip",
    "cf-connecting-ip",
];

static PRIVATE_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:0|10|127|255|169\.254|172\.(?:1[6-9]|2[0-9]|3[01])|192\.168)\.|unknown$|::1$|fe80:|fc[0-9a-f]{2}:|fd[0-9a-f]{2}:)",
    )
    .expect("private address pattern is valid")
});

static MAPPED_V4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^::ffff:(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})$")
        .expect("mapped address pattern is valid")
});

/// Which forwarding headers may be consulted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProxyPolicy {
    /// Never trust forwarding headers.
    #[default]
    Disabled,
    /// Try the well-known headers in order.
    Autodetect,
    /// Consult exactly one header.
    Header(String),
}

impl From<String> for ProxyPolicy {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "disabled" => ProxyPolicy::Disabled,
            "autodetect" => ProxyPolicy::Autodetect,
            _ => ProxyPolicy::Header(value.trim().to_string()),
        }
    }
}

impl From<ProxyPolicy> for String {
    fn from(policy: ProxyPolicy) -> Self {
        match policy {
            ProxyPolicy::Disabled => "disabled".to_string(),
            ProxyPolicy::Autodetect => "autodetect".to_string(),
            ProxyPolicy::Header(name) => name,
        }
    }
}

/// Outcome of address resolution for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ClientAddr {
    /// Transport peer, empty when absent or `unknown`.
    pub remote_addr: String,
    /// Best-effort client address for ban checks; empty when invalid.
    pub ban_check_ip: String,
    /// Set when the request carried no peer address at all.
    pub is_cli: bool,
}

/// Resolves `BAN_CHECK_IP` from the peer address and forwarding headers.
#[derive(Debug, Clone)]
pub struct ProxyTrustResolver {
    headers: Vec<HeaderName>,
    allowlist: Vec<CidrRange>,
}

impl ProxyTrustResolver {
    /// Create a resolver. Allowlist entries that fail to parse are dropped
    /// with a warning; config validation rejects them earlier.
    pub fn new(policy: &ProxyPolicy, allowlist: &[String]) -> Self {
        let headers = match policy {
            ProxyPolicy::Disabled => Vec::new(),
            ProxyPolicy::Autodetect => AUTODETECT_HEADERS
                .iter()
                .map(|h| HeaderName::from_static(h))
                .collect(),
            ProxyPolicy::Header(name) => match header_name(name) {
                Some(h) => vec![h],
                None => {
                    tracing::warn!(header = %name, "Ignoring invalid proxy header name");
                    Vec::new()
                }
            },
        };

        let allowlist = allowlist
            .iter()
            .filter_map(|entry| match entry.parse::<CidrRange>() {
                Ok(range) => Some(range),
                Err(e) => {
                    tracing::warn!(entry = %entry, error = %e, "Ignoring invalid allowlist entry");
                    None
                }
            })
            .collect();

        Self { headers, allowlist }
    }

    /// Resolve the client address for a request.
    pub fn resolve(&self, remote_addr: Option<&str>, headers: &HeaderMap) -> ClientAddr {
        let remote = remote_addr.map(str::trim).unwrap_or_default();
        let (remote, is_cli) = if remote.is_empty() || remote.eq_ignore_ascii_case("unknown") {
            (String::new(), true)
        } else {
            (remote.to_string(), false)
        };

        let forwarded = if self.peer_trusted(&remote) {
            self.headers.iter().find_map(|name| {
                let value = headers.get(name)?.to_str().ok()?;
                let picked = pick_forwarded(value);
                if let Some(ip) = &picked {
                    tracing::debug!(header = %name, client = %ip, peer = %remote, "Using forwarded address");
                }
                picked
            })
        } else {
            None
        };

        let candidate = forwarded.unwrap_or_else(|| remote.clone());
        let ban_check_ip = if candidate.parse::<IpAddr>().is_ok() {
            candidate
        } else {
            String::new()
        };

        ClientAddr {
            remote_addr: remote,
            ban_check_ip,
            is_cli,
        }
    }

    /// With an allowlist the peer must match it; without one, the peer must
    /// look like an internal proxy. IPv4-mapped peers are judged by their
    /// IPv4 form.
    fn peer_trusted(&self, remote: &str) -> bool {
        if self.headers.is_empty() || remote.is_empty() {
            return false;
        }
        let peer = normalize_mapped(remote);
        if self.allowlist.is_empty() {
            is_private(&peer)
        } else {
            self.allowlist.iter().any(|range| range.contains_str(&peer))
        }
    }
}

/// Returns true if the address belongs to a private, loopback or link-local
/// range (or is the literal `unknown`).
pub fn is_private(ip: &str) -> bool {
    PRIVATE_ADDR.is_match(ip.trim())
}

/// Rewrites `::ffff:a.b.c.d` to `a.b.c.d`.
pub fn normalize_mapped(ip: &str) -> String {
    let ip = ip.trim();
    match MAPPED_V4.captures(ip) {
        Some(caps) => caps[1].to_string(),
        None => ip.to_string(),
    }
}

/// Reads a forwarding header right to left and returns the first valid,
/// non-private entry.
fn pick_forwarded(value: &str) -> Option<String> {
    value
        .split(',')
        .rev()
        .map(normalize_mapped)
        .find(|ip| ip.parse::<IpAddr>().is_ok() && !is_private(ip))
}

/// Accepts `X-Forwarded-For` as well as server-variable style
/// `HTTP_X_FORWARDED_FOR`.
pub fn header_name(raw: &str) -> Option<HeaderName> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("HTTP_")
        .or_else(|| trimmed.strip_prefix("http_"))
        .unwrap_or(trimmed);
    let name = stripped.replace('_', "-").to_ascii_lowercase();
    HeaderName::from_bytes(name.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_private_detection() {
        assert!(is_private("10.1.2.3"));
        assert!(is_private("172.20.0.1"));
        assert!(!is_private("172.32.0.1"));
        assert!(is_private("192.168.0.10"));
        assert!(is_private("127.0.0.1"));
        assert!(is_private("::1"));
        assert!(is_private("fe80::1"));
        assert!(is_private("fd12:3456::1"));
        assert!(is_private("unknown"));
        assert!(!is_private("8.8.8.8"));
        assert!(!is_private("2001:db8::1"));
    }

    #[test]
    fn test_disabled_policy_ignores_headers() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Disabled, &[]);
        let addr = resolver.resolve(Some("10.0.0.2"), &headers(&[("x-forwarded-for", "8.8.8.8")]));
        assert_eq!(addr.ban_check_ip, "10.0.0.2");
        assert_eq!(addr.remote_addr, "10.0.0.2");
        assert!(!addr.is_cli);
    }

    #[test]
    fn test_autodetect_private_peer() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &[]);
        let addr = resolver.resolve(
            Some("10.0.0.2"),
            &headers(&[("x-forwarded-for", "1.1.1.1, 203.0.113.7, 192.168.1.4")]),
        );
        assert_eq!(addr.ban_check_ip, "203.0.113.7");
    }

    #[test]
    fn test_public_peer_without_allowlist_is_not_trusted() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &[]);
        let addr = resolver.resolve(Some("198.51.100.1"), &headers(&[("x-real-ip", "203.0.113.7")]));
        assert_eq!(addr.ban_check_ip, "198.51.100.1");
    }

    #[test]
    fn test_mapped_peer_is_trusted_by_ipv4_form() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &[]);
        let addr = resolver.resolve(Some("::ffff:10.0.0.5"), &headers(&[("x-forwarded-for", "203.0.113.7")]));
        assert_eq!(addr.ban_check_ip, "203.0.113.7");

        let allow = vec!["198.51.100.0/24".to_string()];
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &allow);
        let addr = resolver.resolve(Some("::ffff:198.51.100.9"), &headers(&[("x-forwarded-for", "203.0.113.7")]));
        assert_eq!(addr.ban_check_ip, "203.0.113.7");

        let addr = resolver.resolve(Some("::ffff:192.0.2.1"), &headers(&[("x-forwarded-for", "203.0.113.7")]));
        assert_eq!(addr.ban_check_ip, "::ffff:192.0.2.1");
    }

    #[test]
    fn test_allowlist_gates_headers() {
        let allow = vec!["198.51.100.0/24".to_string()];
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Header("CF-Connecting-IP".into()), &allow);

        let trusted = resolver.resolve(Some("198.51.100.1"), &headers(&[("cf-connecting-ip", "203.0.113.7")]));
        assert_eq!(trusted.ban_check_ip, "203.0.113.7");

        let untrusted = resolver.resolve(Some("10.0.0.1"), &headers(&[("cf-connecting-ip", "203.0.113.7")]));
        assert_eq!(untrusted.ban_check_ip, "10.0.0.1");
    }

    #[test]
    fn test_server_variable_header_name() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Header("HTTP_X_REAL_IP".into()), &[]);
        let addr = resolver.resolve(Some("127.0.0.1"), &headers(&[("x-real-ip", "203.0.113.9")]));
        assert_eq!(addr.ban_check_ip, "203.0.113.9");
    }

    #[test]
    fn test_mapped_addresses_are_normalized() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &[]);
        let addr = resolver.resolve(
            Some("127.0.0.1"),
            &headers(&[("x-forwarded-for", "::ffff:203.0.113.5, ::ffff:10.0.0.1")]),
        );
        assert_eq!(addr.ban_check_ip, "203.0.113.5");
    }

    #[test]
    fn test_all_private_header_is_skipped() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &[]);
        let addr = resolver.resolve(
            Some("10.0.0.2"),
            &headers(&[("x-forwarded-for", "10.0.0.9"), ("x-real-ip", "203.0.113.1")]),
        );
        assert_eq!(addr.ban_check_ip, "203.0.113.1");
    }

    #[test]
    fn test_missing_or_unknown_peer() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &[]);
        let none = resolver.resolve(None, &HeaderMap::new());
        assert!(none.is_cli);
        assert_eq!(none.remote_addr, "");
        assert_eq!(none.ban_check_ip, "");

        let unknown = resolver.resolve(Some("unknown"), &headers(&[("x-forwarded-for", "203.0.113.1")]));
        assert!(unknown.is_cli);
        assert_eq!(unknown.ban_check_ip, "");
    }

    #[test]
    fn test_invalid_peer_yields_empty_ip() {
        let resolver = ProxyTrustResolver::new(&ProxyPolicy::Disabled, &[]);
        let addr = resolver.resolve(Some("not an ip"), &HeaderMap::new());
        assert_eq!(addr.remote_addr, "not an ip");
        assert_eq!(addr.ban_check_ip, "");
    }

    #[test]
    fn test_policy_from_string() {
        assert_eq!(ProxyPolicy::from("".to_string()), ProxyPolicy::Disabled);
        assert_eq!(ProxyPolicy::from("AutoDetect".to_string()), ProxyPolicy::Autodetect);
        assert_eq!(
            ProxyPolicy::from("X-Forwarded-For".to_string()),
            ProxyPolicy::Header("X-Forwarded-For".into())
        );
    }
}
