//! CIDR containment checks for IPv4 and IPv6.
//!
//! # Responsibilities
//! - Parse allowlist entries (`10.0.0.0/8`, `2001:db8::/32`, bare addresses)
//! - Test whether an address falls inside a range
//!
//! # Design Decisions
//! - Parse failures are a non-match, never a panic
//! - Mixed families never match, except IPv4-mapped IPv6 against IPv4 ranges
//! - IPv6 masks are assembled nibble by nibble

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

/// Nibble masks for a prefix remainder of 0..=3 bits.
const NIBBLE_MASKS: [char; 4] = ['0', '8', 'c', 'e'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrParseError {
    #[error("invalid address in range: {0}")]
    Address(String),

    #[error("invalid prefix length: {0}")]
    Prefix(String),
}

/// A parsed address range. A bare address is a /32 or /128 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidrRange {
    V4 { network: u32, prefix: u8 },
    V6 { network: u128, prefix: u8 },
}

impl CidrRange {
    /// Returns true if `ip` lies inside this range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (*self, ip) {
            (CidrRange::V4 { network, prefix }, IpAddr::V4(v4)) => v4_contains(network, prefix, v4),
            (CidrRange::V4 { network, prefix }, IpAddr::V6(v6)) => v6
                .to_ipv4_mapped()
                .map(|v4| v4_contains(network, prefix, v4))
                .unwrap_or(false),
            (CidrRange::V6 { network, prefix }, IpAddr::V6(v6)) => {
                let mask = v6_mask(prefix);
                (u128::from(v6) & mask) == (network & mask)
            }
            (CidrRange::V6 { .. }, IpAddr::V4(_)) => false,
        }
    }

    /// Convenience wrapper taking the address as text.
    pub fn contains_str(&self, ip: &str) -> bool {
        ip.trim()
            .parse::<IpAddr>()
            .map(|addr| self.contains(addr))
            .unwrap_or(false)
    }
}

impl FromStr for CidrRange {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let ip: IpAddr = addr
            .parse()
            .map_err(|_| CidrParseError::Address(addr.to_string()))?;

        let max = if ip.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(p) => p
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= max)
                .ok_or_else(|| CidrParseError::Prefix(p.to_string()))?,
            None => max,
        };

        Ok(match ip {
            IpAddr::V4(v4) => CidrRange::V4 { network: u32::from(v4), prefix },
            IpAddr::V6(v6) => CidrRange::V6 { network: u128::from(v6), prefix },
        })
    }
}

impl std::fmt::Display for CidrRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CidrRange::V4 { network, prefix } => write!(f, "{}/{}", Ipv4Addr::from(*network), prefix),
            CidrRange::V6 { network, prefix } => write!(f, "{}/{}", Ipv6Addr::from(*network), prefix),
        }
    }
}

/// Returns true if `ip` matches `range` (exact address or CIDR notation).
/// Anything unparseable is a non-match.
pub fn ip_in_range(ip: &str, range: &str) -> bool {
    range
        .parse::<CidrRange>()
        .map(|r| r.contains_str(ip))
        .unwrap_or(false)
}

fn v4_contains(network: u32, prefix: u8, ip: Ipv4Addr) -> bool {
    let host_bits = 32 - u32::from(prefix);
    let host_mask = if host_bits == 32 { u32::MAX } else { (1u32 << host_bits) - 1 };
    (u32::from(ip) & !host_mask) == network
}

/// Builds the 128-bit mask for `prefix`: full `f` nibbles, one partial
/// nibble for the remainder, zero padding up to 32 nibbles.
fn v6_mask(prefix: u8) -> u128 {
    let prefix = prefix.min(128) as usize;
    let mut hex = "f".repeat(prefix / 4);
    if hex.len() < 32 {
        hex.push(NIBBLE_MASKS[prefix % 4]);
    }
    while hex.len() < 32 {
        hex.push('0');
    }
    u128::from_str_radix(&hex, 16).unwrap_or(0)
}
