//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (peer address, headers):
//!     → proxy.rs (pick trusted forwarding header)
//!     → cidr.rs (allowlist containment)
//!     → ClientAddr { remote_addr, ban_check_ip }
//! ```
//!
//! # Design Decisions
//! - No trust in client input: headers count only behind a trusted peer
//! - Fail closed: unparseable addresses resolve to empty, never panic

pub mod cidr;
pub mod proxy;

pub use cidr::{ip_in_range, CidrParseError, CidrRange};
pub use proxy::{ClientAddr, ProxyPolicy, ProxyTrustResolver};
