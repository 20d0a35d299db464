//! Board/topic addressing and pagination offsets.
//!
//! Three historical encodings reach us: `id/start`, `id.start` and bare
//! `id`. The offset itself has four canonical shapes.

use std::fmt;

/// Exclusive upper bound for numeric offsets.
pub const MAX_START: u64 = (1 << 31) - 1;

/// Canonical pagination offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    /// Plain item offset.
    Offset(u64),
    /// First unread item.
    New,
    /// Page containing a given message.
    Msg(u64),
    /// First item after a timestamp.
    From(u64),
}

impl Start {
    /// Collapses any input to one of the canonical shapes. Anything
    /// unrecognized, negative or out of range becomes offset 0.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "new" {
            return Start::New;
        }
        if let Some(n) = raw.strip_prefix("msg") {
            return match parse_id(n) {
                Some(n) if n > 0 => Start::Msg(n),
                _ => Start::Offset(0),
            };
        }
        if let Some(ts) = raw.strip_prefix("from") {
            return match parse_id(ts) {
                Some(ts) if ts > 0 => Start::From(ts),
                _ => Start::Offset(0),
            };
        }
        match parse_id(raw) {
            Some(n) if n < MAX_START => Start::Offset(n),
            _ => Start::Offset(0),
        }
    }
}

impl fmt::Display for Start {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Start::Offset(n) => write!(f, "{n}"),
            Start::New => f.write_str("new"),
            Start::Msg(n) => write!(f, "msg{n}"),
            Start::From(ts) => write!(f, "from{ts}"),
        }
    }
}

/// Splits `id/start` or `id.start`. The slash form takes precedence.
pub fn split_addressing(value: &str) -> (&str, Option<&str>) {
    if let Some((id, start)) = value.split_once('/') {
        return (id, Some(start));
    }
    match value.split_once('.') {
        Some((id, start)) => (id, Some(start)),
        None => (value, None),
    }
}

/// Strict id parse: non-empty ASCII digits only.
pub fn parse_id(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Lenient integer cast: leading digits, 0 when there are none.
pub fn leading_int(s: &str) -> u64 {
    let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
