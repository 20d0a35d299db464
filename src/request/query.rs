//! Query string parsing across the two historical separator conventions.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::RequestError;
use crate::routing::params::RouteParams;

/// Name of the runtime's global-variable bag; never a valid parameter.
const RESERVED_KEY: &str = "GLOBALS";

/// Effective argument separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Separator {
    /// `;` and `&` both separate pairs.
    #[default]
    #[serde(rename = ";")]
    Semicolon,
    /// Only `&` separates pairs.
    #[serde(rename = "&")]
    Ampersand,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Semicolon => ";",
            Separator::Ampersand => "&",
        }
    }
}

/// Parses a raw query string. Bare tokens (`&foo&`) become empty values and
/// `key[]=` pairs accumulate into lists.
pub fn parse_query(query: &str, separator: Separator) -> RouteParams {
    let mut params = RouteParams::new();
    let pieces: Vec<&str> = match separator {
        Separator::Semicolon => query.split(['&', ';']).collect(),
        Separator::Ampersand => query.split('&').collect(),
    };

    for piece in pieces.into_iter().filter(|p| !p.is_empty()) {
        for (key, value) in form_urlencoded::parse(piece.as_bytes()) {
            match list_key(&key) {
                Some(base) => params.push_list(base, value.into_owned()),
                None => {
                    params.insert(key.to_string(), value.into_owned());
                }
            }
        }
    }
    params
}

/// Rejects numeric and reserved top-level keys.
pub fn check_keys(params: &RouteParams) -> Result<(), RequestError> {
    for key in params.keys() {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RequestError::NumericKey(key.to_string()));
        }
        if key == RESERVED_KEY {
            return Err(RequestError::ReservedKey(key.to_string()));
        }
    }
    Ok(())
}

/// `name[]` or `name[sub]` → `name`.
fn list_key(key: &str) -> Option<&str> {
    let open = key.find('[')?;
    (open > 0 && key.ends_with(']')).then(|| &key[..open])
}
