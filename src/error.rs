//! Request-level errors.

use thiserror::Error;

/// Protocol violations that terminate a request with 400. These are never
/// recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("numeric top-level parameter name: {0}")]
    NumericKey(String),

    #[error("reserved top-level parameter name: {0}")]
    ReservedKey(String),

    #[error("query string must not begin with a URL")]
    UrlInQuery,
}

impl RequestError {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            RequestError::NumericKey(_) => "numeric_key",
            RequestError::ReservedKey(_) => "reserved_key",
            RequestError::UrlInQuery => "url_in_query",
        }
    }
}
