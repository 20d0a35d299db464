//! Ordered request parameters and route paths.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Characters left untouched when encoding values for a `Location` header.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',')
    .remove(b'/')
    .remove(b':');

/// A parameter value: a scalar, or a list built from `key[]=` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// The scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Scalar(s) => Some(s),
            ParamValue::List(_) => None,
        }
    }

    /// Applies `f` to every scalar, descending into lists.
    pub fn map_scalars(&mut self, f: &impl Fn(&str) -> String) {
        match self {
            ParamValue::Scalar(s) => *s = f(s),
            ParamValue::List(items) => items.iter_mut().for_each(|item| item.map_scalars(f)),
        }
    }

    fn is_empty_scalar(&self) -> bool {
        matches!(self, ParamValue::Scalar(s) if s.is_empty())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Scalar(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Scalar(s.to_string())
    }
}

impl From<u64> for ParamValue {
    fn from(n: u64) -> Self {
        ParamValue::Scalar(n.to_string())
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Scalar(s) => serializer.serialize_str(s),
            ParamValue::List(items) => items.serialize(serializer),
        }
    }
}

/// Insertion-ordered, string-keyed parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    entries: Vec<(String, ParamValue)>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Scalar value for `key`; lists read as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// True when `key` is absent or holds an empty scalar.
    pub fn is_blank(&self, key: &str) -> bool {
        self.get(key).map(ParamValue::is_empty_scalar).unwrap_or(true)
    }

    /// Inserts or replaces in place, keeping the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Appends to a list value, turning a scalar into a one-element list.
    pub fn push_list(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, ParamValue::List(items))) => items.push(value),
            Some((_, slot)) => {
                let previous = std::mem::replace(slot, ParamValue::List(Vec::new()));
                *slot = ParamValue::List(vec![previous, value]);
            }
            None => self.entries.push((key, ParamValue::List(vec![value]))),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Adds every entry of `fallback` whose key is not already present.
    /// Existing values win.
    pub fn merge_missing(&mut self, fallback: RouteParams) {
        for (key, value) in fallback.entries {
            if !self.contains(&key) {
                self.entries.push((key, value));
            }
        }
    }

    /// Applies `f` to every scalar value, recursively.
    pub fn map_scalars(&mut self, f: impl Fn(&str) -> String) {
        for (_, value) in self.entries.iter_mut() {
            value.map_scalars(&f);
        }
    }

    /// `key=value` pairs joined by `separator`, values written verbatim.
    pub fn serialize(&self, separator: &str) -> String {
        self.pairs(false).join(separator)
    }

    /// Like [`RouteParams::serialize`], with keys and values percent-encoded.
    pub fn serialize_encoded(&self, separator: &str) -> String {
        self.pairs(true).join(separator)
    }

    fn pairs(&self, encode: bool) -> Vec<String> {
        let enc = |s: &str| -> String {
            if encode {
                utf8_percent_encode(s, QUERY_VALUE).to_string()
            } else {
                s.to_string()
            }
        };

        let mut out = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                ParamValue::Scalar(s) => out.push(format!("{}={}", enc(key), enc(s))),
                ParamValue::List(items) => {
                    for item in items.iter().filter_map(ParamValue::as_str) {
                        out.push(format!("{}[]={}", enc(key), enc(item)));
                    }
                }
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = RouteParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Serialize for RouteParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Ordered path segments; segment 0 is the discriminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePath(Vec<String>);

impl RoutePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Segments after the discriminator.
    pub fn rest(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits a `/`-separated path, dropping empty segments at either edge.
    /// Each segment is percent-decoded after splitting, so `%2F` stays
    /// inside its segment.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Self::default();
        }
        Self(
            trimmed
                .split('/')
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
                .collect(),
        )
    }

    /// Segments joined with `/`, without a leading slash.
    pub fn join(&self) -> String {
        self.0.join("/")
    }
}

impl<S: Into<String>> FromIterator<S> for RoutePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut params: RouteParams = [("a", "1"), ("b", "2")].into_iter().collect();
        params.insert("a", "3");
        assert_eq!(params.serialize(";"), "a=3;b=2");
    }

    #[test]
    fn test_merge_missing_prefers_existing() {
        let mut query: RouteParams = [("start", "20")].into_iter().collect();
        let path: RouteParams = [("topic", "42"), ("start", "0")].into_iter().collect();
        query.merge_missing(path);
        assert_eq!(query.get_str("start"), Some("20"));
        assert_eq!(query.get_str("topic"), Some("42"));
    }

    #[test]
    fn test_lists_serialize_with_brackets() {
        let mut params = RouteParams::new();
        params.push_list("ids", "1");
        params.push_list("ids", "2");
        assert_eq!(params.serialize("&"), "ids[]=1&ids[]=2");
        assert_eq!(params.get_str("ids"), None);
    }

    #[test]
    fn test_encoded_serialization() {
        let params: RouteParams = [("q", "a b&c"), ("topic", "9.msg77")].into_iter().collect();
        assert_eq!(params.serialize_encoded(";"), "q=a%20b%26c;topic=9.msg77");
    }

    #[test]
    fn test_route_path_edges() {
        let path = RoutePath::from_path("/topics/42.slug/");
        assert_eq!(path.discriminator(), Some("topics"));
        assert_eq!(path.rest(), ["42.slug".to_string()]);
        assert!(RoutePath::from_path("/").is_empty());
    }

    #[test]
    fn test_route_path_decodes_segments() {
        let path = RoutePath::from_path("/topics/42.%E6%97%A5%E6%9C%AC-caf%C3%A9/a%2Fb");
        assert_eq!(path.rest(), ["42.日本-café".to_string(), "a/b".to_string()]);
    }
}
