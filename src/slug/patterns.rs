//! Canonical redirect targets per slug kind.
//!
//! A pattern is an ordered list of `param = template` pairs. Templates may
//! contain `{id}`, `{start}` or `{<request key>}`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::routing::params::RouteParams;
use crate::slug::SlugKind;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("token pattern is valid"));

/// One `param = template` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternParam {
    pub param: String,
    pub template: String,
}

impl PatternParam {
    pub fn new(param: &str, template: &str) -> Self {
        Self {
            param: param.to_string(),
            template: template.to_string(),
        }
    }
}

/// Ordered template list for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectPattern(pub Vec<PatternParam>);

impl RedirectPattern {
    /// Substitutes tokens. A parameter whose non-empty template renders to
    /// nothing is dropped; an intentionally blank template is kept.
    pub fn render(&self, id: u64, ambient: &RouteParams) -> RouteParams {
        let mut out = RouteParams::new();
        for PatternParam { param, template } in &self.0 {
            let value = TOKEN.replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "id" => id.to_string(),
                "start" => ambient.get_str("start").unwrap_or("0").to_string(),
                key => ambient.get_str(key).unwrap_or_default().to_string(),
            });
            if value.is_empty() && !template.is_empty() {
                continue;
            }
            out.insert(param.as_str(), value.into_owned());
        }
        out
    }
}

/// Patterns for every kind, defaults overridable from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPatterns(HashMap<SlugKind, RedirectPattern>);

impl Default for RedirectPatterns {
    fn default() -> Self {
        let p = |pairs: &[(&str, &str)]| {
            RedirectPattern(pairs.iter().map(|(k, v)| PatternParam::new(k, v)).collect())
        };
        Self(HashMap::from([
            (SlugKind::Board, p(&[("board", "{id}.{start}")])),
            (SlugKind::Topic, p(&[("topic", "{id}.{start}")])),
            (
                SlugKind::Member,
                p(&[("action", "profile"), ("u", "{id}"), ("area", "{area}"), ("sa", "{sa}")]),
            ),
            (
                SlugKind::Group,
                p(&[("action", "groups"), ("sa", "members"), ("group", "{id}")]),
            ),
        ]))
    }
}

impl RedirectPatterns {
    /// Defaults with `overrides` replacing whole kinds.
    pub fn with_overrides(overrides: &HashMap<SlugKind, RedirectPattern>) -> Self {
        let mut patterns = Self::default();
        for (kind, pattern) in overrides {
            patterns.0.insert(*kind, pattern.clone());
        }
        patterns
    }

    pub fn get(&self, kind: SlugKind) -> Option<&RedirectPattern> {
        self.0.get(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_pattern_uses_ambient_start() {
        let patterns = RedirectPatterns::default();
        let ambient: RouteParams = [("topic", "42"), ("start", "msg5")].into_iter().collect();
        let rendered = patterns.get(SlugKind::Topic).unwrap().render(42, &ambient);
        assert_eq!(rendered.serialize(";"), "topic=42.msg5");
    }

    #[test]
    fn test_empty_renders_are_dropped() {
        let patterns = RedirectPatterns::default();
        let ambient: RouteParams = [("area", "summary")].into_iter().collect();
        let rendered = patterns.get(SlugKind::Member).unwrap().render(5, &ambient);
        assert_eq!(rendered.serialize(";"), "action=profile;u=5;area=summary");
    }

    #[test]
    fn test_blank_template_is_kept() {
        let pattern = RedirectPattern(vec![PatternParam::new("topic", "{id}"), PatternParam::new("all", "")]);
        let rendered = pattern.render(3, &RouteParams::new());
        assert_eq!(rendered.serialize(";"), "topic=3;all=");
    }

    #[test]
    fn test_overrides_replace_kind() {
        let overrides = HashMap::from([(
            SlugKind::Board,
            RedirectPattern(vec![PatternParam::new("b", "{id}")]),
        )]);
        let patterns = RedirectPatterns::with_overrides(&overrides);
        let rendered = patterns.get(SlugKind::Board).unwrap().render(7, &RouteParams::new());
        assert_eq!(rendered.serialize(";"), "b=7");
        assert!(patterns.get(SlugKind::Topic).is_some());
    }
}
