//! Built-in translators for boards, topics and messages.
//!
//! Path forms:
//! ```text
//! /boards/{id}[.{slug}][/{start}]
//! /topics/{id}[.{slug}][/{start}]
//! /msgs/{id}
//! ```

use crate::request::addressing::{parse_id, split_addressing};
use crate::routing::params::{RouteParams, RoutePath};
use crate::routing::translator::{ParsedRoute, Translator};
use crate::slug::{id_segment, RequestedSlug, SlugKind, SlugLookup};

/// Translator for an entity addressed by a numeric id, optionally decorated
/// with a slug and followed by a pagination segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTranslator {
    discriminator: &'static str,
    param: &'static str,
    kind: Option<SlugKind>,
    paginated: bool,
}

impl EntityTranslator {
    pub const fn boards() -> Self {
        Self {
            discriminator: "boards",
            param: "board",
            kind: Some(SlugKind::Board),
            paginated: true,
        }
    }

    pub const fn topics() -> Self {
        Self {
            discriminator: "topics",
            param: "topic",
            kind: Some(SlugKind::Topic),
            paginated: true,
        }
    }

    pub const fn messages() -> Self {
        Self {
            discriminator: "msgs",
            param: "msg",
            kind: None,
            paginated: false,
        }
    }

    /// Plural discriminator plus the singular parameter name.
    pub fn aliases(&self) -> Vec<String> {
        vec![self.discriminator.to_string(), self.param.to_string()]
    }
}

impl Translator for EntityTranslator {
    fn build_route(&self, mut params: RouteParams, slugs: &dyn SlugLookup) -> (RoutePath, RouteParams) {
        let Some(raw) = params.get_str(self.param).map(str::to_string) else {
            return (RoutePath::new(), params);
        };
        let (id_part, embedded_start) = split_addressing(&raw);
        let Some(id) = parse_id(id_part) else {
            return (RoutePath::new(), params);
        };
        params.remove(self.param);

        let slug = self
            .kind
            .and_then(|kind| slugs.lookup(kind, id))
            .unwrap_or_default();

        let mut route = RoutePath::new();
        route.push(self.discriminator);
        route.push(id_segment(id, &slug));

        if self.paginated {
            let start = match embedded_start {
                Some(start) => Some(start.to_string()),
                None => match params.get_str("start").map(str::to_string) {
                    Some(start) => {
                        params.remove("start");
                        Some(start)
                    }
                    None => None,
                },
            };
            if let Some(start) = start.filter(|s| !s.is_empty() && s != "0") {
                route.push(start);
            }
        }

        (route, params)
    }

    fn parse_route(&self, route: &RoutePath, mut params: RouteParams) -> ParsedRoute {
        let rest = route.rest();
        let Some(first) = rest.first() else {
            return ParsedRoute::unchanged(params);
        };
        let (id_part, slug) = first.split_once('.').unwrap_or((first.as_str(), ""));
        let Some(id) = parse_id(id_part) else {
            tracing::debug!(segment = %first, discriminator = self.discriminator, "Unparseable id segment");
            return ParsedRoute::unchanged(params);
        };

        let mut derived = RouteParams::new();
        derived.insert(self.param, id);
        if self.paginated {
            if let Some(start) = rest.get(1).filter(|s| !s.is_empty()) {
                derived.insert("start", start.as_str());
            }
        }
        params.merge_missing(derived);

        let requested_slug = match self.kind {
            Some(kind) if !slug.is_empty() => Some(RequestedSlug {
                kind,
                id,
                value: slug.to_string(),
            }),
            _ => None,
        };

        ParsedRoute {
            params,
            requested_slug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::NoSlugs;

    struct OneSlug;

    impl SlugLookup for OneSlug {
        fn lookup(&self, kind: SlugKind, id: u64) -> Option<String> {
            (kind == SlugKind::Topic && id == 42).then(|| "my-great-topic".to_string())
        }
    }

    #[test]
    fn test_topic_build_with_slug_and_start() {
        let params: RouteParams = [("topic", "42.20"), ("sort", "asc")].into_iter().collect();
        let (route, rest) = EntityTranslator::topics().build_route(params, &OneSlug);
        assert_eq!(route.join(), "topics/42.my-great-topic/20");
        assert_eq!(rest.serialize(";"), "sort=asc");
    }

    #[test]
    fn test_topic_build_separate_start() {
        let params: RouteParams = [("topic", "7"), ("start", "0")].into_iter().collect();
        let (route, rest) = EntityTranslator::topics().build_route(params, &NoSlugs);
        assert_eq!(route.join(), "topics/7");
        assert!(rest.is_empty());
    }

    #[test]
    fn test_non_numeric_id_is_left_alone() {
        let params: RouteParams = [("board", "abc")].into_iter().collect();
        let (route, rest) = EntityTranslator::boards().build_route(params.clone(), &NoSlugs);
        assert!(route.is_empty());
        assert_eq!(rest, params);
    }

    #[test]
    fn test_topic_parse_records_requested_slug() {
        let route = RoutePath::from_path("/topics/42.my-great-topic/msg5");
        let parsed = EntityTranslator::topics().parse_route(&route, RouteParams::new());
        assert_eq!(parsed.params.get_str("topic"), Some("42"));
        assert_eq!(parsed.params.get_str("start"), Some("msg5"));
        assert_eq!(
            parsed.requested_slug,
            Some(RequestedSlug {
                kind: SlugKind::Topic,
                id: 42,
                value: "my-great-topic".into()
            })
        );
    }

    #[test]
    fn test_query_values_win() {
        let route = RoutePath::from_path("/boards/3/40");
        let query: RouteParams = [("start", "80")].into_iter().collect();
        let parsed = EntityTranslator::boards().parse_route(&route, query);
        assert_eq!(parsed.params.get_str("board"), Some("3"));
        assert_eq!(parsed.params.get_str("start"), Some("80"));
    }

    #[test]
    fn test_message_route() {
        let params: RouteParams = [("msg", "77")].into_iter().collect();
        let (route, _) = EntityTranslator::messages().build_route(params, &NoSlugs);
        assert_eq!(route.join(), "msgs/77");
        let parsed = EntityTranslator::messages().parse_route(&route, RouteParams::new());
        assert_eq!(parsed.params.get_str("msg"), Some("77"));
        assert!(parsed.requested_slug.is_none());
    }
}
