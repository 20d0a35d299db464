//! Translator lookup and the two route directions.
//!
//! # Responsibilities
//! - Map discriminators to translators (several names may share one)
//! - Parse incoming path info into parameters
//! - Build pretty routes from parameters
//!
//! # Design Decisions
//! - Immutable after construction; extensions are supplied up front
//! - Unknown discriminators fall back to legacy formats, never errors
//! - Query-string values always beat path-derived values

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::entities::EntityTranslator;
use crate::routing::params::{RouteParams, RoutePath};
use crate::routing::translator::{ParsedRoute, Translator};
use crate::slug::SlugLookup;

/// Separator used when serializing the non-route remainder.
pub const REMAINDER_SEPARATOR: &str = ";";

/// One registration: every discriminator in `names` resolves to `translator`.
#[derive(Debug, Clone)]
pub struct ExtensionEntry {
    pub names: Vec<String>,
    pub translator: Arc<dyn Translator>,
}

impl ExtensionEntry {
    pub fn new<I, S>(names: I, translator: impl Translator + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            translator: Arc::new(translator),
        }
    }
}

/// Collects entries before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<ExtensionEntry>,
}

impl RegistryBuilder {
    /// Adds the board, topic and message translators.
    pub fn with_builtin(mut self) -> Self {
        for translator in [
            EntityTranslator::boards(),
            EntityTranslator::topics(),
            EntityTranslator::messages(),
        ] {
            self.entries.push(ExtensionEntry::new(translator.aliases(), translator));
        }
        self
    }

    pub fn register(mut self, entry: ExtensionEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Later entries override earlier ones for the same discriminator.
    pub fn extend(mut self, entries: impl IntoIterator<Item = ExtensionEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn build(self) -> Registry {
        let mut translators: HashMap<String, Arc<dyn Translator>> = HashMap::new();
        for entry in self.entries {
            for name in entry.names {
                if translators.insert(name.clone(), entry.translator.clone()).is_some() {
                    tracing::debug!(discriminator = %name, "Translator overridden by extension");
                }
            }
        }
        tracing::debug!(count = translators.len(), "Route registry built");
        Registry { translators }
    }
}

/// Immutable discriminator → translator map.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    translators: HashMap<String, Arc<dyn Translator>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with only the built-in translators.
    pub fn with_defaults() -> Self {
        Self::builder().with_builtin().build()
    }

    pub fn get(&self, discriminator: &str) -> Option<&Arc<dyn Translator>> {
        self.translators.get(discriminator)
    }

    pub fn contains(&self, discriminator: &str) -> bool {
        self.translators.contains_key(discriminator)
    }

    /// Rebuilds parameters from `path_info`, merged under `params`.
    pub fn parse_route(&self, path_info: &str, params: RouteParams) -> ParsedRoute {
        if !path_info.starts_with('/') {
            return ParsedRoute::unchanged(params);
        }

        let path = strip_pseudo_extension(path_info);
        let route = RoutePath::from_path(path);
        let Some(discriminator) = route.discriminator() else {
            return ParsedRoute::unchanged(params);
        };

        match self.translators.get(discriminator) {
            Some(translator) => {
                tracing::debug!(discriminator = %discriminator, "Parsing pretty route");
                translator.parse_route(&route, params)
            }
            None => {
                let mut params = params;
                params.merge_missing(decode_legacy(&route));
                ParsedRoute::unchanged(params)
            }
        }
    }

    /// Splits `params` into route segments and the flat remainder.
    pub fn build_parts(&self, mut params: RouteParams, slugs: &dyn SlugLookup) -> (RoutePath, RouteParams) {
        let (discriminator, from_action) = match params.get_str("action") {
            Some(action) => (Some(action.to_string()), true),
            None => (infer_discriminator(&params).map(str::to_string), false),
        };

        let translator = discriminator.as_deref().and_then(|d| self.translators.get(d));
        match translator {
            Some(translator) => {
                if from_action {
                    params.remove("action");
                }
                translator.build_route(params, slugs)
            }
            None => (RoutePath::new(), params),
        }
    }

    /// Pretty form: `/seg/seg` plus `/?k=v;k=v` when anything remains.
    /// Returns an empty string when there is nothing to encode.
    pub fn build_route(&self, params: RouteParams, slugs: &dyn SlugLookup) -> String {
        let (route, remaining) = self.build_parts(params, slugs);
        let remainder = remaining.serialize(REMAINDER_SEPARATOR);

        match (route.is_empty(), remainder.is_empty()) {
            (true, true) => String::new(),
            (true, false) => format!("/?{remainder}"),
            (false, true) => format!("/{}", route.join()),
            (false, false) => format!("/{}/?{}", route.join(), remainder),
        }
    }
}

fn infer_discriminator(params: &RouteParams) -> Option<&'static str> {
    if params.contains("topic") {
        Some("topics")
    } else if params.contains("board") {
        Some("boards")
    } else if params.contains("msg") {
        Some("msgs")
    } else {
        None
    }
}

fn strip_pseudo_extension(path: &str) -> &str {
    path.strip_suffix(".html")
        .or_else(|| path.strip_suffix(".htm"))
        .unwrap_or(path)
}

/// Decodes pre-registry queryless URLs such as `/board,2.0/` or
/// `/topic,5.msg9/&wap2`: each segment is `key,value` or a bare key.
pub fn decode_legacy(route: &RoutePath) -> RouteParams {
    let mut params = RouteParams::new();
    for segment in route.segments() {
        let segment = segment.trim_start_matches('&');
        if segment.is_empty() {
            continue;
        }
        match segment.split_once(',') {
            Some((key, value)) if !key.is_empty() => {
                params.insert(key, value);
            }
            Some(_) => {}
            None => {
                params.insert(segment, "");
            }
        }
    }
    params
}
