//! Slug subsystem.
//!
//! # Data Flow
//! ```text
//! Entity title + (kind, id)
//!     → generator.rs (request cache → external cache → compute)
//!     → clean.rs (decode, tokenize, stopwords, ASCII/Unicode folding, truncate)
//!     → patterns.rs (canonical redirect when the requested slug differs)
//! ```
//!
//! # Design Decisions
//! - Slugs are computed once and then reused verbatim, so shared links stay
//!   stable across title edits until the cache entry is invalidated
//! - At most one requested slug per request
//! - An empty slug is valid and means "bare id"

pub mod clean;
pub mod generator;
pub mod patterns;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{slug_key, Cache};

pub use clean::{clean_title, SlugOptions};
pub use generator::{SlugOutcome, Slugger};
pub use patterns::{PatternParam, RedirectPattern, RedirectPatterns};

/// Default maximum slug length in codepoints.
pub const DEFAULT_MAX_LENGTH: usize = 30;

/// Entity kinds that carry slugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugKind {
    Board,
    Topic,
    Member,
    Group,
}

impl SlugKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlugKind::Board => "board",
            SlugKind::Topic => "topic",
            SlugKind::Member => "member",
            SlugKind::Group => "group",
        }
    }
}

impl fmt::Display for SlugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SlugKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "board" => Ok(SlugKind::Board),
            "topic" => Ok(SlugKind::Topic),
            "member" => Ok(SlugKind::Member),
            "group" => Ok(SlugKind::Group),
            other => Err(format!("unknown slug kind: {other}")),
        }
    }
}

/// Text folding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Transliterate to ASCII.
    #[default]
    Ascii,
    /// Keep letters and numbers from every script.
    Unicode,
}

/// A resolved slug for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slug {
    pub kind: SlugKind,
    pub id: u64,
    pub value: String,
}

impl Slug {
    /// Path segment for this entity: `{id}` or `{id}.{slug}`.
    pub fn segment(&self) -> String {
        id_segment(self.id, &self.value)
    }
}

/// The slug segment found in the incoming path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestedSlug {
    pub kind: SlugKind,
    pub id: u64,
    pub value: String,
}

/// Read-only slug access used while building routes.
pub trait SlugLookup {
    fn lookup(&self, kind: SlugKind, id: u64) -> Option<String>;
}

/// Lookup that never knows a slug; routes carry bare ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlugs;

impl SlugLookup for NoSlugs {
    fn lookup(&self, _kind: SlugKind, _id: u64) -> Option<String> {
        None
    }
}

/// Lookup backed only by the external cache.
pub struct CachedSlugs<'a>(pub &'a dyn Cache);

impl SlugLookup for CachedSlugs<'_> {
    fn lookup(&self, kind: SlugKind, id: u64) -> Option<String> {
        self.0.get(&slug_key(kind, id)).filter(|s| !s.is_empty())
    }
}

pub(crate) fn id_segment(id: u64, slug: &str) -> String {
    if slug.is_empty() {
        id.to_string()
    } else {
        format!("{id}.{slug}")
    }
}
