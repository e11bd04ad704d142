use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::MetaItem;
use crate::userdata::UserData;

/// The four resource kinds an addon can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Catalog,
    Stream,
    Meta,
    Subtitles,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Catalog,
        ResourceKind::Stream,
        ResourceKind::Meta,
        ResourceKind::Subtitles,
    ];

    /// First path segment of the resource routes
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Catalog => "catalog",
            ResourceKind::Stream => "stream",
            ResourceKind::Meta => "meta",
            ResourceKind::Subtitles => "subtitles",
        }
    }

    /// Key of the single-field JSON envelope wrapping a result
    pub fn envelope_key(&self) -> &'static str {
        match self {
            ResourceKind::Catalog => "metas",
            ResourceKind::Stream => "streams",
            ResourceKind::Meta => "meta",
            ResourceKind::Subtitles => "subtitles",
        }
    }

    /// Whether the kind also has a `/{type}/{id}/{extras}` route
    pub fn supports_extras(&self) -> bool {
        matches!(self, ResourceKind::Catalog | ResourceKind::Subtitles)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered multimap of extra arguments (`genre=Action&skip=100`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extra {
    pairs: Vec<(String, String)>,
}

impl Extra {
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Extra {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Per-request context handed to resource handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub kind: ResourceKind,
    /// Point in time after which the dispatcher abandons the handler
    pub deadline: Instant,
    /// Metadata looked up before a stream handler runs, when enabled
    pub meta: Option<MetaItem>,
}

impl RequestContext {
    pub fn new(kind: ResourceKind, timeout: Duration) -> Self {
        Self {
            kind,
            deadline: Instant::now() + timeout,
            meta: None,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// A parsed resource request
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub kind: ResourceKind,
    /// Media type from the path, e.g. "movie" or "series"
    pub media_type: String,
    pub id: String,
    pub extra: Extra,
    pub user_data: UserData,
}
