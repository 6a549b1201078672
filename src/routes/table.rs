//! Route table
//!
//! Static, ordered mapping from path pattern to a named route and the page
//! unit that renders it. Built once, immutable afterwards.

use serde::Serialize;
use std::collections::HashMap;

use super::error::{RouteError, RouteResult};
use super::pattern::{split_path, PathPattern};
use crate::pages::PageId;

/// Version of the route set returned by [`RouteTable::canonical`]
pub const ROUTE_TABLE_VERSION: u32 = 2;

/// Page rendered for paths no route matches
pub const FALLBACK_PAGE: &str = "views/NotFound.vue";

/// The dashboard's route set: (path, name, page)
const CANONICAL_ROUTES: &[(&str, &str, &str)] = &[
    ("/", "home", "views/Home.vue"),
    ("/service", "service", "views/ServiceDashboard.vue"),
    (
        "/service/build_from_cache",
        "build_from_cache",
        "views/BuildFromCache.vue",
    ),
    (
        "/service/build_from_raw",
        "build_from_raw",
        "views/BuildFromRaw.vue",
    ),
    ("/map", "map", "views/MapView.vue"),
    ("/task-query", "task-query", "views/TaskQueryView.vue"),
    ("/rcs-web-login", "rcs-web-login", "views/RCSWebLogin.vue"),
    (
        "/exception-records",
        "exception-records",
        "views/ExceptionRecordsView.vue",
    ),
];

/// A single route: pattern, unique name, page unit
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: PathPattern,
    name: String,
    page: PageId,
}

impl RouteEntry {
    pub fn new(path: &str, name: impl Into<String>, page: impl Into<PageId>) -> RouteResult<Self> {
        Ok(Self {
            pattern: PathPattern::parse(path)?,
            name: name.into(),
            page: page.into(),
        })
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

/// A successful resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatch {
    /// Route name
    pub name: String,
    /// Pattern of the matched route
    pub pattern: String,
    /// Page unit to render
    pub page: PageId,
    /// Path relative to the base prefix, query and fragment removed
    pub path: String,
    /// Decoded path parameters
    pub params: HashMap<String, String>,
    /// Decoded query pairs in order of appearance
    pub query: Vec<(String, String)>,
    /// Fragment without the leading `#`
    pub hash: Option<String>,
}

/// Outcome of [`RouteTable::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched(RouteMatch),
    /// No route matches; the host renders the fallback page
    NotFound { path: String },
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }

    /// Name of the matched route, if any
    pub fn route_name(&self) -> Option<&str> {
        match self {
            Resolution::Matched(m) => Some(&m.name),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn into_match(self) -> Option<RouteMatch> {
        match self {
            Resolution::Matched(m) => Some(m),
            Resolution::NotFound { .. } => None,
        }
    }
}

/// Immutable, validated route table
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    by_name: HashMap<String, usize>,
    fallback: Option<PageId>,
    base: String,
    version: u32,
}

impl RouteTable {
    /// Build a table, rejecting duplicate names and overlapping patterns
    pub fn new(entries: Vec<RouteEntry>) -> RouteResult<Self> {
        let mut by_name = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if by_name.insert(entry.name.clone(), i).is_some() {
                return Err(RouteError::DuplicateName(entry.name.clone()));
            }

            for earlier in &entries[..i] {
                if earlier.pattern.as_str() == entry.pattern.as_str() {
                    return Err(RouteError::DuplicatePath(entry.path().to_string()));
                }
                if earlier.pattern.overlaps(&entry.pattern) {
                    return Err(RouteError::Ambiguous {
                        first: earlier.path().to_string(),
                        second: entry.path().to_string(),
                    });
                }
            }
        }

        Ok(Self {
            entries,
            by_name,
            fallback: None,
            base: "/".to_string(),
            version: 0,
        })
    }

    /// The dashboard's route set with its not-found page
    pub fn canonical() -> RouteResult<Self> {
        let entries = CANONICAL_ROUTES
            .iter()
            .map(|(path, name, page)| RouteEntry::new(path, *name, *page))
            .collect::<RouteResult<Vec<_>>>()?;

        Ok(Self::new(entries)?
            .with_fallback(FALLBACK_PAGE)
            .with_version(ROUTE_TABLE_VERSION))
    }

    /// Set the page rendered for unrouted paths
    pub fn with_fallback(mut self, page: impl Into<PageId>) -> Self {
        self.fallback = Some(page.into());
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Mount the table under an application base prefix such as `/console`
    pub fn with_base(mut self, base: &str) -> RouteResult<Self> {
        self.base = normalize_base(base)?;
        Ok(self)
    }

    /// Resolve a browser path (base prefix, query and fragment included)
    pub fn resolve(&self, raw: &str) -> Resolution {
        let (rest, hash) = match raw.split_once('#') {
            Some((rest, hash)) => (rest, Some(hash.to_string())),
            None => (raw, None),
        };
        let (full_path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (rest, Vec::new()),
        };

        let not_found = || Resolution::NotFound {
            path: full_path.to_string(),
        };

        let Some(path) = self.strip_base(full_path) else {
            return not_found();
        };
        if !path.starts_with('/') {
            return not_found();
        }

        let parts = split_path(path);
        for entry in &self.entries {
            if let Some(params) = entry.pattern.matches(&parts) {
                tracing::trace!(path = %path, route = %entry.name, "Route resolved");
                return Resolution::Matched(RouteMatch {
                    name: entry.name.clone(),
                    pattern: entry.path().to_string(),
                    page: entry.page.clone(),
                    path: path.to_string(),
                    params,
                    query,
                    hash,
                });
            }
        }

        tracing::debug!(path = %full_path, "Unrouted path");
        not_found()
    }

    /// Build the browser path for a named route
    pub fn href(&self, name: &str, params: &HashMap<String, String>) -> RouteResult<String> {
        let entry = self
            .get(name)
            .ok_or_else(|| RouteError::UnknownName(name.to_string()))?;
        let path = entry.pattern.build(params)?;

        if self.base == "/" {
            Ok(path)
        } else if path == "/" {
            Ok(format!("{}/", self.base))
        } else {
            Ok(format!("{}{}", self.base, path))
        }
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fallback(&self) -> Option<&PageId> {
        self.fallback.as_ref()
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn strip_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base == "/" {
            return Some(path);
        }
        let rest = path.strip_prefix(self.base.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

fn normalize_base(base: &str) -> RouteResult<String> {
    if !base.starts_with('/') {
        return Err(RouteError::InvalidBase(base.to_string()));
    }
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k), decode_component(v))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}
