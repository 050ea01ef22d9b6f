//! Location value type and path arithmetic.
//!
//! # Responsibilities
//! - Parse an href into pathname / search / hash parts
//! - Format a location back into an href (`create_href`)
//! - Resolve relative paths (`.` / `..`) against a base directory
//!
//! # Design Decisions
//! - Plain string splitting, no full URL parser: locations are always
//!   origin-relative hrefs and never carry scheme or authority
//! - The parsed `query` map is filled by the query-parsing middleware, not
//!   here, so the raw `search` string stays the source of truth
//! - Same-target comparison uses pathname + search only; hash and state
//!   changes do not trigger a navigation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A resolved location: the target (or origin) of a navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Path portion, always with a leading slash once resolved.
    pub pathname: String,

    /// Raw query string including the leading `?` (empty when absent).
    pub search: String,

    /// Fragment including the leading `#` (empty when absent).
    pub hash: String,

    /// Parsed query parameters (populated by the query middleware).
    #[serde(default)]
    pub query: HashMap<String, String>,

    /// Opaque history state attached to this entry.
    #[serde(default)]
    pub state: Value,
}

impl Location {
    /// Parse an href like `/a/1/b?x=1#top` into its parts.
    pub fn parse(href: &str) -> Self {
        let (rest, hash) = match href.find('#') {
            Some(i) => (&href[..i], href[i..].to_string()),
            None => (href, String::new()),
        };
        let (pathname, search) = match rest.find('?') {
            Some(i) => (rest[..i].to_string(), rest[i..].to_string()),
            None => (rest.to_string(), String::new()),
        };
        Self {
            pathname,
            search,
            hash,
            query: HashMap::new(),
            state: Value::Null,
        }
    }

    /// Format this location back into an href.
    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }

    /// True when navigating to `other` would be a no-op: same pathname and
    /// same raw query string.
    pub fn same_target(&self, other: &Location) -> bool {
        self.pathname == other.pathname && self.search == other.search
    }
}

/// Build an href from a location. Exposed at the router surface.
pub fn create_href(location: &Location) -> String {
    location.href()
}

/// Resolve `path` against the directory `cwd`, collapsing `.` and `..`
/// segments. Absolute paths are only normalized; `cwd` is treated as a
/// directory, so `resolve_path("c", "/a/b")` is `/a/b/c`.
pub fn resolve_path(path: &str, cwd: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", cwd.trim_end_matches('/'), path)
    };
    normalize(&joined)
}

/// Collapse `.` and `..` segments in an absolute path.
fn normalize(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    if stack.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", stack.join("/"))
    }
}
