//! Route tree descent.
//!
//! # Responsibilities
//! - Resolve a URL to an ordered root-to-leaf list of matched nodes
//! - Report exhaustion at a node with a pending dynamic loader so the
//!   scheduler can load and retry
//!
//! # Design Decisions
//! - Children are tried in declared order, catch-all (`**`) siblings last;
//!   first match wins
//! - No backtracking across siblings once a child matches and its subtree
//!   exhausts (single match per level)
//! - Resolution itself is synchronous; the async loader retry loop lives in
//!   the scheduler, keeping tree reads free of await points

use crate::matching::matcher::{MatchKind, MatchOutcome, Params};
use crate::tree::node::RouteNode;
use std::sync::Arc;

/// One step of a resolved path: a node plus what it matched.
#[derive(Debug, Clone)]
pub struct MatchedNode {
    pub node: Arc<RouteNode>,
    pub params: Params,
    /// URL consumed by ancestors of this node.
    pub parent_url: String,
    /// Fragment this node consumed.
    pub segment: String,
    /// Leftover after this node (consumed by descendants on a full match).
    pub remaining: String,
}

/// Result of a tree descent.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Matched nodes, root first.
    pub path: Vec<MatchedNode>,
    /// URL left over after the deepest matched node.
    pub remaining: String,
    /// Deepest matched node with a pending loader, when the remainder could
    /// not be consumed. The scheduler loads its children and retries.
    pub loadable: Option<Arc<RouteNode>>,
}

impl Resolution {
    /// Whether the URL was fully consumed.
    pub fn is_complete(&self) -> bool {
        is_consumed(&self.remaining)
    }
}

/// A remainder of `""` or `"/"` counts as consumed.
pub fn is_consumed(remaining: &str) -> bool {
    remaining.is_empty() || remaining == "/"
}

/// Depth-first match of `url` from `root`. Never invokes loaders; when the
/// descent exhausts at a node that still has one, it is reported via
/// `loadable`.
pub fn path_from_root(root: &Arc<RouteNode>, url: &str) -> Resolution {
    let outcome = root.matcher().match_against("", url);
    if !outcome.matched {
        return Resolution {
            path: Vec::new(),
            remaining: url.to_string(),
            loadable: None,
        };
    }
    let mut path = Vec::new();
    let (remaining, loadable) = descend(root, outcome, &mut path);
    Resolution {
        path,
        remaining,
        loadable,
    }
}

fn descend(
    node: &Arc<RouteNode>,
    outcome: MatchOutcome,
    path: &mut Vec<MatchedNode>,
) -> (String, Option<Arc<RouteNode>>) {
    let child_parent_url = format!("{}{}", outcome.parent_url, outcome.segment);
    let remaining = outcome.remaining.clone();
    path.push(MatchedNode {
        node: node.clone(),
        params: outcome.params.unwrap_or_default(),
        parent_url: outcome.parent_url,
        segment: outcome.segment,
        remaining: remaining.clone(),
    });

    let children = node.children_snapshot();
    // Specific patterns first, catch-all fallbacks second.
    for pass in [false, true] {
        for child in &children {
            let is_any = child.matcher().kind() == MatchKind::Any;
            if is_any != pass {
                continue;
            }
            let child_outcome = child.matcher().match_against(&child_parent_url, &remaining);
            if child_outcome.matched {
                return descend(child, child_outcome, path);
            }
        }
    }

    if !is_consumed(&remaining) && node.has_loader() {
        return (remaining, Some(node.clone()));
    }
    (remaining, None)
}
