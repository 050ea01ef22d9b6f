//! Active-set diffing between two navigations.
//!
//! # Responsibilities
//! - Compute activating/deactivating sets by node identity
//! - Compute entering/exiting sets by route-instance identity
//!
//! # Design Decisions
//! - Two granularities on purpose: a param change keeps the node activated
//!   (no guard re-run) while the instance exits and re-enters, restarting
//!   per-param-value subscriptions
//! - Lists preserve root-to-leaf order; callers reverse for bottom-up
//!   phases

use crate::tree::route::Route;
use std::collections::HashSet;
use std::sync::Arc;

/// The four change sets between the current and next activated lists.
#[derive(Debug, Default)]
pub struct RouteDiff {
    /// Next routes whose node was not active before (root to leaf).
    pub activating: Vec<Arc<Route>>,
    /// Current routes whose node is no longer active (root to leaf).
    pub deactivating: Vec<Arc<Route>>,
    /// Next instances not live before — includes param/query changes on a
    /// still-activated node (root to leaf).
    pub entering: Vec<Arc<Route>>,
    /// Current instances no longer live (root to leaf).
    pub exiting: Vec<Arc<Route>>,
}

/// Diff the committed route list against the next one.
pub fn diff_routes(current: &[Arc<Route>], next: &[Arc<Route>]) -> RouteDiff {
    let current_nodes: HashSet<&str> = current.iter().map(|r| r.node().key()).collect();
    let next_nodes: HashSet<&str> = next.iter().map(|r| r.node().key()).collect();
    let current_keys: HashSet<&str> = current.iter().map(|r| r.key()).collect();
    let next_keys: HashSet<&str> = next.iter().map(|r| r.key()).collect();

    RouteDiff {
        activating: next
            .iter()
            .filter(|r| !current_nodes.contains(r.node().key()))
            .cloned()
            .collect(),
        deactivating: current
            .iter()
            .filter(|r| !next_nodes.contains(r.node().key()))
            .cloned()
            .collect(),
        entering: next
            .iter()
            .filter(|r| !current_keys.contains(r.key()))
            .cloned()
            .collect(),
        exiting: current
            .iter()
            .filter(|r| !next_keys.contains(r.key()))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hooks::null_context;
    use crate::config::schema::RouteConfig;
    use crate::location::Location;
    use crate::matching::resolver::path_from_root;
    use crate::tree::node::{NodeKeyGen, RouteNode};

    fn routes_for(root: &Arc<RouteNode>, url: &str) -> Vec<Arc<Route>> {
        path_from_root(root, url)
            .path
            .iter()
            .map(|m| Route::materialize(m, &Location::parse(url)))
            .collect()
    }

    fn tree() -> Arc<RouteNode> {
        RouteNode::root(
            &[
                RouteConfig::new("a/:id").children(vec![RouteConfig::new("b")]),
                RouteConfig::new("c"),
            ],
            null_context(),
            &NodeKeyGen::new(),
        )
    }

    #[test]
    fn test_disjoint_paths_swap_whole_branches() {
        let root = tree();
        let current = routes_for(&root, "/a/1/b");
        let next = routes_for(&root, "/c");

        let diff = diff_routes(&current, &next);
        // Root stays; a/:id + b deactivate; c activates.
        let deactivating: Vec<&str> =
            diff.deactivating.iter().map(|r| r.node().path()).collect();
        assert_eq!(deactivating, vec!["a/:id", "b"]);
        let activating: Vec<&str> = diff.activating.iter().map(|r| r.node().path()).collect();
        assert_eq!(activating, vec!["c"]);
    }

    #[test]
    fn test_param_change_enters_without_activating() {
        let root = tree();
        let current = routes_for(&root, "/a/1/b");
        let next = routes_for(&root, "/a/2/b");

        let diff = diff_routes(&current, &next);
        assert!(diff.activating.is_empty());
        assert!(diff.deactivating.is_empty());
        // a/:id and its child instance keys both change with the segment.
        let entering: Vec<&str> = diff.entering.iter().map(|r| r.node().path()).collect();
        assert_eq!(entering, vec!["a/:id", "b"]);
        assert_eq!(diff.exiting.len(), 2);
    }

    #[test]
    fn test_identical_paths_diff_empty() {
        let root = tree();
        let current = routes_for(&root, "/a/1/b");
        let next = routes_for(&root, "/a/1/b");
        let diff = diff_routes(&current, &next);
        assert!(diff.activating.is_empty());
        assert!(diff.deactivating.is_empty());
        assert!(diff.entering.is_empty());
        assert!(diff.exiting.is_empty());
    }
}
