//! Serializable snapshots of committed router state.
//!
//! # Responsibilities
//! - Capture the committed location, per-route model state, and the node
//!   key counter into a serde-friendly value
//! - Rehydrate a fresh router from such a value without re-running guards
//!   or lifecycle hooks
//!
//! # Design Decisions
//! - Restore re-derives route instances by matching the saved location
//!   against the static tree; with the key counter reset first, the
//!   derived instance keys line up with the captured ones
//! - A saved location that needs a dynamic loader cannot be restored
//!   synchronously and is rejected as a configuration error

use crate::errors::RouterError;
use crate::location::Location;
use crate::matching::resolver::path_from_root;
use crate::store::RouterStore;
use crate::tree::node::{NodeKeyGen, RouteNode};
use crate::tree::route::Route;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Saved per-route state, keyed by route instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSnapshot {
    pub key: String,
    pub node_key: String,
    #[serde(default)]
    pub state: Value,
}

/// A complete capture of committed router state, suitable for embedding
/// in a server-rendered page and rehydrating on the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouterSnapshot {
    pub location: Location,
    pub activated: Vec<RouteSnapshot>,
    pub next_key_counter: u64,
}

impl RouterSnapshot {
    /// Capture the currently committed state.
    pub fn capture(store: &RouterStore, keys: &NodeKeyGen) -> Self {
        let state = store.state();
        let activated = state
            .routes
            .iter()
            .map(|route| RouteSnapshot {
                key: route.key().to_string(),
                node_key: route.node().key().to_string(),
                state: route.state(),
            })
            .collect();
        Self {
            location: state.location.clone(),
            activated,
            next_key_counter: keys.value(),
        }
    }

    /// Rehydrate `store` from this snapshot against an already compiled
    /// tree. The caller must have reset the key counter beforehand so
    /// node keys (and therefore instance keys) line up.
    pub fn restore(
        &self,
        root: &Arc<RouteNode>,
        store: &RouterStore,
    ) -> Result<(), RouterError> {
        let resolution = path_from_root(root, &self.location.pathname);
        if !resolution.is_complete() {
            if resolution.loadable.is_some() {
                return Err(RouterError::Configuration(format!(
                    "cannot restore '{}': the path crosses a dynamic loader",
                    self.location.pathname
                )));
            }
            return Err(RouterError::NoMatch {
                url: self.location.href(),
            });
        }

        let routes: Vec<Arc<Route>> = resolution
            .path
            .iter()
            .map(|matched| Route::materialize(matched, &self.location))
            .collect();
        for route in &routes {
            if let Some(saved) = self.activated.iter().find(|s| s.key == route.key()) {
                route.set_state(saved.state.clone());
            } else {
                tracing::debug!(key = route.key(), "no saved state for restored route");
            }
            store.insert_route(route.clone());
        }
        store.commit(self.location.clone(), routes);
        tracing::info!(location = %self.location.href(), "state restored from snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hooks::null_context;
    use crate::config::schema::RouteConfig;
    use crate::matching::resolver::path_from_root;
    use serde_json::json;

    fn tree(configs: Vec<RouteConfig>) -> (Arc<RouteNode>, Arc<NodeKeyGen>) {
        let keys = Arc::new(NodeKeyGen::new());
        let root = RouteNode::root(&configs, null_context(), &keys);
        (root, keys)
    }

    fn commit_path(root: &Arc<RouteNode>, store: &RouterStore, href: &str) {
        let location = Location::parse(href);
        let resolution = path_from_root(root, &location.pathname);
        let routes: Vec<Arc<Route>> = resolution
            .path
            .iter()
            .map(|m| Route::materialize(m, &location))
            .collect();
        for route in &routes {
            store.insert_route(route.clone());
        }
        store.commit(location, routes);
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let configs = vec![RouteConfig::new("docs").children(vec![RouteConfig::new(":page")])];
        let (root, keys) = tree(configs.clone());
        let store = RouterStore::new(&root);
        commit_path(&root, &store, "/docs/intro");
        store.activated()[2].set_state(json!({"scroll": 120}));

        let snapshot = RouterSnapshot::capture(&store, &keys);
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: RouterSnapshot = serde_json::from_str(&encoded).unwrap();

        let fresh_keys = Arc::new(NodeKeyGen::new());
        let fresh_root = RouteNode::root(&configs, null_context(), &fresh_keys);
        let fresh_store = RouterStore::new(&fresh_root);
        fresh_keys.set(decoded.next_key_counter);
        decoded.restore(&fresh_root, &fresh_store).unwrap();

        assert_eq!(fresh_store.location().pathname, "/docs/intro");
        let restored = fresh_store.activated();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored[2].state(), json!({"scroll": 120}));
        assert_eq!(restored[2].param("page").as_deref(), Some("intro"));
    }

    #[test]
    fn test_restore_rejects_path_behind_loader() {
        let (root, _keys) = tree(vec![RouteConfig::new("lazy")
            .load_children(|| async { Ok(vec![RouteConfig::new("child")]) })]);
        let store = RouterStore::new(&root);
        let snapshot = RouterSnapshot {
            location: Location::parse("/lazy/child"),
            activated: Vec::new(),
            next_key_counter: 10,
        };
        let err = snapshot.restore(&root, &store).unwrap_err();
        assert!(matches!(err, RouterError::Configuration(_)));
    }

    #[test]
    fn test_restore_rejects_unknown_path() {
        let (root, _keys) = tree(vec![RouteConfig::new("a")]);
        let store = RouterStore::new(&root);
        let snapshot = RouterSnapshot {
            location: Location::parse("/missing"),
            activated: Vec::new(),
            next_key_counter: 5,
        };
        let err = snapshot.restore(&root, &store).unwrap_err();
        assert!(matches!(err, RouterError::NoMatch { .. }));
    }
}
