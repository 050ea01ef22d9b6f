//! Activated route instances.
//!
//! # Responsibilities
//! - Materialize a matched node into a per-navigation `Route` value
//! - Derive the instance key (node key + matched URL + declared query) so
//!   the same path and params reuse the same identity across navigations
//! - Own per-instance subscriptions and dispose them on deactivation
//!
//! # Design Decisions
//! - A `Route` references its node, it does not own it: many instances may
//!   point at one node over time
//! - `data`/`context` refresh on merge while `state` survives, so reused
//!   instances keep identity-sensitive values across param-neutral commits
//! - Query is filtered to the names the node declares

use crate::config::hooks::Disposer;
use crate::location::Location;
use crate::matching::matcher::Params;
use crate::matching::resolver::MatchedNode;
use crate::tree::node::RouteNode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A materialized activation of a route node.
pub struct Route {
    key: String,
    node: Arc<RouteNode>,
    params: Params,
    query: HashMap<String, String>,
    parent_url: String,
    segment: String,
    data: Mutex<Value>,
    context: Mutex<Value>,
    state: Mutex<Value>,
    disposers: Mutex<Vec<Disposer>>,
}

impl Route {
    /// Materialize a matched node against the navigation target location.
    pub fn materialize(matched: &MatchedNode, location: &Location) -> Arc<Self> {
        let node = matched.node.clone();
        let query: HashMap<String, String> = node
            .query()
            .iter()
            .filter_map(|name| {
                location
                    .query
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect();
        let key = derive_key(
            node.key(),
            &format!("{}{}", matched.parent_url, matched.segment),
            &query,
        );
        let data = node
            .get_data()
            .map(|get| get())
            .unwrap_or(Value::Null);
        let context = (node.get_context())();
        let state = node.default_state().clone();
        Arc::new(Self {
            key,
            node,
            params: matched.params.clone(),
            query,
            parent_url: matched.parent_url.clone(),
            segment: matched.segment.clone(),
            data: Mutex::new(data),
            context: Mutex::new(context),
            state: Mutex::new(state),
            disposers: Mutex::new(Vec::new()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn node(&self) -> &Arc<RouteNode> {
        &self.node
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A single param value, flattened.
    pub fn param(&self, name: &str) -> Option<String> {
        self.params.get(name).and_then(|v| v.clone())
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn parent_url(&self) -> &str {
        &self.parent_url
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Full URL consumed up to and including this route.
    pub fn url(&self) -> String {
        format!("{}{}", self.parent_url, self.segment)
    }

    pub fn data(&self) -> Value {
        self.data.lock().expect("data lock poisoned").clone()
    }

    pub fn context(&self) -> Value {
        self.context.lock().expect("context lock poisoned").clone()
    }

    pub fn state(&self) -> Value {
        self.state.lock().expect("state lock poisoned").clone()
    }

    /// Replace the mutable state bag.
    pub fn set_state(&self, state: Value) {
        *self.state.lock().expect("state lock poisoned") = state;
    }

    /// Refresh data/context from a freshly materialized instance with the
    /// same key. State and subscriptions survive the merge.
    pub fn merge_from(&self, fresh: &Route) {
        debug_assert_eq!(self.key, fresh.key);
        *self.data.lock().expect("data lock poisoned") = fresh.data();
        *self.context.lock().expect("context lock poisoned") = fresh.context();
    }

    /// Run the node's subscription setup for this instance, retaining the
    /// disposer until deactivation.
    pub fn activate_subscriptions(self: &Arc<Self>) {
        if let Some(subscribe) = self.node.subscriptions() {
            let disposer = subscribe(self.clone());
            self.disposers
                .lock()
                .expect("disposer lock poisoned")
                .push(disposer);
        }
    }

    /// Dispose all subscriptions held by this instance.
    pub fn dispose(&self) {
        let disposers: Vec<Disposer> = self
            .disposers
            .lock()
            .expect("disposer lock poisoned")
            .drain(..)
            .collect();
        for disposer in disposers {
            disposer();
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("key", &self.key)
            .field("node", &self.node.path())
            .field("segment", &self.segment)
            .field("params", &self.params)
            .finish()
    }
}

/// Instance key: node key + full matched URL + canonical declared query.
/// Including the ancestor URL means a param change anywhere on the path
/// gives descendants fresh instances too.
fn derive_key(node_key: &str, url: &str, query: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    if pairs.is_empty() {
        format!("{node_key}@{url}")
    } else {
        format!("{node_key}@{url}?{}", pairs.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hooks::null_context;
    use crate::config::schema::RouteConfig;
    use crate::matching::resolver::path_from_root;
    use crate::tree::node::NodeKeyGen;

    fn matched(config: RouteConfig, url: &str) -> MatchedNode {
        let root = RouteNode::root(&[config], null_context(), &NodeKeyGen::new());
        path_from_root(&root, url).path.into_iter().nth(1).unwrap()
    }

    fn location(href: &str, query: &[(&str, &str)]) -> Location {
        let mut loc = Location::parse(href);
        loc.query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        loc
    }

    #[test]
    fn test_key_stable_for_same_target() {
        let config = RouteConfig::new("a/:id").query(&["page"]);
        let loc = location("/a/1?page=2", &[("page", "2"), ("ignored", "x")]);
        let r1 = Route::materialize(&matched(config.clone(), "/a/1"), &loc);
        let r2 = Route::materialize(&matched(config.clone(), "/a/1"), &loc);
        assert_eq!(r1.key(), r2.key());
        assert_eq!(r1.query().len(), 1);
        assert_eq!(r1.query()["page"], "2");

        let r3 = Route::materialize(&matched(config, "/a/2"), &loc);
        assert_ne!(r1.key(), r3.key());
    }

    #[test]
    fn test_merge_keeps_state_refreshes_data() {
        let config = RouteConfig::new("a").get_data(|| serde_json::json!({"v": 1}));
        let loc = location("/a", &[]);
        let live = Route::materialize(&matched(config.clone(), "/a"), &loc);
        live.set_state(serde_json::json!({"dirty": true}));

        let fresh = Route::materialize(&matched(config, "/a"), &loc);
        live.merge_from(&fresh);
        assert_eq!(live.state(), serde_json::json!({"dirty": true}));
        assert_eq!(live.data(), serde_json::json!({"v": 1}));
    }

    #[test]
    fn test_subscriptions_dispose_once() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let disposed = Arc::new(AtomicU32::new(0));
        let counter = disposed.clone();
        let config = RouteConfig::new("a").subscriptions(move |_route| {
            let counter = counter.clone();
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });
        let route = Route::materialize(&matched(config, "/a"), &location("/a", &[]));
        route.activate_subscriptions();
        route.dispose();
        route.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }
}
