//! Route state tree nodes.
//!
//! # Responsibilities
//! - Compile `RouteConfig` values into the immutable-shaped route tree
//! - Generate stable unique node keys from a counter
//! - Thread the ambient context function down the tree
//! - Hold the clearable dynamic-children loader slot
//!
//! # Design Decisions
//! - Nodes are shared via `Arc`; many activated routes may reference one
//!   node over time
//! - Children live behind a `RwLock` so dynamic loading can graft a subtree
//!   in place; all writes are confined to the scheduler loop
//! - Keys are counter-based (not random) so a restored snapshot reproduces
//!   identical identities

use crate::config::hooks::{
    ContextFn, DataFn, ErrorHookFn, GuardFn, LoadChildrenFn, SubscribeFn, TransitionFn,
};
use crate::config::schema::RouteConfig;
use crate::matching::matcher::PathMatcher;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Counter-based node key generator.
pub struct NodeKeyGen {
    counter: AtomicU64,
}

impl NodeKeyGen {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Next unique key, e.g. `n0`, `n1`, ...
    pub fn next(&self) -> String {
        format!("n{}", self.counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Current counter value (captured into snapshots).
    pub fn value(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Reset the counter (applied when restoring a snapshot).
    pub fn set(&self, value: u64) {
        self.counter.store(value, Ordering::SeqCst);
    }
}

impl Default for NodeKeyGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard and lifecycle hooks attached to a node. Absent hooks are treated
/// as allow/no-op by the scheduler.
#[derive(Clone, Default)]
pub struct RouteHooks {
    pub can_activate: Option<GuardFn>,
    pub can_deactivate: Option<GuardFn>,
    pub will_activate: Option<GuardFn>,
    pub will_deactivate: Option<GuardFn>,
    pub will_resolve: Option<GuardFn>,
    pub on_enter: Option<GuardFn>,
    pub on_exit: Option<GuardFn>,
    pub on_error: Option<ErrorHookFn>,
    pub on_transition: Option<TransitionFn>,
}

/// A configured route definition in the route state tree.
pub struct RouteNode {
    key: String,
    path: String,
    matcher: PathMatcher,
    query: Vec<String>,
    default_state: Value,
    hooks: RouteHooks,
    loader: Mutex<Option<LoadChildrenFn>>,
    get_context: ContextFn,
    get_data: Option<DataFn>,
    subscriptions: Option<SubscribeFn>,
    children: RwLock<Vec<Arc<RouteNode>>>,
}

impl RouteNode {
    /// Compile one config (and its subtree) into a node.
    pub fn from_config(
        config: &RouteConfig,
        inherited_context: &ContextFn,
        keys: &NodeKeyGen,
    ) -> Arc<Self> {
        let key = config.key.clone().unwrap_or_else(|| keys.next());
        let context = config
            .get_context
            .clone()
            .unwrap_or_else(|| inherited_context.clone());
        let children = config
            .children
            .iter()
            .map(|child| Self::from_config(child, &context, keys))
            .collect();
        Arc::new(Self {
            key,
            path: config.path.clone(),
            matcher: PathMatcher::new(&config.path, config.effective_match_kind()),
            query: config.query.clone(),
            default_state: config.state.clone(),
            hooks: RouteHooks {
                can_activate: config.can_activate.clone(),
                can_deactivate: config.can_deactivate.clone(),
                will_activate: config.will_activate.clone(),
                will_deactivate: config.will_deactivate.clone(),
                will_resolve: config.will_resolve.clone(),
                on_enter: config.on_enter.clone(),
                on_exit: config.on_exit.clone(),
                on_error: config.on_error.clone(),
                on_transition: config.on_transition.clone(),
            },
            loader: Mutex::new(config.load_children.clone()),
            get_context: context,
            get_data: config.get_data.clone(),
            subscriptions: config.subscriptions.clone(),
            children: RwLock::new(children),
        })
    }

    /// Build the implicit root node wrapping the top-level configs.
    pub fn root(configs: &[RouteConfig], context: ContextFn, keys: &NodeKeyGen) -> Arc<Self> {
        let key = keys.next();
        let children = configs
            .iter()
            .map(|config| Self::from_config(config, &context, keys))
            .collect();
        Arc::new(Self {
            key,
            path: String::new(),
            matcher: PathMatcher::partial(""),
            query: Vec::new(),
            default_state: Value::Null,
            hooks: RouteHooks::default(),
            loader: Mutex::new(None),
            get_context: context,
            get_data: None,
            subscriptions: None,
            children: RwLock::new(children),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    pub fn query(&self) -> &[String] {
        &self.query
    }

    pub fn default_state(&self) -> &Value {
        &self.default_state
    }

    pub fn hooks(&self) -> &RouteHooks {
        &self.hooks
    }

    pub fn get_context(&self) -> &ContextFn {
        &self.get_context
    }

    pub fn get_data(&self) -> Option<&DataFn> {
        self.get_data.as_ref()
    }

    pub fn subscriptions(&self) -> Option<&SubscribeFn> {
        self.subscriptions.as_ref()
    }

    /// Ordered children at this moment. A cheap clone of `Arc`s: callers
    /// iterate the snapshot while the loop may graft new children.
    pub fn children_snapshot(&self) -> Vec<Arc<RouteNode>> {
        self.children.read().expect("children lock poisoned").clone()
    }

    /// Whether a dynamic loader is still pending for this node.
    pub fn has_loader(&self) -> bool {
        self.loader.lock().expect("loader lock poisoned").is_some()
    }

    /// The loader, if still pending. Cleared only after a successful load
    /// so a failed load can be retried by a later navigation.
    pub fn loader(&self) -> Option<LoadChildrenFn> {
        self.loader.lock().expect("loader lock poisoned").clone()
    }

    /// Drop the loader after a successful load.
    pub fn clear_loader(&self) {
        self.loader.lock().expect("loader lock poisoned").take();
    }

    /// Compile loaded configs under this node's context and graft them in
    /// place. Returns the new children for store indexing.
    pub fn graft_children(
        self: &Arc<Self>,
        configs: &[RouteConfig],
        keys: &NodeKeyGen,
    ) -> Vec<Arc<RouteNode>> {
        let nodes: Vec<Arc<RouteNode>> = configs
            .iter()
            .map(|config| Self::from_config(config, &self.get_context, keys))
            .collect();
        *self.children.write().expect("children lock poisoned") = nodes.clone();
        nodes
    }

    /// Depth-first walk over this subtree.
    pub fn walk(self: &Arc<Self>, f: &mut impl FnMut(&Arc<RouteNode>, Option<&str>)) {
        f(self, None);
        self.walk_children(f);
    }

    fn walk_children(self: &Arc<Self>, f: &mut impl FnMut(&Arc<RouteNode>, Option<&str>)) {
        for child in self.children_snapshot() {
            f(&child, Some(self.key()));
            child.walk_children(f);
        }
    }
}

impl std::fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteNode")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("children", &self.children_snapshot().len())
            .field("loader", &self.has_loader())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hooks::null_context;

    #[test]
    fn test_keys_are_unique_and_stable() {
        let keys = NodeKeyGen::new();
        let configs = vec![
            RouteConfig::new("a").children(vec![RouteConfig::new("b")]),
            RouteConfig::new("c").key("custom"),
        ];
        let root = RouteNode::root(&configs, null_context(), &keys);

        let mut seen = Vec::new();
        root.walk(&mut |node, _| seen.push(node.key().to_string()));
        assert_eq!(seen.len(), 4);
        assert!(seen.contains(&"custom".to_string()));
        let unique: std::collections::HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), seen.len());
    }

    #[test]
    fn test_context_is_inherited_unless_overridden() {
        let keys = NodeKeyGen::new();
        let configs = vec![RouteConfig::new("a").children(vec![
            RouteConfig::new("b"),
            RouteConfig::new("c").get_context(|| serde_json::json!("local")),
        ])];
        let ambient: ContextFn = Arc::new(|| serde_json::json!("ambient"));
        let root = RouteNode::root(&configs, ambient, &keys);

        let a = root.children_snapshot()[0].clone();
        let b = a.children_snapshot()[0].clone();
        let c = a.children_snapshot()[1].clone();
        assert_eq!((b.get_context())(), serde_json::json!("ambient"));
        assert_eq!((c.get_context())(), serde_json::json!("local"));
    }

    #[test]
    fn test_graft_children_replaces_in_place() {
        let keys = NodeKeyGen::new();
        let configs = vec![RouteConfig::new("x").load_children(|| async { Ok(vec![]) })];
        let root = RouteNode::root(&configs, null_context(), &keys);
        let x = root.children_snapshot()[0].clone();

        assert!(x.has_loader());
        let added = x.graft_children(&[RouteConfig::new("c")], &keys);
        x.clear_loader();
        assert_eq!(added.len(), 1);
        assert_eq!(x.children_snapshot()[0].path(), "c");
        assert!(!x.has_loader());
    }
}
