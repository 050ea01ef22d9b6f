//! Observable router state.
//!
//! # Data Flow
//! ```text
//! Scheduler (single control loop)
//!     → commit(location, routes): one atomic snapshot swap
//!     → watch channel notifies observers of the new snapshot
//!
//! Readers (view layer, selections, lookups)
//!     → load committed Arc<RouterState> (never partially updated)
//!     → key indexes for O(1) node / route instance lookups
//! ```
//!
//! # Design Decisions
//! - The committed snapshot lives in an `ArcSwap`: readers see either the
//!   old state or the new one, never a half-applied navigation
//! - Node and live-route indexes are `DashMap`s keyed by stable keys
//! - The cancelled-sequence watermark lets slow in-flight work detect it
//!   was superseded before committing side effects
//! - Failed navigations land in the error slot; the last known-good
//!   snapshot stays visible

pub mod snapshot;

use crate::errors::RouterError;
use crate::location::Location;
use crate::tree::node::RouteNode;
use crate::tree::route::Route;
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// The committed router state: one location plus the root-to-leaf list of
/// activated routes consistent with it.
#[derive(Debug, Clone)]
pub struct RouterState {
    pub location: Location,
    pub routes: Vec<Arc<Route>>,
}

impl RouterState {
    /// State before the first navigation commits.
    pub fn empty() -> Self {
        Self {
            location: Location::default(),
            routes: Vec::new(),
        }
    }
}

/// Mutable, observable state holder. All writes go through the scheduler
/// control loop.
pub struct RouterStore {
    state: ArcSwap<RouterState>,
    watch_tx: watch::Sender<Arc<RouterState>>,
    nodes: DashMap<String, Arc<RouteNode>>,
    parents: DashMap<String, Option<String>>,
    live_routes: DashMap<String, Arc<Route>>,
    error: Mutex<Option<RouterError>>,
    cancelled: AtomicU64,
}

impl RouterStore {
    /// Create a store and index the given tree.
    pub fn new(root: &Arc<RouteNode>) -> Self {
        let initial = Arc::new(RouterState::empty());
        let (watch_tx, _) = watch::channel(initial.clone());
        let store = Self {
            state: ArcSwap::new(initial),
            watch_tx,
            nodes: DashMap::new(),
            parents: DashMap::new(),
            live_routes: DashMap::new(),
            error: Mutex::new(None),
            cancelled: AtomicU64::new(0),
        };
        store.index_subtree(root, None);
        store
    }

    /// Register a subtree in the node index. Called at install and after
    /// every dynamic-children graft, always from the scheduler loop.
    pub fn index_subtree(&self, node: &Arc<RouteNode>, parent_key: Option<&str>) {
        self.nodes.insert(node.key().to_string(), node.clone());
        self.parents
            .insert(node.key().to_string(), parent_key.map(|k| k.to_string()));
        for child in node.children_snapshot() {
            self.index_subtree(&child, Some(node.key()));
        }
    }

    /// The committed snapshot.
    pub fn state(&self) -> Arc<RouterState> {
        self.state.load_full()
    }

    /// Committed location.
    pub fn location(&self) -> Location {
        self.state.load().location.clone()
    }

    /// Committed activated routes, root to leaf.
    pub fn activated(&self) -> Vec<Arc<Route>> {
        self.state.load().routes.clone()
    }

    /// Subscribe to committed-state changes.
    pub fn watch(&self) -> watch::Receiver<Arc<RouterState>> {
        self.watch_tx.subscribe()
    }

    /// Atomically replace location and activated routes, clear the error
    /// slot, and notify observers. The single visible mutation per
    /// navigation.
    pub fn commit(&self, location: Location, routes: Vec<Arc<Route>>) {
        let next = Arc::new(RouterState { location, routes });
        self.state.store(next.clone());
        *self.error.lock().expect("error lock poisoned") = None;
        self.watch_tx.send_replace(next);
    }

    /// Look up a tree node by key.
    pub fn get_node(&self, key: &str) -> Option<Arc<RouteNode>> {
        self.nodes.get(key).map(|entry| entry.value().clone())
    }

    /// Parent key of a node (`None` for the root, or unknown keys).
    pub fn parent_key(&self, key: &str) -> Option<String> {
        self.parents.get(key).and_then(|entry| entry.value().clone())
    }

    /// Look up a live route instance by its instance key.
    pub fn get_route(&self, key: &str) -> Option<Arc<Route>> {
        self.live_routes.get(key).map(|entry| entry.value().clone())
    }

    /// Param value visible at `node_key`: the committed route activated
    /// for that node, or the nearest ancestor that bound the param.
    pub fn get_param(&self, node_key: &str, name: &str) -> Option<String> {
        let state = self.state.load();
        let mut key = node_key.to_string();
        loop {
            let bound = state
                .routes
                .iter()
                .find(|route| route.node().key() == key)
                .and_then(|route| route.param(name));
            if bound.is_some() {
                return bound;
            }
            key = self.parent_key(&key)?;
        }
    }

    /// Retain a live route instance across navigations.
    pub fn insert_route(&self, route: Arc<Route>) {
        self.live_routes.insert(route.key().to_string(), route);
    }

    /// Drop a live route instance (after disposal).
    pub fn remove_route(&self, key: &str) {
        self.live_routes.remove(key);
    }

    /// Record a navigation failure. The committed snapshot is untouched.
    pub fn set_error(&self, error: RouterError) {
        *self.error.lock().expect("error lock poisoned") = Some(error);
    }

    /// The error recorded by the last failed navigation, if any.
    pub fn error(&self) -> Option<RouterError> {
        self.error.lock().expect("error lock poisoned").clone()
    }

    /// Raise the cancelled-sequence watermark.
    pub fn cancel_sequence(&self, sequence: u64) {
        self.cancelled.fetch_max(sequence, Ordering::SeqCst);
    }

    /// Whether the given sequence is at or below the watermark.
    pub fn is_cancelled(&self, sequence: u64) -> bool {
        sequence <= self.cancelled.load(Ordering::SeqCst)
    }
}
