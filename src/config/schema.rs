//! Route and router configuration.
//!
//! # Responsibilities
//! - Define the `RouteConfig` input tree and the `RouterOptions` install
//!   surface
//! - Provide a fluent builder so hooks can be registered as plain closures
//!
//! # Design Decisions
//! - Builder style rather than serde structs: route configs carry closures
//!   (guards, loaders), which have no file representation
//! - Every hook setter wraps the user closure into the type-erased
//!   `Arc<dyn Fn(..) -> BoxFuture>` alias once, at registration
//! - `redirect_to` is mutually exclusive with hooks; the redirect-injection
//!   middleware synthesizes the `will_activate` hook at install time

use crate::config::hooks::{
    ContextFn, DataFn, ErrorHookFn, GuardFn, HookResult, LoadChildrenFn, SubscribeFn,
    TransitionFn, TransitionPhase,
};
use crate::errors::{HookError, RouterError};
use crate::history::HistoryAdapter;
use crate::matching::matcher::MatchKind;
use crate::middleware::Middleware;
use crate::scheduler::navigation::Navigation;
use crate::store::snapshot::RouterSnapshot;
use crate::tree::route::Route;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Configuration for a single route node.
#[derive(Clone)]
pub struct RouteConfig {
    /// Path pattern, e.g. `"a/:id"`, `""` (index) or `"**"` (catch-all).
    pub path: String,

    /// Optional stable key; generated from a counter when absent.
    pub key: Option<String>,

    /// Match type. Defaults to partial for nodes with (loadable) children,
    /// full for leaves.
    pub match_kind: Option<MatchKind>,

    /// Query parameter names this route consumes.
    pub query: Vec<String>,

    /// Statically configured children, in match order.
    pub children: Vec<RouteConfig>,

    /// Async loader for dynamic children; invoked at most once.
    pub load_children: Option<LoadChildrenFn>,

    /// Redirect target; rewritten into a `will_activate` hook at install.
    pub redirect_to: Option<String>,

    /// Default state bag for activated routes.
    pub state: Value,

    pub can_activate: Option<GuardFn>,
    pub can_deactivate: Option<GuardFn>,
    pub will_activate: Option<GuardFn>,
    pub will_deactivate: Option<GuardFn>,
    pub will_resolve: Option<GuardFn>,
    pub on_enter: Option<GuardFn>,
    pub on_exit: Option<GuardFn>,
    pub on_error: Option<ErrorHookFn>,
    pub on_transition: Option<TransitionFn>,

    /// Produces the data bag for activated routes.
    pub get_data: Option<DataFn>,

    /// Overrides the ambient context for this subtree.
    pub get_context: Option<ContextFn>,

    /// Subscription setup run per route instance; disposed on exit.
    pub subscriptions: Option<SubscribeFn>,
}

impl RouteConfig {
    /// Start a config for the given path pattern.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: None,
            match_kind: None,
            query: Vec::new(),
            children: Vec::new(),
            load_children: None,
            redirect_to: None,
            state: Value::Null,
            can_activate: None,
            can_deactivate: None,
            will_activate: None,
            will_deactivate: None,
            will_resolve: None,
            on_enter: None,
            on_exit: None,
            on_error: None,
            on_transition: None,
            get_data: None,
            get_context: None,
            subscriptions: None,
        }
    }

    /// Set an explicit stable key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Force the match type.
    pub fn match_kind(mut self, kind: MatchKind) -> Self {
        self.match_kind = Some(kind);
        self
    }

    /// Declare the query parameter names this route consumes.
    pub fn query(mut self, names: &[&str]) -> Self {
        self.query = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Attach static children.
    pub fn children(mut self, children: Vec<RouteConfig>) -> Self {
        self.children = children;
        self
    }

    /// Attach a dynamic children loader.
    pub fn load_children<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<RouteConfig>, HookError>> + Send + 'static,
    {
        self.load_children = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Redirect to `target` instead of activating this node.
    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect_to = Some(target.into());
        self
    }

    /// Set the default state bag.
    pub fn state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    pub fn can_activate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.can_activate = Some(wrap_guard(f));
        self
    }

    pub fn can_deactivate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.can_deactivate = Some(wrap_guard(f));
        self
    }

    pub fn will_activate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.will_activate = Some(wrap_guard(f));
        self
    }

    pub fn will_deactivate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.will_deactivate = Some(wrap_guard(f));
        self
    }

    pub fn will_resolve<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.will_resolve = Some(wrap_guard(f));
        self
    }

    pub fn on_enter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.on_enter = Some(wrap_guard(f));
        self
    }

    pub fn on_exit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.on_exit = Some(wrap_guard(f));
        self
    }

    /// Error handler: `Ok(())` means this node absorbs the failure.
    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Navigation, RouterError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_error = Some(Arc::new(move |nav, err| Box::pin(f(nav, err))));
        self
    }

    /// Transition callback, awaited after commit for entering/exiting
    /// instances.
    pub fn on_transition<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(TransitionPhase, Arc<Route>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_transition = Some(Arc::new(move |phase, route| Box::pin(f(phase, route))));
        self
    }

    /// Data bag producer.
    pub fn get_data<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.get_data = Some(Arc::new(f));
        self
    }

    /// Override the ambient context for this subtree.
    pub fn get_context<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.get_context = Some(Arc::new(f));
        self
    }

    /// Per-instance subscription setup; the returned disposer runs when the
    /// instance exits.
    pub fn subscriptions<F>(mut self, f: F) -> Self
    where
        F: Fn(Arc<Route>) -> crate::config::hooks::Disposer + Send + Sync + 'static,
    {
        self.subscriptions = Some(Arc::new(f));
        self
    }

    /// Effective match kind: explicit setting, else catch-all for `**`,
    /// partial for nodes that have or can load children, full for leaves.
    pub fn effective_match_kind(&self) -> MatchKind {
        if self.path == "**" {
            return MatchKind::Any;
        }
        if let Some(kind) = self.match_kind {
            return kind;
        }
        if !self.children.is_empty() || self.load_children.is_some() {
            MatchKind::Partial
        } else {
            MatchKind::Full
        }
    }
}

impl std::fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("key", &self.key)
            .field("children", &self.children.len())
            .field("load_children", &self.load_children.is_some())
            .field("redirect_to", &self.redirect_to)
            .finish_non_exhaustive()
    }
}

fn wrap_guard<F, Fut>(f: F) -> GuardFn
where
    F: Fn(Arc<Route>, Navigation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    Arc::new(move |route, nav| Box::pin(f(route, nav)))
}

/// Options passed to `install`.
pub struct RouterOptions {
    /// Top-level route configs.
    pub routes: Vec<RouteConfig>,

    /// Location-change source and sink.
    pub history: Arc<dyn HistoryAdapter>,

    /// Ambient context inherited by every node unless overridden.
    pub get_context: Option<ContextFn>,

    /// User middleware, applied after the built-in pipeline.
    pub middleware: Vec<Middleware>,

    /// Snapshot to resume from (SSR handoff).
    pub ssr: Option<RouterSnapshot>,

    /// Redirect chain bound per navigation.
    pub max_redirects: usize,
}

impl RouterOptions {
    /// Options with defaults: no context, no middleware, redirect cap 10.
    pub fn new(history: Arc<dyn HistoryAdapter>, routes: Vec<RouteConfig>) -> Self {
        Self {
            routes,
            history,
            get_context: None,
            middleware: Vec::new(),
            ssr: None,
            max_redirects: 10,
        }
    }

    pub fn get_context<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.get_context = Some(Arc::new(f));
        self
    }

    pub fn middleware(mut self, middleware: Vec<Middleware>) -> Self {
        self.middleware = middleware;
        self
    }

    pub fn ssr(mut self, snapshot: RouterSnapshot) -> Self {
        self.ssr = Some(snapshot);
        self
    }

    pub fn max_redirects(mut self, limit: usize) -> Self {
        self.max_redirects = limit;
        self
    }
}
