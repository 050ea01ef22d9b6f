//! Hook type aliases and outcome types.
//!
//! # Design Decisions
//! - Guards return an explicit `HookOutcome` (allow / deny / redirect /
//!   back) instead of smuggling control flow through rejected futures
//! - Hooks are type-erased `Arc<dyn Fn(..) -> BoxFuture>` values so route
//!   configs stay `Clone` and hooks can be shared across nodes
//! - No `async-trait`: plain boxed futures keep the call sites explicit

use crate::errors::{HookError, RouterError};
use crate::scheduler::navigation::Navigation;
use crate::tree::route::Route;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

/// Decision returned by guards and lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Let the navigation proceed.
    Allow,
    /// Block the navigation; it is cancelled, not failed.
    Deny,
    /// Abandon this navigation and navigate to the given href instead.
    Redirect(String),
    /// Abandon this navigation and go back one history entry.
    GoBack,
}

/// Result of a single hook invocation.
pub type HookResult = Result<HookOutcome, HookError>;

/// Boxed future returned by guards and lifecycle hooks.
pub type HookFuture = BoxFuture<'static, HookResult>;

/// Guard / lifecycle hook: receives the affected route and the in-flight
/// navigation, awaited sequentially by the scheduler.
pub type GuardFn = Arc<dyn Fn(Arc<Route>, Navigation) -> HookFuture + Send + Sync>;

/// Per-node error handler. Returning `Ok(())` means the node handles the
/// failure and the navigation commits degraded at this node.
pub type ErrorHookFn =
    Arc<dyn Fn(Navigation, RouterError) -> BoxFuture<'static, Result<(), HookError>> + Send + Sync>;

/// Phase passed to transition callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// The route is entering the active set.
    Entering,
    /// The route is leaving the active set.
    Exiting,
}

/// Transition callback run after commit for entering/exiting routes.
pub type TransitionFn =
    Arc<dyn Fn(TransitionPhase, Arc<Route>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Produces the static data bag attached to activated routes.
pub type DataFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Produces the ambient context threaded down the tree.
pub type ContextFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Cleanup handle returned by a subscription setup function.
pub type Disposer = Box<dyn FnOnce() + Send>;

/// Subscription setup invoked when a route instance enters; the returned
/// disposer runs when the instance exits.
pub type SubscribeFn = Arc<dyn Fn(Arc<Route>) -> Disposer + Send + Sync>;

/// Async loader producing the child configs of a node on first descent.
pub type LoadChildrenFn = Arc<
    dyn Fn() -> BoxFuture<'static, Result<Vec<crate::config::schema::RouteConfig>, HookError>>
        + Send
        + Sync,
>;

/// Default context: `null`.
pub fn null_context() -> ContextFn {
    Arc::new(|| Value::Null)
}
