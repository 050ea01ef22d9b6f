//! The navigation pipeline.
//!
//! # States
//! Conceptually each navigation moves through:
//! ```text
//! IDLE → MATCHING → (CHILDREN_LOADING)* → GUARDS_DEACTIVATE
//!      → GUARDS_ACTIVATE → LIFECYCLE_WILL_DEACTIVATE
//!      → LIFECYCLE_WILL_ACTIVATE → RESOLVING → COMMIT
//!      → TRANSITIONING → END
//! ```
//! with ERROR / CANCELLED reachable from every step. The states are the
//! sequential awaits of `attempt`, not an explicit enum.
//!
//! # Design Decisions
//! - Hooks run as an awaited for-loop in a fixed order: deactivate
//!   bottom-up before activate top-down, so ordering is deterministic
//! - Staleness is checked after every suspension point: a newer scheduled
//!   sequence or a raised cancel watermark abandons the attempt before it
//!   can clobber a faster successor
//! - Redirect and back decisions surface as values (`Attempt::Redirect`),
//!   never as errors; the outer loop re-enters matching with the new
//!   target, bounded by `max_redirects`
//! - Commit is one store call; nothing after it can fail the navigation

use crate::config::hooks::{GuardFn, HookOutcome, TransitionPhase};
use crate::config::validation;
use crate::errors::{MiddlewareError, RouterError};
use crate::events::{EventBus, RouterEvent};
use crate::history::HistoryAdapter;
use crate::location::Location;
use crate::matching::resolver::{path_from_root, Resolution};
use crate::middleware::{redirect, Middleware};
use crate::scheduler::diff::{diff_routes, RouteDiff};
use crate::scheduler::navigation::{Navigation, NavigationType};
use crate::store::RouterStore;
use crate::tree::node::{NodeKeyGen, RouteHooks, RouteNode};
use crate::tree::route::Route;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Terminal result of a navigation chain, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The navigation (or a redirect it chained into) committed.
    Completed,
    /// The target equals the committed location; nothing happened.
    SameLocation,
    /// A newer navigation was scheduled before this one committed.
    Superseded,
    /// A guard or lifecycle hook blocked the transition.
    Cancelled { reason: String },
}

/// Result of a single attempt inside the redirect loop.
enum Attempt {
    Committed,
    NoTarget,
    SameLocation,
    Superseded,
    Blocked { phase: String, path: String },
    Redirect(Navigation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
    CanDeactivate,
    CanActivate,
    WillDeactivate,
    WillActivate,
    WillResolve,
    OnEnter,
    OnExit,
}

impl HookKind {
    fn select(self, hooks: &RouteHooks) -> Option<GuardFn> {
        match self {
            HookKind::CanDeactivate => hooks.can_deactivate.clone(),
            HookKind::CanActivate => hooks.can_activate.clone(),
            HookKind::WillDeactivate => hooks.will_deactivate.clone(),
            HookKind::WillActivate => hooks.will_activate.clone(),
            HookKind::WillResolve => hooks.will_resolve.clone(),
            HookKind::OnEnter => hooks.on_enter.clone(),
            HookKind::OnExit => hooks.on_exit.clone(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            HookKind::CanDeactivate => "can_deactivate",
            HookKind::CanActivate => "can_activate",
            HookKind::WillDeactivate => "will_deactivate",
            HookKind::WillActivate => "will_activate",
            HookKind::WillResolve => "will_resolve",
            HookKind::OnEnter => "on_enter",
            HookKind::OnExit => "on_exit",
        }
    }
}

/// The navigation state machine. One instance per router; all tree and
/// store mutation funnels through its (externally serialized) `run` calls.
pub struct Scheduler {
    root: Arc<RouteNode>,
    store: Arc<RouterStore>,
    history: Arc<dyn HistoryAdapter>,
    events: EventBus,
    middleware: Middleware,
    keys: Arc<NodeKeyGen>,
    scheduled: AtomicU64,
    max_redirects: usize,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        root: Arc<RouteNode>,
        store: Arc<RouterStore>,
        history: Arc<dyn HistoryAdapter>,
        events: EventBus,
        middleware: Middleware,
        keys: Arc<NodeKeyGen>,
        max_redirects: usize,
    ) -> Self {
        Self {
            root,
            store,
            history,
            events,
            middleware,
            keys,
            scheduled: AtomicU64::new(0),
            max_redirects,
        }
    }

    /// Claim the next sequence number. Called at schedule time (including
    /// for redirect follow-ups) so staleness is detectable mid-flight.
    pub fn next_sequence(&self) -> u64 {
        self.scheduled.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_stale(&self, nav: &Navigation) -> bool {
        self.scheduled.load(Ordering::SeqCst) > nav.sequence
            || self.store.is_cancelled(nav.sequence)
    }

    /// Process one navigation chain to its terminal outcome, following
    /// redirects up to the configured bound.
    pub async fn run(&self, nav: Navigation) -> Result<NavigationOutcome, RouterError> {
        let mut nav = nav;
        let mut redirects = 0usize;
        loop {
            match self.attempt(nav.clone()).await {
                Ok(Attempt::Committed) => {
                    self.emit(RouterEvent::NavigationEnd { navigation: nav });
                    return Ok(NavigationOutcome::Completed);
                }
                Ok(Attempt::NoTarget) | Ok(Attempt::SameLocation) => {
                    return Ok(NavigationOutcome::SameLocation);
                }
                Ok(Attempt::Superseded) => {
                    tracing::debug!(sequence = nav.sequence, "navigation superseded");
                    self.emit(RouterEvent::NavigationCancelled {
                        navigation: nav,
                        reason: "superseded by a newer navigation".into(),
                    });
                    return Ok(NavigationOutcome::Superseded);
                }
                Ok(Attempt::Blocked { phase, path }) => {
                    self.store.cancel_sequence(nav.sequence);
                    let failure = RouterError::TransitionFailure { phase, path };
                    let reason = failure.to_string();
                    tracing::debug!(sequence = nav.sequence, %reason, "navigation blocked");
                    self.emit(RouterEvent::NavigationCancelled {
                        navigation: nav,
                        reason: reason.clone(),
                    });
                    return Ok(NavigationOutcome::Cancelled { reason });
                }
                Ok(Attempt::Redirect(next)) => {
                    redirects += 1;
                    if redirects > self.max_redirects {
                        let url = next
                            .to
                            .as_ref()
                            .map(|l| l.href())
                            .unwrap_or_default();
                        let err = RouterError::TooManyRedirects {
                            limit: self.max_redirects,
                            url,
                        };
                        self.store.set_error(err.clone());
                        self.emit(RouterEvent::NavigationError {
                            navigation: nav,
                            error: err.to_string(),
                        });
                        return Err(err);
                    }
                    self.store.cancel_sequence(nav.sequence);
                    tracing::debug!(
                        from_sequence = nav.sequence,
                        to_sequence = next.sequence,
                        "navigation redirected"
                    );
                    nav = next;
                }
                Err(err) => {
                    tracing::warn!(sequence = nav.sequence, error = %err, "navigation failed");
                    self.store.set_error(err.clone());
                    self.emit(RouterEvent::NavigationError {
                        navigation: nav,
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, nav: Navigation) -> Result<Attempt, RouterError> {
        // Middleware may rewrite the navigation (query parsing, relative
        // path resolution, user transforms) before anything observes it.
        let event = self
            .middleware
            .apply(RouterEvent::NavigationStart { navigation: nav })?;
        let nav = match &event {
            RouterEvent::NavigationStart { navigation } => navigation.clone(),
            _ => {
                return Err(RouterError::Middleware(MiddlewareError::new(
                    "pipeline",
                    "navigation start event was replaced by middleware",
                )))
            }
        };
        let Some(to) = nav.to.clone() else {
            return Ok(Attempt::NoTarget);
        };
        if to.same_target(&self.store.location()) {
            return Ok(Attempt::SameLocation);
        }
        self.events.emit(event);

        // MATCHING, looping through dynamic child loads.
        let resolution = self.resolve_with_loading(&to).await?;
        if self.is_stale(&nav) {
            return Ok(Attempt::Superseded);
        }

        if !resolution.is_complete() && !self.recover_with_on_error(&resolution, &nav).await {
            return Err(RouterError::NoMatch { url: to.href() });
        }

        // Materialize the next route list. Live instances are reused and
        // refreshed only at commit time, so a navigation rejected by a
        // guard leaves the committed routes' data and context untouched.
        let fresh_routes: Vec<Arc<Route>> = resolution
            .path
            .iter()
            .map(|matched| Route::materialize(matched, &to))
            .collect();
        let current = self.store.activated();
        let diff = diff_routes(&current, &fresh_routes);

        // Guards: deactivate bottom-up, activate top-down.
        let bottom_up = |routes: &[Arc<Route>]| {
            routes.iter().rev().cloned().collect::<Vec<_>>()
        };
        let phases: [(HookKind, Vec<Arc<Route>>); 5] = [
            (HookKind::CanDeactivate, bottom_up(&diff.deactivating)),
            (HookKind::CanActivate, diff.activating.clone()),
            (HookKind::WillDeactivate, bottom_up(&diff.deactivating)),
            (HookKind::WillActivate, diff.activating.clone()),
            (HookKind::WillResolve, diff.entering.clone()),
        ];
        for (kind, routes) in phases {
            if let Some(attempt) = self.run_guard_phase(kind, &routes, &nav).await? {
                return Ok(attempt);
            }
        }

        if self.is_stale(&nav) {
            return Ok(Attempt::Superseded);
        }

        // Exiting instances: notify, then tear down subscriptions.
        self.run_notify_phase(HookKind::OnExit, &bottom_up(&diff.exiting), &nav)
            .await;
        for route in &diff.exiting {
            route.dispose();
            self.store.remove_route(route.key());
        }

        // COMMIT: the single visible store mutation for this navigation.
        // Retained instances keep their identity (merge refreshes the
        // data/context bags) so identity-sensitive state survives
        // param-neutral commits.
        let next_routes: Vec<Arc<Route>> = fresh_routes
            .into_iter()
            .map(|fresh| match self.store.get_route(fresh.key()) {
                Some(live) => {
                    live.merge_from(&fresh);
                    live
                }
                None => fresh,
            })
            .collect();
        for route in &next_routes {
            self.store.insert_route(route.clone());
        }
        self.store.commit(to.clone(), next_routes.clone());
        tracing::info!(
            sequence = nav.sequence,
            location = %to.href(),
            routes = next_routes.len(),
            "navigation committed"
        );

        match nav.kind {
            NavigationType::Push | NavigationType::Replace | NavigationType::GoBack => {
                self.history.record(&to, nav.kind);
            }
            // External changes move their own stack via the confirm flow.
            NavigationType::Pop => {}
        }

        for route in &diff.entering {
            route.activate_subscriptions();
        }
        self.run_notify_phase(HookKind::OnEnter, &diff.entering, &nav)
            .await;

        if nav.should_transition {
            self.run_transitions(&diff).await;
        }

        Ok(Attempt::Committed)
    }

    /// Resolve the target, expanding dynamic children as descent exhausts.
    async fn resolve_with_loading(&self, to: &Location) -> Result<Resolution, RouterError> {
        loop {
            let resolution = path_from_root(&self.root, &to.pathname);
            let Some(node) = resolution.loadable.clone() else {
                return Ok(resolution);
            };
            let Some(loader) = node.loader() else {
                return Ok(resolution);
            };
            tracing::debug!(node = node.path(), "loading dynamic children");
            let configs = loader().await.map_err(|e| RouterError::LoaderFailed {
                path: node.path().to_string(),
                message: e.message,
            })?;
            validation::validate(&configs)?;
            let configs = redirect::apply_redirects(configs);
            let added = node.graft_children(&configs, &self.keys);
            // Cleared only after success; a failed load stays retryable.
            node.clear_loader();
            for child in &added {
                self.store.index_subtree(child, Some(node.key()));
            }
        }
    }

    /// Walk the matched partial path deepest-first, offering each node's
    /// `on_error` a chance to absorb the failure. Returns whether one did.
    async fn recover_with_on_error(&self, resolution: &Resolution, nav: &Navigation) -> bool {
        let err = RouterError::NoMatch {
            url: nav.to.as_ref().map(|l| l.href()).unwrap_or_default(),
        };
        for matched in resolution.path.iter().rev() {
            let Some(handler) = matched.node.hooks().on_error.clone() else {
                continue;
            };
            match handler(nav.clone(), err.clone()).await {
                Ok(()) => {
                    tracing::warn!(
                        node = matched.node.path(),
                        url = %err,
                        "match failure absorbed; committing degraded path"
                    );
                    return true;
                }
                Err(hook_err) => {
                    tracing::debug!(
                        node = matched.node.path(),
                        error = %hook_err,
                        "on_error handler declined"
                    );
                }
            }
        }
        false
    }

    /// Sequentially await one guard kind over an ordered route list.
    /// `Some(attempt)` aborts the pipeline.
    async fn run_guard_phase(
        &self,
        kind: HookKind,
        routes: &[Arc<Route>],
        nav: &Navigation,
    ) -> Result<Option<Attempt>, RouterError> {
        for route in routes {
            let Some(hook) = kind.select(route.node().hooks()) else {
                continue;
            };
            tracing::trace!(hook = kind.name(), route = route.node().path(), "running hook");
            match hook(route.clone(), nav.clone()).await {
                Ok(HookOutcome::Allow) => {}
                Ok(HookOutcome::Deny) => {
                    return Ok(Some(Attempt::Blocked {
                        phase: kind.name().to_string(),
                        path: route.node().path().to_string(),
                    }));
                }
                Ok(HookOutcome::Redirect(href)) => {
                    return Ok(Some(Attempt::Redirect(
                        nav.redirect_to(&href, self.next_sequence()),
                    )));
                }
                Ok(HookOutcome::GoBack) => {
                    return Ok(Some(match self.history.back_target() {
                        Some(target) => {
                            Attempt::Redirect(nav.back_to(target, self.next_sequence()))
                        }
                        None => {
                            tracing::debug!(
                                route = route.node().path(),
                                "hook requested back with no history entry"
                            );
                            Attempt::Blocked {
                                phase: kind.name().to_string(),
                                path: route.node().path().to_string(),
                            }
                        }
                    }));
                }
                Err(err) => return Err(RouterError::Hook(err)),
            }
            if self.is_stale(nav) {
                return Ok(Some(Attempt::Superseded));
            }
        }
        Ok(None)
    }

    /// Post-decision notification hooks: outcomes are ignored, failures
    /// logged. The commit is (or is about to be) visible either way.
    async fn run_notify_phase(&self, kind: HookKind, routes: &[Arc<Route>], nav: &Navigation) {
        for route in routes {
            let Some(hook) = kind.select(route.node().hooks()) else {
                continue;
            };
            if let Err(err) = hook(route.clone(), nav.clone()).await {
                tracing::warn!(
                    hook = kind.name(),
                    route = route.node().path(),
                    error = %err,
                    "notification hook failed"
                );
            }
        }
    }

    /// Await transition callbacks for exiting (bottom-up) then entering
    /// (top-down) instances, bracketed by transition events.
    async fn run_transitions(&self, diff: &RouteDiff) {
        let mut keys: Vec<String> = Vec::new();
        for route in diff.exiting.iter().rev().chain(diff.entering.iter()) {
            if route.node().hooks().on_transition.is_some() {
                keys.push(route.key().to_string());
            }
        }
        if keys.is_empty() {
            return;
        }
        self.emit(RouterEvent::TransitionStart {
            routes: keys.clone(),
        });
        for route in diff.exiting.iter().rev() {
            if let Some(transition) = route.node().hooks().on_transition.clone() {
                transition(TransitionPhase::Exiting, route.clone()).await;
            }
        }
        for route in &diff.entering {
            if let Some(transition) = route.node().hooks().on_transition.clone() {
                transition(TransitionPhase::Entering, route.clone()).await;
            }
        }
        self.emit(RouterEvent::TransitionEnd { routes: keys });
    }

    /// Emit through middleware; a middleware failure degrades to a
    /// `NAVIGATION_ERROR` event instead of crashing the loop.
    fn emit(&self, event: RouterEvent) {
        let navigation = event.navigation().cloned();
        match self.middleware.apply(event) {
            Ok(transformed) => self.events.emit(transformed),
            Err(err) => {
                tracing::warn!(middleware = %err.name, error = %err, "event middleware failed");
                if let Some(navigation) = navigation {
                    self.events.emit(RouterEvent::NavigationError {
                        navigation,
                        error: err.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hooks::null_context;
    use crate::config::schema::RouteConfig;
    use crate::history::MemoryHistory;
    use crate::middleware;

    fn scheduler_for(configs: Vec<RouteConfig>) -> Scheduler {
        let keys = Arc::new(NodeKeyGen::new());
        let configs = redirect::apply_redirects(configs);
        let root = RouteNode::root(&configs, null_context(), &keys);
        let store = Arc::new(RouterStore::new(&root));
        Scheduler::new(
            root,
            store,
            Arc::new(MemoryHistory::new("/")),
            EventBus::new(16),
            middleware::pipeline(Vec::new()),
            keys,
            10,
        )
    }

    fn push(scheduler: &Scheduler, href: &str) -> Navigation {
        Navigation::new(
            NavigationType::Push,
            scheduler.next_sequence(),
            Some(scheduler.store.location()),
            Some(Location::parse(href)),
        )
    }

    #[tokio::test]
    async fn test_commit_updates_store() {
        let scheduler =
            scheduler_for(vec![
                RouteConfig::new("a/:id").children(vec![RouteConfig::new("b")])
            ]);
        let nav = push(&scheduler, "/a/1/b");
        let outcome = scheduler.run(nav).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::Completed);
        assert_eq!(scheduler.store.location().pathname, "/a/1/b");
        let activated = scheduler.store.activated();
        let paths: Vec<String> = activated
            .iter()
            .map(|r| r.node().path().to_string())
            .collect();
        assert_eq!(paths, vec!["", "a/:id", "b"]);
        // Params bind on the segment that matched them, not on descendants.
        assert_eq!(activated[1].param("id").as_deref(), Some("1"));
        assert!(activated[2].params().is_empty());
    }

    #[tokio::test]
    async fn test_denied_navigation_keeps_committed_route_data() {
        let version = Arc::new(AtomicU64::new(0));
        let data_version = version.clone();
        let scheduler = scheduler_for(vec![RouteConfig::new("a")
            .get_data(move || {
                serde_json::json!({ "v": data_version.fetch_add(1, Ordering::SeqCst) })
            })
            .children(vec![
                RouteConfig::new("locked").can_activate(|_, _| async { Ok(HookOutcome::Deny) })
            ])]);
        scheduler.run(push(&scheduler, "/a")).await.unwrap();
        let before = scheduler.store.activated().last().unwrap().data();

        let outcome = scheduler.run(push(&scheduler, "/a/locked")).await.unwrap();
        assert!(matches!(outcome, NavigationOutcome::Cancelled { .. }));

        // The rejected navigation must not have refreshed the committed
        // route's data bag.
        let after = scheduler.store.activated().last().unwrap().data();
        assert_eq!(scheduler.store.location().pathname, "/a");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_no_match_leaves_state_untouched() {
        let scheduler = scheduler_for(vec![RouteConfig::new("a")]);
        scheduler.run(push(&scheduler, "/a")).await.unwrap();

        let err = scheduler
            .run(push(&scheduler, "/missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoMatch { .. }));
        assert_eq!(scheduler.store.location().pathname, "/a");
        assert!(scheduler.store.error().is_some());
    }

    #[tokio::test]
    async fn test_same_location_is_noop() {
        let scheduler = scheduler_for(vec![RouteConfig::new("a")]);
        scheduler.run(push(&scheduler, "/a")).await.unwrap();
        let outcome = scheduler.run(push(&scheduler, "/a")).await.unwrap();
        assert_eq!(outcome, NavigationOutcome::SameLocation);
    }
}
