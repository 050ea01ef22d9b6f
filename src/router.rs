//! Public router facade and control loop.
//!
//! # Responsibilities
//! - Compile route configs into a tree and wire up store, scheduler,
//!   event bus and history adapter (`install`)
//! - Own the single control loop task that serializes every navigation
//! - Expose the navigation API (`push`, `replace`, `go_back`) and the
//!   read-side API (selection handles, snapshots, path helpers)
//!
//! # Design Decisions
//! - All mutation funnels through one spawned task fed by an unbounded
//!   command channel; callers get a oneshot that resolves with the
//!   navigation's terminal outcome
//! - Sequence numbers are claimed at send time, so the loop can drain a
//!   burst of queued commands and short-circuit every navigation except
//!   the newest as superseded without running its pipeline
//! - External history changes arrive on a second channel as staged
//!   updates; the loop runs them as `Pop` navigations and confirms or
//!   reverts the stage depending on the outcome

use crate::config::hooks::null_context;
use crate::config::schema::RouterOptions;
use crate::config::validation;
use crate::errors::RouterError;
use crate::events::{EventBus, RouterEvent};
use crate::history::{HistoryAdapter, HistoryUpdate};
use crate::lifecycle::StopSignal;
use crate::location::{self, Location};
use crate::matching::matcher::Params;
use crate::middleware::{self, redirect};
use crate::scheduler::machine::{NavigationOutcome, Scheduler};
use crate::scheduler::navigation::{Navigation, NavigationType};
use crate::store::snapshot::RouterSnapshot;
use crate::store::{RouterState, RouterStore};
use crate::tree::node::{NodeKeyGen, RouteNode};
use crate::tree::route::Route;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{broadcast, oneshot, watch};

type Done = oneshot::Sender<Result<NavigationOutcome, RouterError>>;

enum Command {
    Navigate {
        kind: NavigationType,
        to: String,
        sequence: u64,
        done: Done,
    },
    GoBack {
        sequence: u64,
        done: Done,
    },
}

/// Compile `options` into a ready-to-start router.
///
/// Validation failures and snapshot mismatches surface here, before any
/// task is spawned.
pub fn install(options: RouterOptions) -> Result<Router, RouterError> {
    validation::validate(&options.routes)?;
    let configs = redirect::apply_redirects(options.routes);

    let keys = Arc::new(NodeKeyGen::new());
    let context = options.get_context.unwrap_or_else(null_context);
    let root = RouteNode::root(&configs, context, &keys);
    let store = Arc::new(RouterStore::new(&root));
    let events = EventBus::new(64);
    let pipeline = middleware::pipeline(options.middleware);

    if let Some(snapshot) = options.ssr {
        keys.set(snapshot.next_key_counter);
        snapshot.restore(&root, &store)?;
    }

    let scheduler = Arc::new(Scheduler::new(
        root.clone(),
        store.clone(),
        options.history.clone(),
        events.clone(),
        pipeline,
        keys.clone(),
        options.max_redirects,
    ));

    Ok(Router {
        scheduler,
        store,
        events,
        history: options.history,
        keys,
        root,
        tx: Mutex::new(None),
        stop: StopSignal::new(),
    })
}

/// The installed router. Cheap accessors read the committed state
/// directly; navigation goes through the control loop.
pub struct Router {
    scheduler: Arc<Scheduler>,
    store: Arc<RouterStore>,
    events: EventBus,
    history: Arc<dyn HistoryAdapter>,
    keys: Arc<NodeKeyGen>,
    root: Arc<RouteNode>,
    tx: Mutex<Option<UnboundedSender<Command>>>,
    stop: StopSignal,
}

impl Router {
    /// Spawn the control loop and run the initial navigation to the
    /// history adapter's current location. Resolves once that navigation
    /// settles.
    pub async fn start(&self) -> Result<NavigationOutcome, RouterError> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut slot = self.tx.lock().expect("command channel lock poisoned");
            if slot.is_some() {
                return Err(RouterError::Configuration(
                    "router already started".to_string(),
                ));
            }
            *slot = Some(tx);
        }

        let (history_tx, history_rx) = mpsc::unbounded_channel();
        self.history.listen(history_tx);

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(control_loop(
            self.scheduler.clone(),
            self.store.clone(),
            self.history.clone(),
            rx,
            history_rx,
            self.stop.subscribe(),
            ready_tx,
        ));
        ready_rx.await.map_err(|_| RouterError::Stopped)?
    }

    /// Stop the control loop. In-flight navigations resolve as stopped;
    /// the committed state stays readable.
    pub fn stop(&self) {
        self.tx
            .lock()
            .expect("command channel lock poisoned")
            .take();
        self.stop.trigger();
        tracing::info!("router stopped");
    }

    /// Navigate to `href`, pushing a history entry on commit.
    pub async fn push(&self, href: &str) -> Result<NavigationOutcome, RouterError> {
        self.navigate(NavigationType::Push, href).await
    }

    /// Navigate to `href`, replacing the current history entry on commit.
    pub async fn replace(&self, href: &str) -> Result<NavigationOutcome, RouterError> {
        self.navigate(NavigationType::Replace, href).await
    }

    /// Navigate to the previous history entry, if any.
    pub async fn go_back(&self) -> Result<NavigationOutcome, RouterError> {
        let sequence = self.scheduler.next_sequence();
        let (done, done_rx) = oneshot::channel();
        self.send(Command::GoBack { sequence, done })?;
        done_rx.await.map_err(|_| RouterError::Stopped)?
    }

    async fn navigate(
        &self,
        kind: NavigationType,
        href: &str,
    ) -> Result<NavigationOutcome, RouterError> {
        let sequence = self.scheduler.next_sequence();
        let (done, done_rx) = oneshot::channel();
        self.send(Command::Navigate {
            kind,
            to: href.to_string(),
            sequence,
            done,
        })?;
        done_rx.await.map_err(|_| RouterError::Stopped)?
    }

    fn send(&self, command: Command) -> Result<(), RouterError> {
        let tx = self
            .tx
            .lock()
            .expect("command channel lock poisoned")
            .clone()
            .ok_or(RouterError::Stopped)?;
        tx.send(command).map_err(|_| RouterError::Stopped)
    }

    /// Resolve `path` against `cwd` (treated as a directory), without
    /// navigating. With no `cwd` the committed location is used.
    pub fn resolve_path(&self, path: &str, cwd: Option<&str>) -> String {
        match cwd {
            Some(cwd) => location::resolve_path(path, cwd),
            None => location::resolve_path(path, &self.store.location().pathname),
        }
    }

    /// Canonical href for a location-like string.
    pub fn create_href(&self, href: &str) -> String {
        location::create_href(&Location::parse(href))
    }

    /// Committed location.
    pub fn location(&self) -> Location {
        self.store.location()
    }

    /// Committed route list, root first.
    pub fn activated_routes(&self) -> Vec<Arc<Route>> {
        self.store.activated()
    }

    /// Last navigation failure, cleared by the next successful commit.
    pub fn error(&self) -> Option<RouterError> {
        self.store.error()
    }

    /// Subscribe to the navigation event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.events.subscribe()
    }

    /// Handle for observing committed state changes.
    pub fn select(&self) -> Selection {
        Selection {
            rx: self.store.watch(),
        }
    }

    /// Capture the committed state for SSR handoff.
    pub fn snapshot(&self) -> RouterSnapshot {
        RouterSnapshot::capture(&self.store, &self.keys)
    }

    /// Look up a tree node by key.
    pub fn get_node(&self, key: &str) -> Option<Arc<RouteNode>> {
        self.store.get_node(key)
    }

    /// Look up a live route instance by key.
    pub fn get_route(&self, key: &str) -> Option<Arc<Route>> {
        self.store.get_route(key)
    }

    /// Param value visible at `node_key`, walking ancestors if the node
    /// itself did not bind it.
    pub fn get_param(&self, node_key: &str, name: &str) -> Option<String> {
        self.store.get_param(node_key, name)
    }

    /// The compiled tree root.
    pub fn root(&self) -> &Arc<RouteNode> {
        &self.root
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.stop.trigger();
    }
}

/// A read-side projection of one activated route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteProjection {
    pub key: String,
    pub params: Params,
    pub query: HashMap<String, String>,
}

/// Observer handle over the committed state.
///
/// `current` projects out of the latest commit; `changed` suspends until
/// the next one.
pub struct Selection {
    rx: watch::Receiver<Arc<RouterState>>,
}

impl Selection {
    /// Projection of the activated route whose node path pattern (or node
    /// key) equals `pattern`, if that node is currently active.
    pub fn current(&self, pattern: &str) -> Option<RouteProjection> {
        let state = self.rx.borrow();
        state
            .routes
            .iter()
            .find(|route| route.node().path() == pattern || route.node().key() == pattern)
            .map(|route| RouteProjection {
                key: route.key().to_string(),
                params: route.params().clone(),
                query: route.query().clone(),
            })
    }

    /// The latest committed state.
    pub fn state(&self) -> Arc<RouterState> {
        self.rx.borrow().clone()
    }

    /// Wait for the next commit and return it.
    pub async fn changed(&mut self) -> Result<Arc<RouterState>, RouterError> {
        self.rx.changed().await.map_err(|_| RouterError::Stopped)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

#[allow(clippy::too_many_arguments)]
async fn control_loop(
    scheduler: Arc<Scheduler>,
    store: Arc<RouterStore>,
    history: Arc<dyn HistoryAdapter>,
    mut rx: UnboundedReceiver<Command>,
    mut history_rx: UnboundedReceiver<HistoryUpdate>,
    mut stop: broadcast::Receiver<()>,
    ready: oneshot::Sender<Result<NavigationOutcome, RouterError>>,
) {
    // Initial navigation is externally sourced: it must not re-record the
    // entry the history adapter already holds.
    let initial = Navigation::new(
        NavigationType::Pop,
        scheduler.next_sequence(),
        None,
        Some(history.current()),
    );
    let result = scheduler.run(initial).await;
    let _ = ready.send(result);

    loop {
        tokio::select! {
            _ = stop.recv() => break,
            update = history_rx.recv() => {
                let Some(update) = update else { break };
                run_history_update(&scheduler, &store, &history, update).await;
            }
            command = rx.recv() => {
                let Some(command) = command else { break };
                let mut batch = vec![command];
                while let Ok(next) = rx.try_recv() {
                    batch.push(next);
                }
                run_batch(&scheduler, &store, &history, batch).await;
            }
        }
    }
    tracing::debug!("control loop exited");
}

/// Run a drained burst of commands. Everything except the newest
/// navigation is resolved as superseded without entering the pipeline.
async fn run_batch(
    scheduler: &Scheduler,
    store: &RouterStore,
    history: &Arc<dyn HistoryAdapter>,
    batch: Vec<Command>,
) {
    let last = batch.len() - 1;
    for (index, command) in batch.into_iter().enumerate() {
        match command {
            Command::Navigate {
                kind,
                to,
                sequence,
                done,
            } => {
                if index < last {
                    store.cancel_sequence(sequence);
                    let _ = done.send(Ok(NavigationOutcome::Superseded));
                    continue;
                }
                let nav = Navigation::new(
                    kind,
                    sequence,
                    Some(store.location()),
                    Some(Location::parse(&to)),
                );
                let _ = done.send(scheduler.run(nav).await);
            }
            Command::GoBack { sequence, done } => {
                if index < last {
                    store.cancel_sequence(sequence);
                    let _ = done.send(Ok(NavigationOutcome::Superseded));
                    continue;
                }
                let result = match history.back_target() {
                    Some(target) => {
                        let nav = Navigation::new(
                            NavigationType::GoBack,
                            sequence,
                            Some(store.location()),
                            Some(target),
                        );
                        scheduler.run(nav).await
                    }
                    None => Ok(NavigationOutcome::Cancelled {
                        reason: "no history entry to go back to".to_string(),
                    }),
                };
                let _ = done.send(result);
            }
        }
    }
}

/// Run one staged external history change as a `Pop` navigation and
/// confirm or revert the stage based on the outcome.
async fn run_history_update(
    scheduler: &Scheduler,
    store: &RouterStore,
    history: &Arc<dyn HistoryAdapter>,
    update: HistoryUpdate,
) {
    let nav = Navigation::new(
        update.kind,
        scheduler.next_sequence(),
        Some(store.location()),
        Some(update.location.clone()),
    );
    let allowed = matches!(
        scheduler.run(nav).await,
        Ok(NavigationOutcome::Completed) | Ok(NavigationOutcome::SameLocation)
    );
    if !allowed {
        tracing::debug!(token = update.token, "external history change rejected");
    }
    history.confirm(update.token, allowed);
}
