//! Navigation event bus.
//!
//! # Responsibilities
//! - Define the per-navigation events observers can subscribe to
//! - Fan events out to any number of subscribers
//!
//! # Design Decisions
//! - Backed by a tokio broadcast channel; lagging subscribers drop old
//!   events instead of blocking the scheduler loop
//! - Every event carries the owning `Navigation` so observers can correlate
//!   chains by sequence number

use crate::scheduler::navigation::Navigation;
use tokio::sync::broadcast;

/// Events emitted by the scheduler over the lifetime of a navigation.
#[derive(Debug, Clone)]
pub enum RouterEvent {
    /// A navigation entered the pipeline (after middleware rewriting).
    NavigationStart { navigation: Navigation },

    /// A navigation committed successfully.
    NavigationEnd { navigation: Navigation },

    /// A navigation was cancelled: a guard denied it, a redirect replaced
    /// it, or a newer navigation superseded it.
    NavigationCancelled { navigation: Navigation, reason: String },

    /// A navigation failed; the previously committed state is untouched.
    NavigationError { navigation: Navigation, error: String },

    /// Transition callbacks for the listed route keys are about to run.
    TransitionStart { routes: Vec<String> },

    /// Transition callbacks for the listed route keys finished.
    TransitionEnd { routes: Vec<String> },
}

impl RouterEvent {
    /// The navigation this event belongs to, when it carries one.
    pub fn navigation(&self) -> Option<&Navigation> {
        match self {
            RouterEvent::NavigationStart { navigation }
            | RouterEvent::NavigationEnd { navigation }
            | RouterEvent::NavigationCancelled { navigation, .. }
            | RouterEvent::NavigationError { navigation, .. } => Some(navigation),
            _ => None,
        }
    }
}

/// Broadcast bus for router events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RouterEvent>,
}

impl EventBus {
    /// Create a bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers. Never fails: with no subscribers
    /// the event is simply dropped.
    pub fn emit(&self, event: RouterEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
