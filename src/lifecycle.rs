//! Start/stop coordination for the scheduler control loop.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Coordinator for stopping the router.
///
/// Wraps a broadcast channel the control loop listens on, plus a flag the
/// public API checks before accepting new navigations.
pub struct StopSignal {
    tx: broadcast::Sender<()>,
    stopped: AtomicBool,
}

impl StopSignal {
    /// Create a new stop coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            stopped: AtomicBool::new(false),
        }
    }

    /// Subscribe to the stop signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the stop signal. Idempotent.
    pub fn trigger(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    /// True once `trigger` has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscriber() {
        let signal = StopSignal::new();
        let mut rx = signal.subscribe();
        assert!(!signal.is_stopped());
        signal.trigger();
        assert!(signal.is_stopped());
        rx.recv().await.unwrap();
    }
}
