//! Shared utilities for router integration tests.

use std::sync::{Arc, Mutex};
use wayfinder::{install, MemoryHistory, RouteConfig, Router, RouterOptions};

/// Opt-in log output for debugging test runs (`RUST_LOG=wayfinder=trace`).
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Ordered record of hook invocations across a scenario.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .expect("call log lock poisoned")
            .push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("call log lock poisoned").clone()
    }
}

/// Install and start a router over `routes` with a memory history at `/`.
pub async fn started(routes: Vec<RouteConfig>) -> (Router, Arc<MemoryHistory>) {
    started_with(routes, |options| options).await
}

/// Like `started`, with a hook to adjust the options before install.
#[allow(dead_code)]
pub async fn started_with(
    routes: Vec<RouteConfig>,
    adjust: impl FnOnce(RouterOptions) -> RouterOptions,
) -> (Router, Arc<MemoryHistory>) {
    let history = Arc::new(MemoryHistory::new("/"));
    let options = adjust(RouterOptions::new(history.clone(), routes));
    let router = install(options).expect("install failed");
    router.start().await.expect("initial navigation failed");
    (router, history)
}
