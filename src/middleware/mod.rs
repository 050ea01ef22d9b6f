//! Event middleware pipeline.
//!
//! # Data Flow
//! ```text
//! Scheduler emits RouterEvent
//!     → built-in middleware (query parsing, relative path resolution)
//!     → user middleware, left to right
//!     → observers / guard pipeline see the transformed event
//! ```
//!
//! # Design Decisions
//! - A middleware is a fallible `RouterEvent -> RouterEvent` transform;
//!   `concat` is associative, so pipelines compose like a semigroup
//! - Middleware failures become `NAVIGATION_ERROR` events at the emit
//!   site; they never crash the scheduler loop
//! - Redirect injection is a config-time rewrite (`redirect_to` becomes a
//!   synthesized `will_activate`), not an event transform

pub mod query;
pub mod redirect;
pub mod relative;

use crate::errors::MiddlewareError;
use crate::events::RouterEvent;
use std::sync::Arc;

type TransformFn = Arc<dyn Fn(RouterEvent) -> Result<RouterEvent, MiddlewareError> + Send + Sync>;

/// A composable event transform.
#[derive(Clone)]
pub struct Middleware {
    name: String,
    transform: TransformFn,
}

impl Middleware {
    /// Wrap a transform function. The name appears in failure diagnostics.
    pub fn new<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(RouterEvent) -> Result<RouterEvent, MiddlewareError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
        }
    }

    /// The do-nothing middleware (identity of `concat`).
    pub fn identity() -> Self {
        Self::new("identity", Ok)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compose: apply `self` first, then `other`. Associative.
    pub fn concat(self, other: Middleware) -> Middleware {
        let name = format!("{}>{}", self.name, other.name);
        Middleware::new(name, move |event| other.apply(self.apply(event)?))
    }

    /// Run the transform.
    pub fn apply(&self, event: RouterEvent) -> Result<RouterEvent, MiddlewareError> {
        (self.transform)(event)
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Middleware({})", self.name)
    }
}

/// Built-in pipeline (query parsing, relative resolution) followed by user
/// middleware in order.
pub fn pipeline(user: impl IntoIterator<Item = Middleware>) -> Middleware {
    let mut chain = query::parse_query().concat(relative::resolve_relative());
    for middleware in user {
        chain = chain.concat(middleware);
    }
    chain
}
