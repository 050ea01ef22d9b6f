//! Router error definitions.
//!
//! # Error Families
//! - `RouterError`: navigation-fatal errors surfaced to callers and the store
//! - `HookError`: failures raised by user guard/lifecycle hooks
//! - `MiddlewareError`: failures raised inside the event pipeline
//!
//! # Design Decisions
//! - One `thiserror` enum per family, explicit `From` conversions
//! - Errors are `Clone` so the store error slot and events can both carry them
//! - A failed navigation never crashes the scheduler loop; errors are recorded
//!   on the store and emitted as `NAVIGATION_ERROR`

use thiserror::Error;

/// Errors that can fail a navigation or router operation.
#[derive(Debug, Error, Clone)]
pub enum RouterError {
    /// URL did not resolve to any node and neither a `**` fallback nor an
    /// `on_error` handler recovered it.
    #[error("no route matched '{url}'")]
    NoMatch { url: String },

    /// A guard or lifecycle hook blocked the transition.
    #[error("{phase} rejected navigation at '{path}'")]
    TransitionFailure { phase: String, path: String },

    /// Invalid route configuration detected at install time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A `load_children` future rejected.
    #[error("loading children of '{path}' failed: {message}")]
    LoaderFailed { path: String, message: String },

    /// A redirect chain exceeded the configured bound.
    #[error("redirect chain exceeded {limit} hops while navigating to '{url}'")]
    TooManyRedirects { limit: usize, url: String },

    /// A pattern could not be turned back into a concrete path.
    #[error("cannot stringify pattern '{pattern}': {reason}")]
    Stringify { pattern: String, reason: String },

    /// A user hook returned an error (not a redirect/deny decision).
    #[error(transparent)]
    Hook(#[from] HookError),

    /// A middleware failed while transforming an event.
    #[error(transparent)]
    Middleware(#[from] MiddlewareError),

    /// The router control loop is not running.
    #[error("router is not running")]
    Stopped,
}

/// Error raised by a user guard, lifecycle hook, or children loader.
#[derive(Debug, Error, Clone)]
#[error("hook failed: {message}")]
pub struct HookError {
    /// Human-readable failure description.
    pub message: String,
}

impl HookError {
    /// Create a hook error from any displayable value.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error raised inside the middleware pipeline.
#[derive(Debug, Error, Clone)]
#[error("middleware '{name}' failed: {message}")]
pub struct MiddlewareError {
    /// Name of the failing middleware (for diagnostics).
    pub name: String,
    /// Human-readable failure description.
    pub message: String,
}

impl MiddlewareError {
    /// Create a middleware error.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouterError::NoMatch {
            url: "/missing".into(),
        };
        assert_eq!(err.to_string(), "no route matched '/missing'");

        let err = RouterError::TooManyRedirects {
            limit: 10,
            url: "/loop".into(),
        };
        assert!(err.to_string().contains("10 hops"));
    }

    #[test]
    fn test_hook_error_conversion() {
        let err: RouterError = HookError::new("boom").into();
        assert!(matches!(err, RouterError::Hook(_)));
        assert_eq!(err.to_string(), "hook failed: boom");
    }
}
