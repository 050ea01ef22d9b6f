//! Route configuration subsystem.
//!
//! # Data Flow
//! ```text
//! RouteConfig tree (code-built, carries hook closures)
//!     → validation.rs (semantic checks)
//!     → redirect middleware (redirect_to → will_activate synthesis)
//!     → tree::node (compiled into RouteNodes)
//!
//! On dynamic load:
//!     loader future resolves child configs
//!     → validation.rs validates the fragment
//!     → grafted under the exhausted node by the scheduler loop
//! ```
//!
//! # Design Decisions
//! - Configs are immutable once compiled; dynamic loading grafts new
//!   subtrees but never rewrites existing nodes
//! - Hooks default to absent (treated as allow/no-op), not to stub closures
//! - Validation separates structural checks from matcher compilation

pub mod hooks;
pub mod schema;
pub mod validation;

pub use hooks::{HookOutcome, TransitionPhase};
pub use schema::{RouteConfig, RouterOptions};
