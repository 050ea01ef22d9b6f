//! Route state tree subsystem.
//!
//! # Data Flow
//! ```text
//! RouteConfig tree
//!     → node.rs (compiled RouteNodes, counter keys, inherited context)
//!     → shared via Arc with the store index and the resolver
//!
//! Per navigation:
//!     MatchedNode (resolver output)
//!     → route.rs (materialized Route instance, derived key)
//!     → reused/merged against live instances with the same key
//! ```
//!
//! # Design Decisions
//! - Node identity is the unit of activation; instance identity (node +
//!   params + query) is the unit of entering/exiting
//! - Tree mutation (dynamic children) happens only inside the scheduler
//!   loop, so readers need no coordination beyond the children lock

pub mod node;
pub mod route;

pub use node::{NodeKeyGen, RouteHooks, RouteNode};
pub use route::Route;
