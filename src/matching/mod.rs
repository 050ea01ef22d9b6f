//! URL matching subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation target URL
//!     → resolver.rs (depth-first tree descent)
//!     → matcher.rs (per-node pattern match, param extraction)
//!     → Resolution: root-to-leaf matched path + leftover / loadable node
//!
//! Pattern compilation (at install / dynamic load):
//!     RouteConfig.path
//!     → tokenize (':param' capture segments, '**' catch-all)
//!     → PathMatcher (full / partial / any)
//! ```
//!
//! # Design Decisions
//! - Matchers compiled once per node, immutable afterwards
//! - Deterministic: same tree and URL always resolve the same path
//! - First match wins per level; catch-all siblings are fallbacks
//! - Explicit unresolved remainder rather than silent best-effort match

pub mod matcher;
pub mod resolver;

pub use matcher::{MatchKind, MatchOutcome, Params, PathMatcher};
pub use resolver::{is_consumed, path_from_root, MatchedNode, Resolution};
