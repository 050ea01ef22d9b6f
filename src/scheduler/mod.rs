//! Navigation scheduling.
//!
//! # Data Flow
//! ```text
//! push/replace/go_back ──┐
//! external history pop ──┤→ Navigation{sequence} → Scheduler::run
//!                        │      │
//!                        │      ├─ match → load → guards → lifecycle
//!                        │      └─ diff committed vs next route list
//!                        └──────────→ commit | cancel | redirect-chain
//! ```
//! Sequence numbers are claimed at schedule time; the machine compares
//! them at every suspension point so a stale attempt abandons itself.

pub mod diff;
pub mod machine;
pub mod navigation;

pub use diff::{diff_routes, RouteDiff};
pub use machine::{NavigationOutcome, Scheduler};
pub use navigation::{Navigation, NavigationType};
