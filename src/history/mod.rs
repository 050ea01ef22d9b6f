//! History adapter contract.
//!
//! # Data Flow
//! ```text
//! Externally sourced change (browser back button, address bar)
//!     → adapter stages it and emits HistoryUpdate to the listener
//!     → scheduler runs the navigation
//!     → confirm(token, allowed): adapter applies or reverts its stack
//!
//! Router-sourced change (push / replace / go_back)
//!     → scheduler commits first, then record() updates the stack
//!     → no listener echo, so router navigations are never re-entered
//! ```
//!
//! # Design Decisions
//! - The block/confirm protocol gates source-level navigation on the
//!   router's cancel/commit decision instead of racing it
//! - The adapter is an abstract collaborator; the crate only ships the
//!   in-memory implementation used by tests and server-side resumption

pub mod memory;

use crate::location::Location;
use crate::scheduler::navigation::NavigationType;
use tokio::sync::mpsc::UnboundedSender;

/// A staged, externally sourced location change awaiting confirmation.
#[derive(Debug, Clone)]
pub struct HistoryUpdate {
    pub location: Location,
    pub kind: NavigationType,
    /// Correlates the update with its later `confirm` call.
    pub token: u64,
}

/// Abstract location-change source and sink.
pub trait HistoryAdapter: Send + Sync {
    /// The current location of the underlying source.
    fn current(&self) -> Location;

    /// Apply a committed router navigation to the underlying stack.
    /// Must not echo back through the listener.
    fn record(&self, location: &Location, kind: NavigationType);

    /// Location a back navigation would land on, if any.
    fn back_target(&self) -> Option<Location>;

    /// Register the scheduler's channel for externally sourced changes.
    fn listen(&self, tx: UnboundedSender<HistoryUpdate>);

    /// Resolve a staged external change: apply it (`true`) or revert it.
    fn confirm(&self, token: u64, allowed: bool);
}

pub use memory::MemoryHistory;
