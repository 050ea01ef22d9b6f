//! In-memory history adapter.
//!
//! # Responsibilities
//! - Maintain an entry stack + index like a browser session history
//! - Stage externally triggered back navigations behind the block/confirm
//!   protocol
//!
//! # Design Decisions
//! - Pushing truncates the forward tail, matching browser semantics
//! - `record` never notifies the listener: router-sourced navigations are
//!   already being processed when they reach the adapter

use crate::history::{HistoryAdapter, HistoryUpdate};
use crate::location::Location;
use crate::scheduler::navigation::NavigationType;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy)]
enum Pending {
    Back,
}

struct Inner {
    entries: Vec<Location>,
    index: usize,
    listener: Option<UnboundedSender<HistoryUpdate>>,
    pending: HashMap<u64, Pending>,
    next_token: u64,
}

/// Session-style history kept entirely in memory.
pub struct MemoryHistory {
    inner: Mutex<Inner>,
}

impl MemoryHistory {
    /// Create a history with a single initial entry.
    pub fn new(initial: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: vec![Location::parse(initial)],
                index: 0,
                listener: None,
                pending: HashMap::new(),
                next_token: 0,
            }),
        }
    }

    /// Simulate an external back-button press: stages the change and emits
    /// it to the listener; the stack moves only once confirmed.
    pub fn request_back(&self) {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        if inner.index == 0 {
            return;
        }
        let target = inner.entries[inner.index - 1].clone();
        let token = inner.next_token;
        inner.next_token += 1;
        inner.pending.insert(token, Pending::Back);
        if let Some(listener) = &inner.listener {
            let _ = listener.send(HistoryUpdate {
                location: target,
                kind: NavigationType::Pop,
                token,
            });
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<Location> {
        self.inner.lock().expect("history lock poisoned").entries.clone()
    }

    /// Index of the current entry.
    pub fn index(&self) -> usize {
        self.inner.lock().expect("history lock poisoned").index
    }
}

impl HistoryAdapter for MemoryHistory {
    fn current(&self) -> Location {
        let inner = self.inner.lock().expect("history lock poisoned");
        inner.entries[inner.index].clone()
    }

    fn record(&self, location: &Location, kind: NavigationType) {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        match kind {
            NavigationType::Push => {
                let index = inner.index;
                inner.entries.truncate(index + 1);
                inner.entries.push(location.clone());
                inner.index += 1;
            }
            NavigationType::Replace => {
                let index = inner.index;
                inner.entries[index] = location.clone();
            }
            NavigationType::GoBack => {
                inner.index = inner.index.saturating_sub(1);
            }
            // External pops move the stack via confirm, not record.
            NavigationType::Pop => {}
        }
    }

    fn back_target(&self) -> Option<Location> {
        let inner = self.inner.lock().expect("history lock poisoned");
        if inner.index == 0 {
            None
        } else {
            Some(inner.entries[inner.index - 1].clone())
        }
    }

    fn listen(&self, tx: UnboundedSender<HistoryUpdate>) {
        self.inner.lock().expect("history lock poisoned").listener = Some(tx);
    }

    fn confirm(&self, token: u64, allowed: bool) {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        if let Some(Pending::Back) = inner.pending.remove(&token) {
            if allowed {
                inner.index = inner.index.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_push_truncates_forward_tail() {
        let history = MemoryHistory::new("/");
        history.record(&Location::parse("/a"), NavigationType::Push);
        history.record(&Location::parse("/b"), NavigationType::Push);
        history.record(&Location::parse("/a"), NavigationType::GoBack);
        assert_eq!(history.current().pathname, "/a");
        assert_eq!(history.index(), 1);

        history.record(&Location::parse("/c"), NavigationType::Push);
        let paths: Vec<String> = history.entries().iter().map(|l| l.pathname.clone()).collect();
        assert_eq!(paths, vec!["/", "/a", "/c"]);
    }

    #[test]
    fn test_replace_overwrites_current() {
        let history = MemoryHistory::new("/");
        history.record(&Location::parse("/a"), NavigationType::Push);
        history.record(&Location::parse("/b"), NavigationType::Replace);
        let paths: Vec<String> = history.entries().iter().map(|l| l.pathname.clone()).collect();
        assert_eq!(paths, vec!["/", "/b"]);
    }

    #[tokio::test]
    async fn test_back_request_is_staged_until_confirmed() {
        let history = MemoryHistory::new("/");
        history.record(&Location::parse("/a"), NavigationType::Push);
        let (tx, mut rx) = mpsc::unbounded_channel();
        history.listen(tx);

        history.request_back();
        let update = rx.recv().await.unwrap();
        assert_eq!(update.location.pathname, "/");
        // Not applied yet.
        assert_eq!(history.current().pathname, "/a");

        history.confirm(update.token, false);
        assert_eq!(history.current().pathname, "/a");

        history.request_back();
        let update = rx.recv().await.unwrap();
        history.confirm(update.token, true);
        assert_eq!(history.current().pathname, "/");
    }

    #[test]
    fn test_back_target_at_root_is_none() {
        let history = MemoryHistory::new("/");
        assert!(history.back_target().is_none());
    }
}
