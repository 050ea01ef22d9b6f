//! Navigation records.
//!
//! # Responsibilities
//! - Describe one attempted location change (type, target, origin)
//! - Chain navigations with a strictly increasing sequence number so stale
//!   in-flight work is detectable
//!
//! # Design Decisions
//! - Sequence numbers are assigned by the scheduler's shared counter at
//!   schedule time, including redirect follow-ups, so supersession is a
//!   simple numeric comparison
//! - Redirect/back follow-ups originate `from` the aborted target, which
//!   lets relative redirect hrefs resolve against it

use crate::location::Location;

/// How a navigation was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    /// New entry pushed via the router API.
    Push,
    /// An externally sourced location change (history adapter).
    Pop,
    /// Current entry replaced via the router API.
    Replace,
    /// Back navigation requested via the router API or a hook.
    GoBack,
}

/// One scheduled navigation in a chain.
#[derive(Debug, Clone)]
pub struct Navigation {
    /// How this navigation was initiated.
    pub kind: NavigationType,

    /// Strictly increasing across a chain; used for staleness checks.
    pub sequence: u64,

    /// Committed location this navigation departs from.
    pub from: Option<Location>,

    /// Target location. Absent for a back navigation with no history.
    pub to: Option<Location>,

    /// Whether transition callbacks should run after commit.
    pub should_transition: bool,
}

impl Navigation {
    pub fn new(
        kind: NavigationType,
        sequence: u64,
        from: Option<Location>,
        to: Option<Location>,
    ) -> Self {
        Self {
            kind,
            sequence,
            from,
            to,
            should_transition: true,
        }
    }

    /// Follow-up navigation redirecting to `href`. The new record departs
    /// from this navigation's target so relative hrefs resolve against it,
    /// and keeps this navigation's history kind: only the follow-up ever
    /// records an entry, so a redirected push still pushes. Externally
    /// sourced changes degrade to a replace, since the external stack
    /// already moved.
    pub fn redirect_to(&self, href: &str, sequence: u64) -> Navigation {
        let kind = match self.kind {
            NavigationType::Pop => NavigationType::Replace,
            kind => kind,
        };
        Navigation {
            kind,
            sequence,
            from: self.to.clone(),
            to: Some(Location::parse(href)),
            should_transition: self.should_transition,
        }
    }

    /// Follow-up navigation going back to `target` (resolved by the
    /// history adapter).
    pub fn back_to(&self, target: Location, sequence: u64) -> Navigation {
        Navigation {
            kind: NavigationType::GoBack,
            sequence,
            from: self.to.clone(),
            to: Some(target),
            should_transition: self.should_transition,
        }
    }

    /// Whether this navigation targets the given committed location
    /// (pathname + query identical), making it a no-op.
    pub fn is_noop_against(&self, committed: &Location) -> bool {
        match &self.to {
            Some(to) => to.same_target(committed),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_chains_from_aborted_target() {
        let nav = Navigation::new(
            NavigationType::Push,
            1,
            Some(Location::parse("/")),
            Some(Location::parse("/admin")),
        );
        let redirect = nav.redirect_to("/login", 2);
        assert_eq!(redirect.sequence, 2);
        assert_eq!(redirect.kind, NavigationType::Push);
        assert_eq!(redirect.from.as_ref().unwrap().pathname, "/admin");
        assert_eq!(redirect.to.as_ref().unwrap().pathname, "/login");
    }

    #[test]
    fn test_redirect_of_external_change_degrades_to_replace() {
        let nav = Navigation::new(NavigationType::Pop, 1, None, Some(Location::parse("/old")));
        let redirect = nav.redirect_to("/new", 2);
        assert_eq!(redirect.kind, NavigationType::Replace);
    }

    #[test]
    fn test_noop_detection() {
        let committed = Location::parse("/a?x=1");
        let nav = Navigation::new(
            NavigationType::Push,
            1,
            None,
            Some(Location::parse("/a?x=1#frag")),
        );
        assert!(nav.is_noop_against(&committed));

        let nav = Navigation::new(NavigationType::Push, 2, None, Some(Location::parse("/a")));
        assert!(!nav.is_noop_against(&committed));

        let no_target = Navigation::new(NavigationType::GoBack, 3, None, None);
        assert!(no_target.is_noop_against(&committed));
    }
}
