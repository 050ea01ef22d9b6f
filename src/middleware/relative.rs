//! Relative path resolution middleware.

use crate::events::RouterEvent;
use crate::location;
use crate::middleware::Middleware;

/// Resolves `.`/`..` segments and relative targets against the location
/// the navigation departs from, so guards and matching only ever see
/// normalized absolute paths.
pub fn resolve_relative() -> Middleware {
    Middleware::new("relative-paths", |event| match event {
        RouterEvent::NavigationStart { mut navigation } => {
            let cwd = navigation
                .from
                .as_ref()
                .map(|from| from.pathname.clone())
                .unwrap_or_else(|| "/".to_string());
            if let Some(to) = navigation.to.as_mut() {
                to.pathname = location::resolve_path(&to.pathname, &cwd);
            }
            Ok(RouterEvent::NavigationStart { navigation })
        }
        other => Ok(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use crate::scheduler::navigation::{Navigation, NavigationType};

    fn resolved(from: Option<&str>, to: &str) -> String {
        let event = RouterEvent::NavigationStart {
            navigation: Navigation::new(
                NavigationType::Push,
                1,
                from.map(Location::parse),
                Some(Location::parse(to)),
            ),
        };
        match resolve_relative().apply(event).unwrap() {
            RouterEvent::NavigationStart { navigation } => navigation.to.unwrap().pathname,
            _ => panic!("variant changed"),
        }
    }

    #[test]
    fn test_relative_segments_resolve_against_from() {
        assert_eq!(resolved(Some("/a/b"), "c"), "/a/b/c");
        assert_eq!(resolved(Some("/a/b"), "../c"), "/a/c");
        assert_eq!(resolved(Some("/"), "b"), "/b");
    }

    #[test]
    fn test_absolute_paths_only_normalize() {
        assert_eq!(resolved(Some("/a/b"), "/x/./y/../z"), "/x/z");
        assert_eq!(resolved(None, "/plain"), "/plain");
    }
}
