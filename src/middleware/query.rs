//! Query-string parsing middleware.

use crate::events::RouterEvent;
use crate::middleware::Middleware;
use url::form_urlencoded;

/// Splits the target location's `search` into its `query` map before the
/// navigation reaches matching and guards.
pub fn parse_query() -> Middleware {
    Middleware::new("query-parser", |event| match event {
        RouterEvent::NavigationStart { mut navigation } => {
            if let Some(to) = navigation.to.as_mut() {
                if !to.search.is_empty() {
                    to.query =
                        form_urlencoded::parse(to.search.trim_start_matches('?').as_bytes())
                            .into_owned()
                            .collect();
                }
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

    #[test]
    fn test_search_is_parsed_into_query() {
        let event = RouterEvent::NavigationStart {
            navigation: Navigation::new(
                NavigationType::Push,
                1,
                None,
                Some(Location::parse("/a?x=1&y=two%20words")),
            ),
        };
        let out = parse_query().apply(event).unwrap();
        let RouterEvent::NavigationStart { navigation } = out else {
            panic!("variant changed");
        };
        let query = navigation.to.unwrap().query;
        assert_eq!(query["x"], "1");
        assert_eq!(query["y"], "two words");
    }

    #[test]
    fn test_no_search_leaves_query_empty() {
        let event = RouterEvent::NavigationStart {
            navigation: Navigation::new(NavigationType::Push, 1, None, Some(Location::parse("/a"))),
        };
        let out = parse_query().apply(event).unwrap();
        let RouterEvent::NavigationStart { navigation } = out else {
            panic!("variant changed");
        };
        assert!(navigation.to.unwrap().query.is_empty());
    }
}
