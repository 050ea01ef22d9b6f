//! Route configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of the route config tree before install
//! - Detect conflicting sibling patterns (unreachable routes)
//! - Enforce mutual exclusions (`redirect_to` vs hooks, static vs dynamic
//!   children)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: `&[RouteConfig]` → `Result`
//! - Runs both at install time and on dynamically loaded child configs

use crate::config::schema::RouteConfig;
use crate::errors::RouterError;

/// Validate a config tree. The same checks run on dynamically loaded
/// children before they are grafted into the tree.
pub fn validate(routes: &[RouteConfig]) -> Result<(), RouterError> {
    let mut errors = Vec::new();
    validate_level(routes, "", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RouterError::Configuration(errors.join("; ")))
    }
}

fn validate_level(routes: &[RouteConfig], parent: &str, errors: &mut Vec<String>) {
    let mut seen: Vec<&str> = Vec::new();
    for config in routes {
        let at = display_path(parent, &config.path);

        if seen.contains(&config.path.as_str()) {
            errors.push(format!("duplicate sibling pattern '{at}' is unreachable"));
        }
        seen.push(config.path.as_str());

        if config.redirect_to.is_some() && has_hooks(config) {
            errors.push(format!(
                "route '{at}' declares redirect_to together with lifecycle hooks"
            ));
        }
        if config.redirect_to.is_some() && config.load_children.is_some() {
            errors.push(format!(
                "route '{at}' declares redirect_to together with load_children"
            ));
        }
        if !config.children.is_empty() && config.load_children.is_some() {
            errors.push(format!(
                "route '{at}' declares both children and load_children"
            ));
        }
        if config.path == "**" && (!config.children.is_empty() || config.load_children.is_some()) {
            errors.push(format!("catch-all route '{at}' cannot have children"));
        }

        validate_level(&config.children, &at, errors);
    }
}

fn has_hooks(config: &RouteConfig) -> bool {
    config.can_activate.is_some()
        || config.can_deactivate.is_some()
        || config.will_activate.is_some()
        || config.will_deactivate.is_some()
        || config.will_resolve.is_some()
        || config.on_enter.is_some()
        || config.on_exit.is_some()
}

fn display_path(parent: &str, path: &str) -> String {
    if parent.is_empty() {
        format!("/{path}")
    } else {
        format!("{parent}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hooks::HookOutcome;

    #[test]
    fn test_valid_tree_passes() {
        let routes = vec![
            RouteConfig::new("a/:id").children(vec![RouteConfig::new("b")]),
            RouteConfig::new("**"),
        ];
        assert!(validate(&routes).is_ok());
    }

    #[test]
    fn test_duplicate_siblings_rejected() {
        let routes = vec![RouteConfig::new("a"), RouteConfig::new("a")];
        let err = validate(&routes).unwrap_err();
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn test_redirect_with_hooks_rejected() {
        let routes = vec![RouteConfig::new("a")
            .redirect_to("/b")
            .can_activate(|_, _| async { Ok(HookOutcome::Allow) })];
        let err = validate(&routes).unwrap_err();
        assert!(err.to_string().contains("redirect_to"));
    }

    #[test]
    fn test_static_and_dynamic_children_rejected() {
        let routes = vec![RouteConfig::new("a")
            .children(vec![RouteConfig::new("b")])
            .load_children(|| async { Ok(vec![]) })];
        let err = validate(&routes).unwrap_err();
        assert!(err.to_string().contains("both children and load_children"));
    }

    #[test]
    fn test_nested_errors_are_collected() {
        let routes = vec![RouteConfig::new("a").children(vec![
            RouteConfig::new("b"),
            RouteConfig::new("b"),
            RouteConfig::new("**").children(vec![RouteConfig::new("c")]),
        ])];
        let err = validate(&routes).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/a/b"));
        assert!(msg.contains("cannot have children"));
    }
}
