//! Redirect injection.
//!
//! Rewrites `redirect_to` configs into synthesized `will_activate` hooks at
//! install time (and again for dynamically loaded fragments), so the
//! scheduler only ever deals with one redirect mechanism: a hook returning
//! `HookOutcome::Redirect`.

use crate::config::hooks::HookOutcome;
use crate::config::schema::RouteConfig;
use std::sync::Arc;

/// Recursively replace `redirect_to` with a will-activate redirect hook.
pub fn apply_redirects(configs: Vec<RouteConfig>) -> Vec<RouteConfig> {
    configs
        .into_iter()
        .map(|mut config| {
            if let Some(target) = config.redirect_to.take() {
                config.will_activate = Some(Arc::new(move |_route, _nav| {
                    let target = target.clone();
                    Box::pin(async move { Ok(HookOutcome::Redirect(target)) })
                }));
            }
            config.children = apply_redirects(std::mem::take(&mut config.children));
            config
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_becomes_will_activate() {
        let configs = apply_redirects(vec![RouteConfig::new("").redirect_to("b")]);
        assert!(configs[0].redirect_to.is_none());
        assert!(configs[0].will_activate.is_some());
    }

    #[test]
    fn test_nested_redirects_are_rewritten() {
        let configs = apply_redirects(vec![RouteConfig::new("a")
            .children(vec![RouteConfig::new("old").redirect_to("/a/new")])]);
        assert!(configs[0].children[0].will_activate.is_some());
    }
}
