//! Client-side routing engine: route tree, URL matching, guarded
//! navigation pipeline, dynamic route loading, and observable committed
//! state.

pub mod config;
pub mod errors;
pub mod events;
pub mod history;
pub mod lifecycle;
pub mod location;
pub mod matching;
pub mod middleware;
pub mod router;
pub mod scheduler;
pub mod store;
pub mod tree;

pub use config::hooks::{HookOutcome, HookResult};
pub use config::schema::{RouteConfig, RouterOptions};
pub use errors::{HookError, MiddlewareError, RouterError};
pub use events::RouterEvent;
pub use history::{HistoryAdapter, MemoryHistory};
pub use location::Location;
pub use matching::matcher::MatchKind;
pub use middleware::Middleware;
pub use router::{install, Router, RouteProjection, Selection};
pub use scheduler::{Navigation, NavigationOutcome, NavigationType};
pub use store::snapshot::RouterSnapshot;
pub use store::RouterState;
pub use tree::route::Route;
