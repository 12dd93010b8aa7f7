//! # waypost
//!
//! A client-side navigation engine: route tables compiled from nested
//! configuration, a matcher that turns locations into route snapshots, and an
//! async guard pipeline that commits navigations to a history backend.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on `waypost`
//! for the whole engine, or on individual crates for finer-grained control.
//!
//! ```
//! use waypost::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let router = Router::new(RouterOptions::new([
//!     RouteConfig::new("/").name("home"),
//!     RouteConfig::new("/users/:id").name("user"),
//! ]));
//!
//! let route = router.push("/users/42").await.unwrap();
//! assert_eq!(route.params["id"], "42");
//! # });
//! ```

/// Settings, error types, and logging setup.
pub use waypost_core as core;

/// Path patterns, route tables, and the matcher.
pub use waypost_routing as routing;

/// The router, guard pipeline, and history backends.
#[cfg(feature = "navigation")]
pub use waypost_navigation as navigation;

// Re-export commonly used third-party crates
pub use async_trait;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;

/// Common imports for applications using waypost.
pub mod prelude {
    pub use waypost_core::{RouterMode, Settings, WaypostError, WaypostResult};
    pub use waypost_routing::{
        guard_fn, guard_sync, Component, ComponentRef, Location, Matcher, NavigationGuard, Next,
        Params, Route, RouteConfig,
    };

    #[cfg(feature = "navigation")]
    pub use waypost_navigation::{
        History, HookId, MemoryHistory, NavigationFailure, NavigationFailureType, Router,
        RouterOptions,
    };
}
