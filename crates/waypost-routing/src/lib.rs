//! # waypost-routing
//!
//! Route matching for the waypost navigation engine. Compiles a declarative
//! route tree into a [`RouteTable`] and resolves navigation targets into
//! immutable [`Route`] snapshots.
//!
//! ## Modules
//!
//! - [`pattern`] - Path pattern compiler, matcher and generator
//! - [`query`] - Query string codec
//! - [`location`] - Navigation targets and their normalization
//! - [`record`] - Route configuration input and compiled records
//! - [`table`] - The route table and configuration warnings
//! - [`route`] - Resolved route snapshots
//! - [`matcher`] - Name, path, redirect and alias resolution
//! - [`component`] - Components and lazy component loading
//! - [`guard`] - Navigation guards and their continuation type

pub mod component;
pub mod guard;
pub mod location;
pub mod matcher;
pub mod pattern;
pub mod query;
pub mod record;
pub mod route;
pub mod table;

pub use component::{Component, ComponentRef, FactoryOutput, LazyComponent, LoadingWrapper};
pub use guard::{guard_fn, guard_sync, NavigationGuard, Next};
pub use location::{Location, Params};
pub use matcher::Matcher;
pub use pattern::{PathPattern, PatternOptions};
pub use query::{Query, QueryCodec, QueryValue};
pub use record::{PropsSpec, Redirect, RouteConfig, RouteRecord};
pub use route::Route;
pub use table::{ConfigWarning, RouteTable};
