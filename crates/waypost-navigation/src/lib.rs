//! # waypost-navigation
//!
//! The navigation half of waypost. A [`Router`] resolves navigation targets
//! through the matcher from `waypost-routing`, runs the guard pipeline, and
//! commits the resulting route to a [`History`] backend.
//!
//! ## Modules
//!
//! - [`router`] - The router and its options
//! - [`pipeline`] - Guard queues, chain diffing and post-commit callbacks
//! - [`failure`] - Why a navigation did not commit
//! - [`hooks`] - Global hook registries
//! - [`history`] - Memory, push-state and hash history backends
//! - [`instances`] - Component instances registered by the UI layer

pub mod failure;
pub mod history;
pub mod hooks;
pub mod instances;
pub mod pipeline;
pub mod router;

pub use failure::{NavigationFailure, NavigationFailureType};
pub use history::{AddressBar, BrowserHistory, HashHistory, History, MemoryHistory};
pub use hooks::HookId;
pub use instances::InstanceRegistry;
pub use pipeline::{resolve_queue, ChainDiff, GuardStage, NavigationType};
pub use router::{Resolved, Router, RouterOptions};
