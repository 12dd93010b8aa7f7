//! # waypost-core
//!
//! Core types, settings, and error types for the waypost navigation engine.
//! This crate has no routing dependencies and provides the foundation for the
//! routing and navigation crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Router settings with sensible defaults
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{WaypostError, WaypostResult};
pub use settings::{RouterMode, Settings};
