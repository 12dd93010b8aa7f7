//! Core error types for waypost.
//!
//! [`WaypostError`] covers the failures that can happen while a route table is
//! being built or a path is being generated: malformed patterns, missing or
//! mismatched parameters, and configuration loading problems. Navigation
//! outcomes (aborts, redirects, cancellations) are not errors in this sense and
//! live in the navigation crate.

use thiserror::Error;

/// The primary error type for waypost.
///
/// Most variants are recoverable: the route table reports them as warnings and
/// keeps building, and the matcher converts generation failures into an
/// unmatched route.
#[derive(Error, Debug)]
pub enum WaypostError {
    // ── Patterns ─────────────────────────────────────────────────────

    /// A path pattern could not be compiled.
    #[error("Invalid path pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// What went wrong.
        reason: String,
    },

    /// A required parameter was not supplied while generating a path.
    #[error("Expected \"{0}\" to be defined")]
    MissingParam(String),

    /// A parameter value does not satisfy its token pattern.
    #[error("Expected \"{name}\" to match \"{pattern}\", but received \"{value}\"")]
    ParamMismatch {
        /// The parameter name.
        name: String,
        /// The token pattern the value must match.
        pattern: String,
        /// The encoded value that was rejected.
        value: String,
    },

    // ── Configuration ────────────────────────────────────────────────

    /// The route configuration is inconsistent.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A settings value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Query strings ────────────────────────────────────────────────

    /// A custom query parser rejected its input.
    #[error("Query parse error: {0}")]
    QueryParse(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WaypostError {
    /// Returns `true` for errors raised while generating a concrete path from
    /// a pattern and a parameter map.
    pub const fn is_generation_error(&self) -> bool {
        matches!(self, Self::MissingParam(_) | Self::ParamMismatch { .. })
    }
}

/// A convenience type alias for `Result<T, WaypostError>`.
pub type WaypostResult<T> = Result<T, WaypostError>;
