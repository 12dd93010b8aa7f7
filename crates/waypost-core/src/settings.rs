//! Router settings.
//!
//! [`Settings`] holds every option a router instance is built from. Each
//! router owns its own copy; there is no process-wide settings instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which history backend a router drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    /// Address-bar history using push-state URLs.
    History,
    /// Fragment-based history (`#/path`).
    Hash,
    /// In-memory history with no address bar.
    Abstract,
}

impl RouterMode {
    /// Parses a mode name (`"history"`, `"hash"`, `"abstract"`), case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "history" => Some(Self::History),
            "hash" => Some(Self::Hash),
            "abstract" | "memory" => Some(Self::Abstract),
            _ => None,
        }
    }

    /// Returns the canonical lowercase name of this mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Hash => "hash",
            Self::Abstract => "abstract",
        }
    }
}

impl std::fmt::Display for RouterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The complete set of router settings.
///
/// # Examples
///
/// ```
/// use waypost_core::settings::{RouterMode, Settings};
///
/// let settings = Settings::default();
/// assert_eq!(settings.mode, RouterMode::Abstract);
/// assert_eq!(settings.instance_poll_interval_ms, 16);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── History ──────────────────────────────────────────────────────

    /// The history backend to use.
    pub mode: RouterMode,
    /// The base path the application is served from (history mode only).
    pub base: String,
    /// Fall back to hash mode when the address bar lacks push-state support.
    pub fallback: bool,

    // ── Matching ─────────────────────────────────────────────────────

    /// Default for route patterns: a trailing slash must match exactly.
    pub strict: bool,
    /// Default for route patterns: matching is case-sensitive.
    pub sensitive: bool,
    /// Maximum number of redirect/alias hops resolved for one location.
    pub max_redirects: usize,

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Interval between polls for a late component instance, in milliseconds.
    pub instance_poll_interval_ms: u64,
    /// Number of polls before a post-commit callback is dropped.
    pub instance_poll_attempts: u32,

    // ── Logging ──────────────────────────────────────────────────────

    /// Whether debug mode (human-readable logs) is enabled.
    pub debug: bool,
    /// The log level filter (e.g. "info", "waypost=debug").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // History
            mode: RouterMode::Abstract,
            base: "/".to_string(),
            fallback: true,

            // Matching
            strict: false,
            sensitive: false,
            max_redirects: 16,

            // Pipeline
            instance_poll_interval_ms: 16,
            instance_poll_attempts: 60,

            // Logging
            debug: true,
            log_level: "info".to_string(),

            // Extra
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the instance poll interval as a [`std::time::Duration`].
    pub const fn instance_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.instance_poll_interval_ms)
    }
}
