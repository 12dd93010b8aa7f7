//! Reads router [`Settings`] from TOML or JSON and layers `WAYPOST_*`
//! environment variables on top.
//!
//! ## Loading Order
//!
//! 1. Defaults from [`Settings::default`].
//! 2. Keys present in the TOML or JSON document.
//! 3. Environment variables, which win over both.
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `WAYPOST_MODE` | `mode` (`history`, `hash`, `abstract`) |
//! | `WAYPOST_BASE` | `base` |
//! | `WAYPOST_FALLBACK` | `fallback` |
//! | `WAYPOST_DEBUG` | `debug` |
//! | `WAYPOST_LOG_LEVEL` | `log_level` |
//! | `WAYPOST_MAX_REDIRECTS` | `max_redirects` |
//! | `WAYPOST_INSTANCE_POLL_INTERVAL_MS` | `instance_poll_interval_ms` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use waypost_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/router.toml").unwrap();
//! let settings = settings_loader::from_toml_file_with_env("config/router.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::WaypostError;
use crate::settings::{RouterMode, Settings};

/// Parses settings written as TOML.
///
/// Keys missing from the document keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, WaypostError> {
    toml::from_str(toml_str).map_err(|e| parse_error("TOML", &e))
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, WaypostError> {
    let content = read_config(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Reads a TOML file, then applies environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, WaypostError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Parses settings written as JSON.
pub fn from_json_str(json_str: &str) -> Result<Settings, WaypostError> {
    serde_json::from_str(json_str).map_err(|e| parse_error("JSON", &e))
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, WaypostError> {
    let content = read_config(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Defaults with environment overrides applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `WAYPOST_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// Applies overrides using an arbitrary variable lookup.
///
/// Unparseable values are ignored with a warning and the previous value is kept.
pub fn apply_overrides_from<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("WAYPOST_MODE") {
        match RouterMode::parse(&val) {
            Some(mode) => settings.mode = mode,
            None => tracing::warn!(value = %val, "ignoring unknown WAYPOST_MODE"),
        }
    }

    if let Some(val) = lookup("WAYPOST_BASE") {
        settings.base = val;
    }

    if let Some(val) = lookup("WAYPOST_FALLBACK") {
        settings.fallback = parse_flag(&val);
    }

    if let Some(val) = lookup("WAYPOST_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Some(val) = lookup("WAYPOST_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("WAYPOST_MAX_REDIRECTS") {
        if let Ok(max) = val.parse::<usize>() {
            settings.max_redirects = max;
        } else {
            tracing::warn!(value = %val, "ignoring non-numeric WAYPOST_MAX_REDIRECTS");
        }
    }

    if let Some(val) = lookup("WAYPOST_INSTANCE_POLL_INTERVAL_MS") {
        if let Ok(ms) = val.parse::<u64>() {
            settings.instance_poll_interval_ms = ms;
        } else {
            tracing::warn!(value = %val, "ignoring non-numeric WAYPOST_INSTANCE_POLL_INTERVAL_MS");
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, WaypostError> {
    std::fs::read_to_string(path).map_err(|e| {
        WaypostError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn parse_error(format: &str, error: &dyn std::fmt::Display) -> WaypostError {
    WaypostError::ConfigurationError(format!("Invalid {format} settings: {error}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            mode = "history"
            base = "/app/"
            debug = false
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.mode, RouterMode::History);
        assert_eq!(settings.base, "/app/");
        assert!(!settings.debug);
        // Defaults preserved
        assert_eq!(settings.max_redirects, 16);
        assert_eq!(settings.instance_poll_interval_ms, 16);
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert_eq!(settings.mode, RouterMode::Abstract);
        assert!(settings.debug);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        assert!(from_toml_str("[[invalid toml content").is_err());
    }

    #[test]
    fn test_from_toml_str_unknown_mode_is_error() {
        assert!(from_toml_str("mode = \"teleport\"").is_err());
    }

    #[test]
    fn test_from_toml_str_extra_table() {
        let toml = r#"
            [extra]
            theme = "dark"
        "#;
        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.extra.get("theme").unwrap(), "dark");
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "mode": "hash",
            "strict": true,
            "log_level": "debug"
        }"#;

        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.mode, RouterMode::Hash);
        assert!(settings.strict);
        assert_eq!(settings.log_level, "debug");
        assert!(settings.fallback);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read TOML file"));
    }

    // ── Overrides ───────────────────────────────────────────────────

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut settings = Settings::default();
        apply_overrides_from(
            &mut settings,
            lookup_from(&[
                ("WAYPOST_MODE", "history"),
                ("WAYPOST_BASE", "/shop"),
                ("WAYPOST_FALLBACK", "no"),
                ("WAYPOST_DEBUG", "0"),
                ("WAYPOST_LOG_LEVEL", "warn"),
                ("WAYPOST_MAX_REDIRECTS", "4"),
                ("WAYPOST_INSTANCE_POLL_INTERVAL_MS", "5"),
            ]),
        );

        assert_eq!(settings.mode, RouterMode::History);
        assert_eq!(settings.base, "/shop");
        assert!(!settings.fallback);
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.max_redirects, 4);
        assert_eq!(settings.instance_poll_interval_ms, 5);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut settings = Settings::default();
        apply_overrides_from(
            &mut settings,
            lookup_from(&[
                ("WAYPOST_MODE", "warp"),
                ("WAYPOST_MAX_REDIRECTS", "many"),
            ]),
        );
        assert_eq!(settings.mode, RouterMode::Abstract);
        assert_eq!(settings.max_redirects, 16);
    }
}
