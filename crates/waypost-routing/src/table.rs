//! The route table.
//!
//! A [`RouteTable`] holds three coupled indexes built from [`RouteConfig`]s:
//!
//! - an ordered list of record paths, in match-priority order, with the bare
//!   catch-all `*` always last;
//! - a path to record map, where the first registration of a path wins;
//! - a name to record map, where the first registration of a name wins.
//!
//! Tables only grow. [`RouteTable::add_routes`] and [`RouteTable::add_route`]
//! merge new configs into the live indexes.
//!
//! Configuration problems never fail the build. Each one is logged with
//! `tracing::warn!` and kept as a [`ConfigWarning`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::location::clean_path;
use crate::pattern::{PathPattern, PatternOptions};
use crate::record::{RecordId, RouteConfig, RouteRecord};

/// A non-fatal problem found while building the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    /// A path pattern failed to compile; the route was skipped.
    #[error("route \"{path}\" was skipped: {reason}")]
    InvalidPattern {
        /// The normalized path.
        path: String,
        /// The compiler's message.
        reason: String,
    },

    /// A pattern uses the same parameter name more than once.
    #[error("duplicate param keys in route with path \"{path}\": {names:?}")]
    DuplicateParams {
        /// The normalized path.
        path: String,
        /// The repeated names.
        names: Vec<String>,
    },

    /// A second route used an existing name and was not indexed by it.
    #[error("duplicate named routes definition: {{ name: \"{name}\", path: \"{path}\" }}")]
    DuplicateName {
        /// The route name.
        name: String,
        /// The path of the ignored route.
        path: String,
    },

    /// A path contains characters that should have been percent-encoded.
    #[error("route with path \"{path}\" contains unencoded characters, encode static segments before registering it")]
    UnencodedPath {
        /// The normalized path.
        path: String,
    },

    /// An alias equals the path it aliases.
    #[error("found an alias with the same value as the path: \"{path}\"")]
    AliasSameAsPath {
        /// The path.
        path: String,
    },

    /// A named route has a default child, so navigating by its name will not
    /// render the child.
    #[error("named route \"{name}\" has a default child route; navigate to the child's name instead")]
    NamedRouteWithDefaultChild {
        /// The route name.
        name: String,
    },

    /// `add_route` named a parent that does not exist; the route was added at
    /// the top level.
    #[error("parent route \"{name}\" does not exist")]
    UnknownParent {
        /// The requested parent name.
        name: String,
    },
}

/// The compiled route indexes.
pub struct RouteTable {
    // ── Indexes ─────────────────────────────────────────────────────
    path_list: Vec<String>,
    path_map: HashMap<String, Arc<RouteRecord>>,
    name_map: HashMap<String, Arc<RouteRecord>>,

    // ── Build state ─────────────────────────────────────────────────
    options: PatternOptions,
    next_id: u64,
    warnings: Vec<ConfigWarning>,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("path_list", &self.path_list)
            .field("names", &self.name_map.keys().collect::<Vec<_>>())
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(PatternOptions::default())
    }
}

impl RouteTable {
    /// Creates an empty table whose routes default to `options`.
    pub fn new(options: PatternOptions) -> Self {
        Self {
            path_list: Vec::new(),
            path_map: HashMap::new(),
            name_map: HashMap::new(),
            options,
            next_id: 0,
            warnings: Vec::new(),
        }
    }

    /// Builds a table from `configs`.
    pub fn build(configs: impl IntoIterator<Item = RouteConfig>, options: PatternOptions) -> Self {
        let mut table = Self::new(options);
        table.add_routes(configs);
        table
    }

    /// Merges `configs` into the table.
    pub fn add_routes(&mut self, configs: impl IntoIterator<Item = RouteConfig>) {
        for config in configs {
            self.add_record(&config, None, None, false);
        }
        self.move_catch_all_last();
    }

    /// Adds one route, nested under the route named `parent` when given.
    ///
    /// The route is also registered under every alias of the parent.
    pub fn add_route(&mut self, parent: Option<&str>, config: RouteConfig) {
        let parent_record = parent.and_then(|name| self.name_map.get(name).cloned());
        if let (Some(name), None) = (parent, &parent_record) {
            self.warn(ConfigWarning::UnknownParent {
                name: name.to_string(),
            });
        }

        self.add_record(&config, parent_record.as_ref(), None, false);

        if let Some(parent_record) = parent_record {
            let alias_parents: Vec<Arc<RouteRecord>> = self
                .path_list
                .iter()
                .filter_map(|path| self.path_map.get(path))
                .filter(|r| r.alias_of.as_deref() == Some(canonical_path(&parent_record)))
                .cloned()
                .collect();

            for alias_parent in alias_parents {
                let match_as = clean_path(&format!("{}/{}", parent_record.path, config.path));
                self.add_record(&config, Some(&alias_parent), Some(match_as), false);
            }
        }

        self.move_catch_all_last();
    }

    /// All records, in match-priority order.
    pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
        self.ordered().cloned().collect()
    }

    /// Iterates the records in match-priority order.
    pub fn ordered(&self) -> impl Iterator<Item = &Arc<RouteRecord>> {
        self.path_list.iter().filter_map(|path| self.path_map.get(path))
    }

    /// The ordered record paths.
    pub fn path_list(&self) -> &[String] {
        &self.path_list
    }

    /// Looks a record up by its normalized path.
    pub fn record_by_path(&self, path: &str) -> Option<&Arc<RouteRecord>> {
        self.path_map.get(path)
    }

    /// Looks a record up by name.
    pub fn record_by_name(&self, name: &str) -> Option<&Arc<RouteRecord>> {
        self.name_map.get(name)
    }

    /// The warnings collected so far.
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// The default pattern options of this table.
    pub const fn options(&self) -> PatternOptions {
        self.options
    }

    /// Number of indexed paths.
    pub fn len(&self) -> usize {
        self.path_list.len()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.path_list.is_empty()
    }

    // ── Internals ───────────────────────────────────────────────────

    fn warn(&mut self, warning: ConfigWarning) {
        tracing::warn!(%warning, "route configuration problem");
        self.warnings.push(warning);
    }

    fn options_for(&self, config: &RouteConfig) -> PatternOptions {
        let mut options = config.pattern_options.unwrap_or(self.options);
        if let Some(sensitive) = config.case_sensitive {
            options.sensitive = sensitive;
        }
        options
    }

    fn next_record_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id)
    }

    /// Compiles `config` and registers it along with its children and aliases.
    ///
    /// `match_as` is set for records produced by alias expansion. `alias_root`
    /// marks the record standing for the alias path itself, which carries no
    /// name, redirect or further aliases of its own.
    fn add_record(
        &mut self,
        config: &RouteConfig,
        parent: Option<&Arc<RouteRecord>>,
        match_as: Option<String>,
        alias_root: bool,
    ) {
        let options = self.options_for(config);
        let path = normalize_path(&config.path, parent.map(|p| p.path.as_str()), options.strict);

        if !path.is_ascii() {
            self.warn(ConfigWarning::UnencodedPath { path: path.clone() });
        }

        let pattern = match PathPattern::compile(&path, options) {
            Ok(pattern) => pattern,
            Err(e) => {
                self.warn(ConfigWarning::InvalidPattern {
                    path,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let duplicates = pattern.duplicate_keys();
        if !duplicates.is_empty() {
            self.warn(ConfigWarning::DuplicateParams {
                path: path.clone(),
                names: duplicates,
            });
        }

        let record = Arc::new(RouteRecord {
            id: self.next_record_id(),
            path,
            pattern,
            components: config.components.clone(),
            name: if alias_root { None } else { config.name.clone() },
            parent: parent.cloned(),
            redirect: if alias_root { None } else { config.redirect.clone() },
            alias_of: match_as.clone(),
            alias: if alias_root { Vec::new() } else { config.alias.clone() },
            before_enter: config.before_enter.clone(),
            meta: config.meta.clone(),
            props: config.props.clone(),
        });

        if let (Some(name), None) = (&record.name, &record.redirect) {
            if config
                .children
                .iter()
                .any(|child| child.path.is_empty() || child.path == "/")
            {
                self.warn(ConfigWarning::NamedRouteWithDefaultChild { name: name.clone() });
            }
        }

        // Children first, so an empty-path default child owns this path.
        for child in &config.children {
            let child_match_as = match_as
                .as_ref()
                .map(|m| clean_path(&format!("{m}/{}", child.path)));
            self.add_record(child, Some(&record), child_match_as, false);
        }

        if !self.path_map.contains_key(&record.path) {
            self.path_list.push(record.path.clone());
            self.path_map.insert(record.path.clone(), record.clone());
        }

        if !alias_root {
            for alias in &config.alias {
                if alias == &config.path {
                    self.warn(ConfigWarning::AliasSameAsPath {
                        path: alias.clone(),
                    });
                    continue;
                }

                let alias_config = RouteConfig {
                    path: alias.clone(),
                    ..config.clone()
                };
                self.add_record(
                    &alias_config,
                    parent,
                    Some(canonical_path(&record).to_string()),
                    true,
                );
            }
        }

        if let Some(name) = &record.name {
            if !self.name_map.contains_key(name) {
                self.name_map.insert(name.clone(), record.clone());
            } else if match_as.is_none() {
                self.warn(ConfigWarning::DuplicateName {
                    name: name.clone(),
                    path: record.path.clone(),
                });
            }
        }
    }

    fn move_catch_all_last(&mut self) {
        let (catch_all, specific): (Vec<String>, Vec<String>) = self
            .path_list
            .drain(..)
            .partition(|path| path == "*");
        self.path_list = specific;
        self.path_list.extend(catch_all);
    }
}

/// The path alias records resolve through: the record's path, or `/` for the
/// root record whose normalized path is empty.
fn canonical_path(record: &RouteRecord) -> &str {
    if record.path.is_empty() {
        "/"
    } else {
        &record.path
    }
}

/// Resolves a configured path against its parent's path.
///
/// A trailing `/` is dropped unless `strict`. Absolute paths are kept as is.
pub fn normalize_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let path = if strict {
        path
    } else {
        path.strip_suffix('/').unwrap_or(path)
    };

    if path.starts_with('/') {
        return path.to_string();
    }

    match parent {
        Some(parent) => clean_path(&format!("{parent}/{path}")),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    fn paths(table: &RouteTable) -> Vec<&str> {
        table.path_list().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/", None, false), "");
        assert_eq!(normalize_path("/a/", None, false), "/a");
        assert_eq!(normalize_path("/a/", None, true), "/a/");
        assert_eq!(normalize_path("child", Some("/parent"), false), "/parent/child");
        assert_eq!(normalize_path("", Some("/parent"), false), "/parent");
        assert_eq!(normalize_path("/abs", Some("/parent"), false), "/abs");
        assert_eq!(normalize_path("child", Some(""), false), "/child");
    }

    #[test]
    fn test_children_registered_before_parent() {
        let table = RouteTable::build(
            [RouteConfig::new("/users")
                .name("users")
                .child(RouteConfig::new(":id").name("user"))
                .child(RouteConfig::new("").name("users-index"))],
            PatternOptions::default(),
        );

        assert_eq!(paths(&table), vec!["/users/:id", "/users"]);
        // The default child owns the parent's path.
        let owner = table.record_by_path("/users").unwrap();
        assert_eq!(owner.name.as_deref(), Some("users-index"));
        assert_eq!(owner.parent.as_ref().unwrap().name.as_deref(), Some("users"));
        assert!(table
            .warnings()
            .contains(&ConfigWarning::NamedRouteWithDefaultChild { name: "users".into() }));
    }

    #[test]
    fn test_catch_all_is_last() {
        let table = RouteTable::build(
            [
                RouteConfig::new("*"),
                RouteConfig::new("/a"),
                RouteConfig::new("/b/*"),
            ],
            PatternOptions::default(),
        );
        assert_eq!(paths(&table), vec!["/a", "/b/*", "*"]);
    }

    #[test]
    fn test_first_registration_wins() {
        let table = RouteTable::build(
            [
                RouteConfig::new("/same").name("first"),
                RouteConfig::new("/same").name("second"),
                RouteConfig::new("/other").name("first"),
            ],
            PatternOptions::default(),
        );
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.record_by_path("/same").unwrap().name.as_deref(),
            Some("first")
        );
        assert_eq!(table.record_by_name("first").unwrap().path, "/same");
        assert!(table.warnings().contains(&ConfigWarning::DuplicateName {
            name: "first".into(),
            path: "/other".into(),
        }));
    }

    #[test]
    fn test_alias_records_share_components() {
        let table = RouteTable::build(
            [RouteConfig::new("/a")
                .name("a")
                .component(Component::new("A"))
                .alias("/b")
                .child(RouteConfig::new("c").name("c"))],
            PatternOptions::default(),
        );

        assert_eq!(paths(&table), vec!["/a/c", "/a", "/b/c", "/b"]);

        let alias = table.record_by_path("/b").unwrap();
        assert_eq!(alias.alias_of.as_deref(), Some("/a"));
        assert!(alias.is_alias());
        assert!(!table.record_by_path("/a").unwrap().is_alias());
        assert!(alias.name.is_none());
        assert_eq!(alias.components["default"].resolved().unwrap().name(), "A");

        let alias_child = table.record_by_path("/b/c").unwrap();
        assert_eq!(alias_child.alias_of.as_deref(), Some("/a/c"));
        assert!(Arc::ptr_eq(alias_child.parent.as_ref().unwrap(), alias));

        // The name stays with the canonical child, silently.
        assert_eq!(table.record_by_name("c").unwrap().path, "/a/c");
        assert!(table.warnings().is_empty());
    }

    #[test]
    fn test_alias_same_as_path_is_skipped() {
        let table = RouteTable::build(
            [RouteConfig::new("/a").alias("/a")],
            PatternOptions::default(),
        );
        assert_eq!(paths(&table), vec!["/a"]);
        assert_eq!(
            table.warnings(),
            &[ConfigWarning::AliasSameAsPath { path: "/a".into() }]
        );
    }

    #[test]
    fn test_invalid_pattern_is_skipped_with_warning() {
        let table = RouteTable::build(
            [RouteConfig::new("/ok"), RouteConfig::new("/bad/(")],
            PatternOptions::default(),
        );
        assert_eq!(paths(&table), vec!["/ok"]);
        assert!(matches!(
            table.warnings()[0],
            ConfigWarning::InvalidPattern { ref path, .. } if path == "/bad/("
        ));
    }

    #[test]
    fn test_duplicate_params_and_unencoded_paths_warn() {
        let table = RouteTable::build(
            [RouteConfig::new("/:id/:id"), RouteConfig::new("/café")],
            PatternOptions::default(),
        );
        assert_eq!(table.len(), 2);
        assert!(table.warnings().contains(&ConfigWarning::DuplicateParams {
            path: "/:id/:id".into(),
            names: vec!["id".into()],
        }));
        assert!(table
            .warnings()
            .contains(&ConfigWarning::UnencodedPath { path: "/café".into() }));
    }

    #[test]
    fn test_add_routes_merges() {
        let mut table = RouteTable::build([RouteConfig::new("*"), RouteConfig::new("/a")], PatternOptions::default());
        table.add_routes([RouteConfig::new("/b")]);
        assert_eq!(paths(&table), vec!["/a", "/b", "*"]);
    }

    #[test]
    fn test_routes_follow_match_priority() {
        let table = RouteTable::build(
            [
                RouteConfig::new("*"),
                RouteConfig::new("/a").children([RouteConfig::new("kid")]),
                RouteConfig::new("/b"),
            ],
            PatternOptions::default(),
        );
        let routes: Vec<String> = table.routes().iter().map(|r| r.path.clone()).collect();
        assert_eq!(routes, vec!["/a/kid", "/a", "/b", "*"]);
    }

    #[test]
    fn test_add_route_under_parent_and_its_aliases() {
        let mut table = RouteTable::build(
            [RouteConfig::new("/parent").name("parent").alias("/p")],
            PatternOptions::default(),
        );
        table.add_route(Some("parent"), RouteConfig::new("kid").name("kid"));

        let kid = table.record_by_name("kid").unwrap();
        assert_eq!(kid.path, "/parent/kid");
        assert_eq!(kid.parent.as_ref().unwrap().path, "/parent");

        let alias_kid = table.record_by_path("/p/kid").unwrap();
        assert_eq!(alias_kid.alias_of.as_deref(), Some("/parent/kid"));
    }

    #[test]
    fn test_add_route_unknown_parent() {
        let mut table = RouteTable::default();
        table.add_route(Some("ghost"), RouteConfig::new("/x"));
        assert_eq!(paths(&table), vec!["/x"]);
        assert_eq!(
            table.warnings(),
            &[ConfigWarning::UnknownParent { name: "ghost".into() }]
        );
    }

    #[test]
    fn test_case_sensitive_override() {
        let table = RouteTable::build(
            [RouteConfig::new("/Exact").case_sensitive(true)],
            PatternOptions::default(),
        );
        let record = table.record_by_path("/Exact").unwrap();
        assert!(record.pattern.is_match("/Exact"));
        assert!(!record.pattern.is_match("/exact"));
    }
}
