//! Navigation targets and their normalization.
//!
//! A [`Location`] is what callers hand to `push`/`replace`: either a raw
//! string such as `"/users/42?tab=posts#top"` or a structured target built
//! with the builder methods. [`normalize_location`] turns it into the
//! canonical form the matcher consumes.

use std::collections::BTreeMap;

use crate::pattern::fill_params;
use crate::query::{resolve_query, Query, QueryCodec, QueryValue};
use crate::route::Route;

/// Route parameters, keyed by parameter name.
pub type Params = BTreeMap<String, String>;

/// A navigation target.
///
/// `query` and `params` distinguish "not given" (`None`) from "given and
/// empty", which matters when a redirect decides what to carry over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// A route name. Takes precedence over `path`.
    pub name: Option<String>,
    /// A path, possibly relative and possibly carrying `?query` and `#hash`.
    pub path: Option<String>,
    /// Route parameters.
    pub params: Option<Params>,
    /// Explicit query. Wins over a query parsed from `path` key by key.
    pub query: Option<Query>,
    /// Fragment, with or without the leading `#`.
    pub hash: Option<String>,
    /// Resolve a relative `path` against the full current path rather than its directory.
    pub append: bool,
    /// Ask for a `replace` rather than a `push` when used as a redirect.
    pub replace: bool,
    /// Set once the location is in canonical form.
    pub normalized: bool,
}

impl Location {
    /// A path target.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A named target.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A params-only target, resolved relative to the current route.
    pub fn with_params_only(params: Params) -> Self {
        Self {
            params: Some(params),
            ..Self::default()
        }
    }

    /// Sets one parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces all parameters.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets one query value.
    #[must_use]
    pub fn query_value(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query
            .get_or_insert_with(Query::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces the whole query.
    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Sets the fragment.
    #[must_use]
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Resolves a relative path against the full current path.
    #[must_use]
    pub const fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    /// Marks the target as a replace.
    #[must_use]
    pub const fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

impl From<String> for Location {
    fn from(path: String) -> Self {
        Self::path(path)
    }
}

impl From<&String> for Location {
    fn from(path: &String) -> Self {
        Self::path(path.clone())
    }
}

/// A path split into its path, query string and hash parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Everything before `?` and `#`.
    pub path: String,
    /// The query string, without `?`.
    pub query: String,
    /// The hash, including `#`, or empty.
    pub hash: String,
}

/// Splits `raw` on the first `#`, then on the first `?` in what precedes it.
pub fn parse_path(raw: &str) -> ParsedPath {
    let (rest, hash) = raw
        .find('#')
        .map_or((raw, ""), |i| (&raw[..i], &raw[i..]));
    let (path, query) = rest
        .split_once('?')
        .unwrap_or((rest, ""));

    ParsedPath {
        path: path.to_string(),
        query: query.to_string(),
        hash: hash.to_string(),
    }
}

/// Resolves `relative` against `base`.
///
/// Absolute paths are returned unchanged and a bare `?query` or `#hash` is
/// appended to `base`. Otherwise `..` and `.` segments are applied to the
/// directory of `base`, or to all of `base` when `append` is set.
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    match relative.chars().next() {
        Some('/') => return relative.to_string(),
        Some('?' | '#') => return format!("{base}{relative}"),
        _ => {}
    }

    let mut stack: Vec<&str> = base.split('/').collect();
    if !append || stack.last().is_some_and(|s| s.is_empty()) {
        stack.pop();
    }

    for segment in relative.trim_start_matches('/').split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            other => stack.push(other),
        }
    }

    if stack.first() != Some(&"") {
        stack.insert(0, "");
    }

    stack.join("/")
}

/// Collapses runs of `/` into one.
pub fn clean_path(path: &str) -> String {
    let mut cleaned = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && cleaned.ends_with('/') {
            continue;
        }
        cleaned.push(c);
    }
    cleaned
}

/// Brings a navigation target into canonical form.
///
/// Cases are tried in order:
///
/// 1. An already normalized location is returned unchanged.
/// 2. A named location is returned as given, with its own copy of `params`.
/// 3. A params-only location (no path, or an empty one) with a `current`
///    route inherits `current`'s params and reuses its name, or regenerates
///    a path from its deepest matched record.
/// 4. Anything else has its path resolved against `current`'s path, its
///    query parsed and merged with the explicit `query`, and its hash
///    prefixed with `#`.
pub fn normalize_location(
    raw: &Location,
    current: Option<&Route>,
    append: bool,
    codec: &dyn QueryCodec,
) -> Location {
    if raw.normalized {
        return raw.clone();
    }

    if raw.name.is_some() {
        return raw.clone();
    }

    let no_path = raw.path.as_deref().map_or(true, str::is_empty);
    if let (true, Some(params), Some(current)) = (no_path, &raw.params, current) {
        let mut next = raw.clone();
        next.path = None;
        next.normalized = true;

        let mut merged = current.params.clone();
        merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

        if let Some(name) = &current.name {
            next.name = Some(name.clone());
            next.params = Some(merged);
        } else if let Some(leaf) = current.matched.last() {
            next.path = Some(fill_params(
                &leaf.pattern,
                &merged,
                &format!("path {}", current.path),
            ));
        } else {
            tracing::warn!("relative params navigation requires a current route");
        }
        return next;
    }

    let parsed = parse_path(raw.path.as_deref().unwrap_or(""));
    let base = current
        .map(|c| c.path.as_str())
        .filter(|p| !p.is_empty())
        .unwrap_or("/");

    let path = if parsed.path.is_empty() {
        base.to_string()
    } else {
        resolve_path(&parsed.path, base, append || raw.append)
    };

    let query = resolve_query(&parsed.query, raw.query.as_ref(), codec);

    let hash = raw
        .hash
        .as_deref()
        .filter(|h| !h.is_empty())
        .unwrap_or(parsed.hash.as_str());
    let hash = if hash.is_empty() || hash.starts_with('#') {
        hash.to_string()
    } else {
        format!("#{hash}")
    };

    Location {
        path: Some(path),
        query: Some(query),
        hash: (!hash.is_empty()).then_some(hash),
        replace: raw.replace,
        normalized: true,
        ..Location::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::DefaultQueryCodec;

    fn normalize(raw: impl Into<Location>, current: Option<&Route>) -> Location {
        normalize_location(&raw.into(), current, false, &DefaultQueryCodec)
    }

    #[test]
    fn test_parse_path() {
        let parsed = parse_path("/a/b?x=1&y#frag?not-query");
        assert_eq!(parsed.path, "/a/b");
        assert_eq!(parsed.query, "x=1&y");
        assert_eq!(parsed.hash, "#frag?not-query");

        let bare = parse_path("/plain");
        assert_eq!(bare.query, "");
        assert_eq!(bare.hash, "");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/abs", "/base/x", false), "/abs");
        assert_eq!(resolve_path("?q=1", "/base/x", false), "/base/x?q=1");
        assert_eq!(resolve_path("#top", "/base/x", false), "/base/x#top");
        assert_eq!(resolve_path("sibling", "/base/x", false), "/base/sibling");
        assert_eq!(resolve_path("child", "/base/x", true), "/base/x/child");
        assert_eq!(resolve_path("child", "/base/", true), "/base/child");
        assert_eq!(resolve_path("../up", "/a/b/c", false), "/a/up");
        assert_eq!(resolve_path("./here", "/a/b", false), "/a/here");
        assert_eq!(resolve_path("../../../x", "/a/b", false), "/x");
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("//a///b/"), "/a/b/");
        assert_eq!(clean_path("/a/b"), "/a/b");
    }

    #[test]
    fn test_normalize_string_target() {
        let loc = normalize("/users/42?tab=posts&tab=likes#top", None);
        assert!(loc.normalized);
        assert_eq!(loc.path.as_deref(), Some("/users/42"));
        assert_eq!(loc.hash.as_deref(), Some("#top"));
        assert_eq!(
            loc.query.unwrap()["tab"],
            QueryValue::List(vec![Some("posts".into()), Some("likes".into())])
        );
    }

    #[test]
    fn test_explicit_query_wins_per_key() {
        let raw = Location::path("/s?a=1&b=2").query_value("b", "3");
        let loc = normalize(raw, None);
        let query = loc.query.unwrap();
        assert_eq!(query["a"], QueryValue::from("1"));
        assert_eq!(query["b"], QueryValue::from("3"));
    }

    #[test]
    fn test_hash_gets_prefix() {
        let loc = normalize(Location::path("/a").hash("section"), None);
        assert_eq!(loc.hash.as_deref(), Some("#section"));
        let empty = normalize(Location::path("/a").hash(""), None);
        assert_eq!(empty.hash, None);
    }

    #[test]
    fn test_empty_path_uses_root() {
        let loc = normalize(Location::default().query_value("q", "1"), None);
        assert_eq!(loc.path.as_deref(), Some("/"));
    }

    #[test]
    fn test_named_target_passes_through() {
        let raw = Location::named("user").param("id", "1").query_value("x", "y");
        let loc = normalize(raw.clone(), None);
        assert_eq!(loc, raw);
        assert!(!loc.normalized);
    }

    #[test]
    fn test_idempotent() {
        let raws = [
            Location::from("/a/../b?x=1#h"),
            Location::named("home"),
            Location::path("rel").hash("x").appending(),
            Location::default(),
        ];
        for raw in raws {
            let once = normalize(raw, None);
            let twice = normalize(once.clone(), None);
            assert_eq!(once, twice);
        }
    }
}
