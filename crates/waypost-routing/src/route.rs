//! Resolved route snapshots.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::location::{Location, Params};
use crate::query::{Query, QueryCodec};
use crate::record::RouteRecord;

/// The fully resolved outcome of matching a location.
///
/// A `Route` is built fresh by the matcher on every resolution and never
/// mutated afterwards by the router. An unmatched target yields a route with
/// an empty [`matched`](Self::matched) chain.
#[derive(Clone)]
pub struct Route {
    /// The location's name, or the matched record's.
    pub name: Option<String>,
    /// The leaf record's meta, or `Null`.
    pub meta: Value,
    /// The resolved path.
    pub path: String,
    /// The fragment, including `#`, or empty.
    pub hash: String,
    /// The parsed query.
    pub query: Query,
    /// The route parameters.
    pub params: Params,
    /// `path` followed by the serialized query and the hash.
    pub full_path: String,
    /// The records from the root to the leaf.
    pub matched: Vec<Arc<RouteRecord>>,
    /// The full path of the location that redirected here.
    pub redirected_from: Option<String>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("full_path", &self.full_path)
            .field("params", &self.params)
            .field(
                "matched",
                &self.matched.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
            )
            .field("redirected_from", &self.redirected_from)
            .finish_non_exhaustive()
    }
}

impl Route {
    /// The route in effect before the first navigation commits.
    pub fn start() -> Self {
        Self {
            name: None,
            meta: Value::Null,
            path: String::new(),
            hash: String::new(),
            query: Query::new(),
            params: Params::new(),
            full_path: String::new(),
            matched: Vec::new(),
            redirected_from: None,
        }
    }

    /// Builds a snapshot for `location` matched to `record`.
    pub fn create(
        record: Option<&Arc<RouteRecord>>,
        location: &Location,
        redirected_from: Option<&Location>,
        codec: &dyn QueryCodec,
    ) -> Self {
        let path = location
            .path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or("/")
            .to_string();
        let hash = location.hash.clone().unwrap_or_default();
        let query = location.query.clone().unwrap_or_default();

        Self {
            name: location
                .name
                .clone()
                .or_else(|| record.and_then(|r| r.name.clone())),
            meta: record.map_or(Value::Null, |r| r.meta.clone()),
            full_path: format!("{path}{}{hash}", codec.stringify(&query)),
            path,
            hash,
            query,
            params: location.params.clone().unwrap_or_default(),
            matched: record.map(RouteRecord::chain).unwrap_or_default(),
            redirected_from: redirected_from.map(|loc| full_path_of(loc, codec)),
        }
    }

    /// Returns `true` for the pre-navigation sentinel.
    pub fn is_start(&self) -> bool {
        self.path.is_empty() && self.name.is_none() && self.matched.is_empty()
    }

    /// Returns `true` if the target matched no record.
    pub fn is_unmatched(&self) -> bool {
        self.matched.is_empty()
    }

    /// The deepest matched record.
    pub fn leaf(&self) -> Option<&Arc<RouteRecord>> {
        self.matched.last()
    }

    /// The leaf record's meta.
    pub const fn meta(&self) -> &Value {
        &self.meta
    }
}

/// Serializes a location as `path?query#hash`.
pub fn full_path_of(location: &Location, codec: &dyn QueryCodec) -> String {
    let path = location
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or("/");
    let query = location
        .query
        .as_ref()
        .map(|q| codec.stringify(q))
        .unwrap_or_default();
    let hash = location.hash.as_deref().unwrap_or("");
    format!("{path}{query}{hash}")
}

fn trim_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// Returns `true` when `a` and `b` describe the same navigation target.
///
/// Routes with paths compare path (ignoring one trailing slash), hash and
/// query. Otherwise routes with names compare name, hash, query and params.
pub fn is_same_route(a: &Route, b: &Route) -> bool {
    if b.is_start() || a.is_start() {
        return a.is_start() && b.is_start();
    }
    if !a.path.is_empty() && !b.path.is_empty() {
        return trim_trailing_slash(&a.path) == trim_trailing_slash(&b.path)
            && a.hash == b.hash
            && a.query == b.query;
    }
    match (&a.name, &b.name) {
        (Some(x), Some(y)) => x == y && a.hash == b.hash && a.query == b.query && a.params == b.params,
        _ => false,
    }
}

/// Returns `true` when `current` is `target` or nested below it.
///
/// The path must start with the target's path, the hash must agree when the
/// target has one, and every query key of the target must be present with the
/// same value.
pub fn is_included_route(current: &Route, target: &Route) -> bool {
    let current_path = format!("{}/", trim_trailing_slash(&current.path));
    let target_path = format!("{}/", trim_trailing_slash(&target.path));

    current_path.starts_with(&target_path)
        && (target.hash.is_empty() || current.hash == target.hash)
        && target
            .query
            .iter()
            .all(|(key, value)| current.query.get(key) == Some(value))
}
