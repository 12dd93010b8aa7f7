//! Resolving locations against the route table.
//!
//! [`Matcher::match_route`] always produces a [`Route`]. A target that matches
//! nothing yields a route with an empty `matched` chain; callers detect "no
//! match" by inspecting that chain rather than through an error.
//!
//! Resolution follows redirects and aliases by re-matching. Each re-match
//! counts as a hop, and a chain longer than the configured limit stops with a
//! warning and an unmatched route.

use std::fmt;
use std::sync::Arc;

use waypost_core::Settings;

use crate::location::{normalize_location, parse_path, resolve_path, Location, Params};
use crate::pattern::{fill_params, fill_path, PatternOptions};
use crate::query::{resolve_query, DefaultQueryCodec, QueryCodec};
use crate::record::{Redirect, RouteConfig, RouteRecord};
use crate::route::{full_path_of, Route};
use crate::table::{ConfigWarning, RouteTable};

/// Default bound on redirect and alias hops for one resolution.
pub const DEFAULT_MAX_REDIRECTS: usize = 16;

/// Resolves navigation targets to routes.
///
/// # Examples
///
/// ```
/// use waypost_routing::matcher::Matcher;
/// use waypost_routing::record::RouteConfig;
///
/// let matcher = Matcher::new([
///     RouteConfig::new("/users/:id").name("user"),
///     RouteConfig::new("/old").redirect("/users/1"),
/// ]);
///
/// let route = matcher.match_route(&"/old".into(), None);
/// assert_eq!(route.path, "/users/1");
/// assert_eq!(route.params["id"], "1");
/// assert_eq!(route.redirected_from.as_deref(), Some("/old"));
/// ```
pub struct Matcher {
    table: RouteTable,
    codec: Arc<dyn QueryCodec>,
    max_redirects: usize,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("table", &self.table)
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

impl Matcher {
    /// Builds a matcher over `routes` with default options.
    pub fn new(routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        Self::from_table(RouteTable::build(routes, PatternOptions::default()))
    }

    /// Builds a matcher over `routes` using the pattern options and redirect
    /// limit from `settings`.
    pub fn from_settings(routes: impl IntoIterator<Item = RouteConfig>, settings: &Settings) -> Self {
        let options = PatternOptions {
            sensitive: settings.sensitive,
            strict: settings.strict,
            end: true,
        };
        Self::from_table(RouteTable::build(routes, options)).with_max_redirects(settings.max_redirects)
    }

    /// Wraps an existing table.
    pub fn from_table(table: RouteTable) -> Self {
        Self {
            table,
            codec: Arc::new(DefaultQueryCodec),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Replaces the query codec.
    #[must_use]
    pub fn with_query_codec(mut self, codec: Arc<dyn QueryCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Sets the redirect and alias hop limit.
    #[must_use]
    pub const fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// The query codec in use.
    pub fn codec(&self) -> &dyn QueryCodec {
        self.codec.as_ref()
    }

    /// The route table.
    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Merges more routes into the table.
    pub fn add_routes(&mut self, routes: impl IntoIterator<Item = RouteConfig>) {
        self.table.add_routes(routes);
    }

    /// Adds one route, optionally under a named parent.
    pub fn add_route(&mut self, parent: Option<&str>, route: RouteConfig) {
        self.table.add_route(parent, route);
    }

    /// All records, in match-priority order.
    pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
        self.table.routes()
    }

    /// Configuration warnings collected while building the table.
    pub fn warnings(&self) -> &[ConfigWarning] {
        self.table.warnings()
    }

    /// Resolves `raw` relative to `current`.
    pub fn match_route(&self, raw: &Location, current: Option<&Route>) -> Route {
        self.match_location(raw, current, None, 0)
    }

    /// Resolves `raw`, recording `redirected_from` as the original request.
    pub fn match_redirected(
        &self,
        raw: &Location,
        current: Option<&Route>,
        redirected_from: &Location,
    ) -> Route {
        self.match_location(raw, current, Some(redirected_from), 0)
    }

    fn match_location(
        &self,
        raw: &Location,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
        hops: usize,
    ) -> Route {
        let mut location = normalize_location(raw, current, false, self.codec());

        if let Some(name) = location.name.clone() {
            let Some(record) = self.table.record_by_name(&name) else {
                tracing::warn!(name = %name, "route with name does not exist");
                return self.create_route(None, &location, None, hops);
            };

            let required = record.pattern.required_param_names();
            let params = location.params.get_or_insert_with(Params::new);
            if let Some(current) = current {
                for (key, value) in &current.params {
                    if !params.contains_key(key) && required.contains(key) {
                        params.insert(key.clone(), value.clone());
                    }
                }
            }

            let path = fill_params(&record.pattern, params, &format!("named route \"{name}\""));
            location.path = Some(path);
            return self.create_route(Some(record), &location, redirected_from, hops);
        }

        if let Some(path) = location.path.clone().filter(|p| !p.is_empty()) {
            for record in self.table.ordered() {
                if let Some(params) = record.pattern.match_path(&path) {
                    location.params = Some(params);
                    return self.create_route(Some(record), &location, redirected_from, hops);
                }
            }
            location.params = Some(Params::new());
        }

        self.create_route(None, &location, None, hops)
    }

    fn create_route(
        &self,
        record: Option<&Arc<RouteRecord>>,
        location: &Location,
        redirected_from: Option<&Location>,
        hops: usize,
    ) -> Route {
        if let Some(record) = record {
            if let Some(redirect) = &record.redirect {
                return self.redirect(record, redirect, redirected_from.unwrap_or(location), hops);
            }
            if let Some(match_as) = &record.alias_of {
                return self.alias(record, match_as, location, redirected_from, hops);
            }
        }
        Route::create(record, location, redirected_from, self.codec())
    }

    fn hop_limit_reached(&self, hops: usize, location: &Location) -> bool {
        if hops < self.max_redirects {
            return false;
        }
        tracing::warn!(
            target_path = %full_path_of(location, self.codec()),
            max_redirects = self.max_redirects,
            "redirect limit exceeded, giving up on this location"
        );
        true
    }

    fn redirect(
        &self,
        record: &Arc<RouteRecord>,
        redirect: &Redirect,
        location: &Location,
        hops: usize,
    ) -> Route {
        if self.hop_limit_reached(hops, location) {
            return Route::create(None, location, None, self.codec());
        }

        let target = match redirect {
            Redirect::To(target) => target.clone(),
            Redirect::Dynamic(func) => func(&Route::create(Some(record), location, None, self.codec())),
        };

        let params = target.params.clone().or_else(|| location.params.clone());

        if let Some(name) = target.name {
            if self.table.record_by_name(&name).is_none() {
                tracing::warn!(name = %name, "redirect failed: named route not found");
            }
            let next = Location {
                name: Some(name),
                params,
                query: target.query.or_else(|| location.query.clone()),
                hash: prefixed_hash(target.hash.or_else(|| location.hash.clone())),
                normalized: true,
                ..Location::default()
            };
            return self.match_location(&next, None, Some(location), hops + 1);
        }

        if let Some(path) = target.path.filter(|p| !p.is_empty()) {
            let parsed = parse_path(&path);
            let base = record.parent.as_ref().map_or("/", |p| p.path.as_str());
            let raw_path = resolve_path(&parsed.path, base, true);
            let resolved = fill_path(
                &raw_path,
                &params.unwrap_or_default(),
                &format!("redirect route with path \"{raw_path}\""),
            );

            let query = match target.query {
                Some(query) => Some(query),
                None if !parsed.query.is_empty() => {
                    Some(resolve_query(&parsed.query, None, self.codec()))
                }
                None => location.query.clone(),
            };
            let hash = target
                .hash
                .or_else(|| (!parsed.hash.is_empty()).then_some(parsed.hash))
                .or_else(|| location.hash.clone());

            let next = Location {
                path: Some(resolved),
                query,
                hash: prefixed_hash(hash),
                normalized: true,
                ..Location::default()
            };
            return self.match_location(&next, None, Some(location), hops + 1);
        }

        tracing::warn!(record = %record.path, "invalid redirect option");
        Route::create(None, location, None, self.codec())
    }

    fn alias(
        &self,
        record: &Arc<RouteRecord>,
        match_as: &str,
        location: &Location,
        redirected_from: Option<&Location>,
        hops: usize,
    ) -> Route {
        if self.hop_limit_reached(hops, location) {
            return Route::create(None, location, None, self.codec());
        }

        let params = location.params.clone().unwrap_or_default();
        let context = format!("aliased route with path \"{match_as}\"");
        let aliased_path = match self.table.record_by_path(match_as) {
            Some(canonical) => fill_params(&canonical.pattern, &params, &context),
            None => fill_path(match_as, &params, &context),
        };

        let aliased = self.match_location(
            &Location {
                path: Some(aliased_path),
                normalized: true,
                ..Location::default()
            },
            None,
            None,
            hops + 1,
        );

        let Some(aliased_leaf) = aliased.leaf() else {
            return Route::create(None, location, None, self.codec());
        };

        // A canonical route that redirected elsewhere is reported as its target.
        let leaf = if aliased.redirected_from.is_some() {
            aliased_leaf
        } else {
            record
        };

        let mut location = location.clone();
        location.params = Some(aliased.params.clone());
        Route::create(Some(leaf), &location, redirected_from, self.codec())
    }
}

fn prefixed_hash(hash: Option<String>) -> Option<String> {
    hash.filter(|h| !h.is_empty()).map(|h| {
        if h.starts_with('#') {
            h
        } else {
            format!("#{h}")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryValue;

    fn matcher() -> Matcher {
        Matcher::new([
            RouteConfig::new("/").name("home"),
            RouteConfig::new("/users/:id")
                .name("user")
                .child(RouteConfig::new("posts/:post?").name("user-posts")),
            RouteConfig::new("/old").redirect("/users/1"),
            RouteConfig::new("*").name("not-found"),
        ])
    }

    fn at(matcher: &Matcher, path: &str) -> Route {
        matcher.match_route(&Location::from(path), None)
    }

    #[test]
    fn test_match_by_path() {
        let m = matcher();
        let route = at(&m, "/users/42?tab=a#top");
        assert_eq!(route.name.as_deref(), Some("user"));
        assert_eq!(route.params["id"], "42");
        assert_eq!(route.query["tab"], QueryValue::from("a"));
        assert_eq!(route.full_path, "/users/42?tab=a#top");
        assert_eq!(route.matched.len(), 1);
    }

    #[test]
    fn test_nested_chain() {
        let m = matcher();
        let route = at(&m, "/users/7/posts/3");
        let chain: Vec<&str> = route.matched.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(chain, vec!["/users/:id", "/users/:id/posts/:post?"]);
        assert_eq!(route.params["post"], "3");
    }

    #[test]
    fn test_root_route() {
        let m = matcher();
        let route = at(&m, "/");
        assert_eq!(route.name.as_deref(), Some("home"));
        assert_eq!(route.path, "/");
    }

    #[test]
    fn test_catch_all_exposes_path_match() {
        let m = matcher();
        let route = at(&m, "/nope/really");
        assert_eq!(route.name.as_deref(), Some("not-found"));
        assert_eq!(route.params["pathMatch"], "/nope/really");
    }

    #[test]
    fn test_unmatched_yields_empty_chain() {
        let m = Matcher::new([RouteConfig::new("/only")]);
        let route = at(&m, "/missing?x=1");
        assert!(route.is_unmatched());
        assert_eq!(route.path, "/missing");
        assert_eq!(route.full_path, "/missing?x=1");
    }

    #[test]
    fn test_match_by_name_fills_params() {
        let m = matcher();
        let route = m.match_route(&Location::named("user").param("id", "a b"), None);
        assert_eq!(route.path, "/users/a%20b");
        assert_eq!(route.params["id"], "a b");
    }

    #[test]
    fn test_named_match_inherits_required_params_from_current() {
        let m = matcher();
        let current = at(&m, "/users/9");
        let route = m.match_route(&Location::named("user-posts"), Some(&current));
        assert_eq!(route.path, "/users/9/posts");
    }

    #[test]
    fn test_unknown_name_is_unmatched() {
        let m = matcher();
        let route = m.match_route(&Location::named("ghost"), None);
        assert!(route.is_unmatched());
        assert_eq!(route.name.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_relative_params_reuse_current_name() {
        let m = matcher();
        let current = at(&m, "/users/1/posts/2");
        let route = m.match_route(
            &Location::with_params_only(Params::from([("post".to_string(), "5".to_string())])),
            Some(&current),
        );
        assert_eq!(route.path, "/users/1/posts/5");
    }

    #[test]
    fn test_relative_params_without_name_regenerate_path() {
        let m = Matcher::new([RouteConfig::new("/items/:id")]);
        let current = at(&m, "/items/1");
        let route = m.match_route(
            &Location::with_params_only(Params::from([("id".to_string(), "2".to_string())])),
            Some(&current),
        );
        assert_eq!(route.path, "/items/2");
        assert_eq!(route.params["id"], "2");
    }

    #[test]
    fn test_relative_params_with_empty_path() {
        let m = Matcher::new([RouteConfig::new("/items/:id")]);
        let current = at(&m, "/items/1");
        let target = Location {
            path: Some(String::new()),
            params: Some(Params::from([("id".to_string(), "2".to_string())])),
            ..Location::default()
        };

        let route = m.match_route(&target, Some(&current));
        assert_eq!(route.path, "/items/2");
        assert_eq!(route.params["id"], "2");
    }

    #[test]
    fn test_static_redirect() {
        let m = matcher();
        let route = at(&m, "/old?keep=1");
        assert_eq!(route.path, "/users/1");
        assert_eq!(route.query["keep"], QueryValue::from("1"));
        assert_eq!(route.redirected_from.as_deref(), Some("/old?keep=1"));
    }

    #[test]
    fn test_redirect_loop_is_bounded() {
        let m = Matcher::new([
            RouteConfig::new("/ping").redirect("/pong"),
            RouteConfig::new("/pong").redirect("/ping"),
        ])
        .with_max_redirects(4);
        let route = at(&m, "/ping");
        assert!(route.is_unmatched());
    }

    #[test]
    fn test_mutual_aliases_resolve_through_first_registration() {
        let m = Matcher::new([RouteConfig::new("/a").alias("/b"), RouteConfig::new("/b").alias("/a")]);
        // "/b" is owned by the first alias record, which points at "/a".
        let route = at(&m, "/b");
        assert_eq!(route.leaf().unwrap().path, "/b");
    }
}
