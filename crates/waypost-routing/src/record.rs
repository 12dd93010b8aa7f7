//! Route configuration input and compiled route records.
//!
//! [`RouteConfig`] is the declarative, builder-style description callers write.
//! The route table compiles each config node into an immutable
//! [`RouteRecord`]: an absolute path, its compiled pattern, the components
//! per view, and a link to the parent record.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::component::{ComponentRef, DEFAULT_VIEW};
use crate::guard::NavigationGuard;
use crate::location::Location;
use crate::pattern::{PathPattern, PatternOptions};
use crate::route::Route;

/// Identifies a record within one route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Computes a redirect target from the route being redirected.
pub type RedirectFn = Arc<dyn Fn(&Route) -> Location + Send + Sync>;

/// Computes props from the matched route.
pub type PropsFn = Arc<dyn Fn(&Route) -> Value + Send + Sync>;

/// Where a record redirects to.
#[derive(Clone)]
pub enum Redirect {
    /// A fixed target: a path (relative paths resolve against the parent
    /// record) or a name, optionally with query, hash and params overrides.
    To(Location),
    /// A target computed from the provisional route.
    Dynamic(RedirectFn),
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To(loc) => f.debug_tuple("To").field(loc).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<Location> for Redirect {
    fn from(target: Location) -> Self {
        Self::To(target)
    }
}

impl From<&str> for Redirect {
    fn from(path: &str) -> Self {
        Self::To(Location::path(path))
    }
}

impl From<String> for Redirect {
    fn from(path: String) -> Self {
        Self::To(Location::path(path))
    }
}

/// How a view receives props from the route.
#[derive(Clone, Default)]
pub enum PropsSpec {
    /// No props.
    #[default]
    Disabled,
    /// The route params, as a JSON object.
    Params,
    /// A fixed value.
    Static(Value),
    /// A value computed from the route.
    Dynamic(PropsFn),
}

impl fmt::Debug for PropsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Params => f.write_str("Params"),
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl PropsSpec {
    /// Evaluates the props for `route`.
    pub fn evaluate(&self, route: &Route) -> Option<Value> {
        match self {
            Self::Disabled => None,
            Self::Params => Some(Value::Object(
                route
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )),
            Self::Static(value) => Some(value.clone()),
            Self::Dynamic(func) => Some(func(route)),
        }
    }
}

/// A declarative route definition.
///
/// # Examples
///
/// ```
/// use waypost_routing::component::Component;
/// use waypost_routing::record::RouteConfig;
///
/// let config = RouteConfig::new("/users/:id")
///     .name("user")
///     .component(Component::new("User"))
///     .alias("/u/:id")
///     .child(RouteConfig::new("posts").component(Component::new("UserPosts")));
/// assert_eq!(config.children_configs().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct RouteConfig {
    pub(crate) path: String,
    pub(crate) name: Option<String>,
    pub(crate) components: BTreeMap<String, ComponentRef>,
    pub(crate) redirect: Option<Redirect>,
    pub(crate) alias: Vec<String>,
    pub(crate) children: Vec<RouteConfig>,
    pub(crate) before_enter: Option<Arc<dyn NavigationGuard>>,
    pub(crate) meta: Value,
    pub(crate) props: BTreeMap<String, PropsSpec>,
    pub(crate) case_sensitive: Option<bool>,
    pub(crate) pattern_options: Option<PatternOptions>,
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("components", &self.components)
            .field("redirect", &self.redirect)
            .field("alias", &self.alias)
            .field("children", &self.children)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl RouteConfig {
    /// Starts a config for `path`. Paths not starting with `/` are relative
    /// to the parent route.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            meta: Value::Null,
            ..Self::default()
        }
    }

    /// Names the route.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the component of the default view.
    #[must_use]
    pub fn component(self, component: impl Into<ComponentRef>) -> Self {
        self.view(DEFAULT_VIEW, component)
    }

    /// Sets the component of a named view.
    #[must_use]
    pub fn view(mut self, view: impl Into<String>, component: impl Into<ComponentRef>) -> Self {
        self.components.insert(view.into(), component.into());
        self
    }

    /// Redirects this route elsewhere.
    #[must_use]
    pub fn redirect(mut self, redirect: impl Into<Redirect>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    /// Redirects to a target computed from the matched route.
    #[must_use]
    pub fn redirect_with<F>(mut self, func: F) -> Self
    where
        F: Fn(&Route) -> Location + Send + Sync + 'static,
    {
        self.redirect = Some(Redirect::Dynamic(Arc::new(func)));
        self
    }

    /// Adds an alias path.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    /// Adds a nested route.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Adds several nested routes.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Sets the guard run before this route is entered.
    #[must_use]
    pub fn before_enter(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.before_enter = Some(guard);
        self
    }

    /// Attaches an opaque payload.
    #[must_use]
    pub fn meta(mut self, meta: Value) -> Self {
        self.meta = meta;
        self
    }

    /// Sets how the default view receives props.
    #[must_use]
    pub fn props(self, props: PropsSpec) -> Self {
        self.view_props(DEFAULT_VIEW, props)
    }

    /// Sets how a named view receives props.
    #[must_use]
    pub fn view_props(mut self, view: impl Into<String>, props: PropsSpec) -> Self {
        self.props.insert(view.into(), props);
        self
    }

    /// Overrides case sensitivity for this route's pattern.
    #[must_use]
    pub const fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    /// Overrides the pattern options for this route.
    #[must_use]
    pub const fn pattern_options(mut self, options: PatternOptions) -> Self {
        self.pattern_options = Some(options);
        self
    }

    /// The configured path, as written.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The nested routes.
    pub fn children_configs(&self) -> &[Self] {
        &self.children
    }
}

/// A compiled route.
///
/// Records are immutable once built and shared as `Arc<RouteRecord>`. A
/// record's identity (pointer equality) is what the navigation pipeline
/// compares when it diffs two matched chains.
pub struct RouteRecord {
    /// Unique within the owning table.
    pub id: RecordId,
    /// The absolute path pattern, including parent segments.
    pub path: String,
    /// The compiled form of `path`.
    pub pattern: PathPattern,
    /// Components per view name.
    pub components: BTreeMap<String, ComponentRef>,
    /// The route name.
    pub name: Option<String>,
    /// The owning record, for nested routes.
    pub parent: Option<Arc<RouteRecord>>,
    /// Where this record redirects to.
    pub redirect: Option<Redirect>,
    /// For alias records, the canonical path this record resolves through.
    pub alias_of: Option<String>,
    /// Configured aliases.
    pub alias: Vec<String>,
    /// Guard run before this record is entered.
    pub before_enter: Option<Arc<dyn NavigationGuard>>,
    /// Opaque user payload.
    pub meta: Value,
    /// Props per view name.
    pub props: BTreeMap<String, PropsSpec>,
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.id))
            .field("alias_of", &self.alias_of)
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

impl RouteRecord {
    /// Returns the chain from the root record down to `record`.
    pub fn chain(record: &Arc<Self>) -> Vec<Arc<Self>> {
        let mut chain = vec![record.clone()];
        let mut current = record.parent.clone();
        while let Some(parent) = current {
            current = parent.parent.clone();
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// Returns the props `view` receives for `route`.
    pub fn props_for(&self, view: &str, route: &Route) -> Option<Value> {
        self.props.get(view).and_then(|spec| spec.evaluate(route))
    }

    /// Returns `true` for records created by alias expansion.
    pub const fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::component::Component;

    #[test]
    fn test_builder_collects_fields() {
        let config = RouteConfig::new("/a")
            .name("a")
            .component(Component::new("A"))
            .view("sidebar", Component::new("Side"))
            .alias("/b")
            .alias("/c")
            .redirect("/elsewhere")
            .meta(json!({"auth": true}))
            .props(PropsSpec::Params)
            .case_sensitive(true);

        assert_eq!(config.path(), "/a");
        assert_eq!(config.name.as_deref(), Some("a"));
        assert_eq!(config.components.len(), 2);
        assert_eq!(config.alias, vec!["/b", "/c"]);
        assert!(matches!(config.redirect, Some(Redirect::To(_))));
        assert_eq!(config.meta["auth"], json!(true));
        assert_eq!(config.case_sensitive, Some(true));
    }

    #[test]
    fn test_new_config_has_null_meta() {
        assert_eq!(RouteConfig::new("/").meta, Value::Null);
    }

    #[test]
    fn test_props_evaluation() {
        let mut route = Route::start();
        route.params.insert("id".into(), "7".into());

        assert_eq!(PropsSpec::Disabled.evaluate(&route), None);
        assert_eq!(PropsSpec::Params.evaluate(&route), Some(json!({"id": "7"})));
        assert_eq!(
            PropsSpec::Static(json!({"x": 1})).evaluate(&route),
            Some(json!({"x": 1}))
        );
        let dynamic = PropsSpec::Dynamic(Arc::new(|r: &Route| json!(r.params.len())));
        assert_eq!(dynamic.evaluate(&route), Some(json!(1)));
    }

    #[test]
    fn test_redirect_from_str() {
        let redirect = Redirect::from("/new");
        match redirect {
            Redirect::To(loc) => assert_eq!(loc.path.as_deref(), Some("/new")),
            Redirect::Dynamic(_) => panic!("expected a fixed redirect"),
        }
    }
}
