//! The router.
//!
//! [`Router`] ties the matcher, the guard pipeline, a [`History`] backend and
//! the hook registries together. Navigations are plain `async` calls: each
//! resolves to the committed [`Route`] or to the [`NavigationFailure`] that
//! stopped it. Several navigations may be in flight at once; the last one
//! started is the only one that can commit.
//!
//! ## Example
//!
//! ```
//! use waypost_navigation::{Router, RouterOptions};
//! use waypost_routing::RouteConfig;
//!
//! # tokio_test::block_on(async {
//! let router = Router::new(RouterOptions::new([
//!     RouteConfig::new("/").name("home"),
//!     RouteConfig::new("/users/:id").name("user"),
//! ]));
//!
//! let route = router.push("/users/42").await.unwrap();
//! assert_eq!(route.params["id"], "42");
//! assert_eq!(router.current_route().full_path, "/users/42");
//! # });
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};

use tracing::Instrument;
use waypost_core::logging::navigation_span;
use waypost_core::settings::{RouterMode, Settings};
use waypost_core::{WaypostError, WaypostResult};
use waypost_routing::guard::NavigationGuard;
use waypost_routing::location::{normalize_location, Location};
use waypost_routing::query::QueryCodec;
use waypost_routing::record::{RouteConfig, RouteRecord};
use waypost_routing::route::{is_same_route, Route};
use waypost_routing::table::ConfigWarning;
use waypost_routing::Matcher;

use crate::failure::{NavigationFailure, NavigationFailureType};
use crate::history::{AddressBar, BrowserHistory, HashHistory, History, MemoryHistory};
use crate::hooks::{AfterHook, ErrorHook, HookId, HookIds, Hooks, ReadyState, RouteListener};
use crate::instances::InstanceRegistry;
use crate::pipeline::{
    first_queue, pending_components, resolve_components, resolve_queue, run_queue, second_queue,
    spawn_post_commit, Markers, NavigationType, PollPolicy, PostCommit, Stop,
};

/// Everything a [`Router`] is built from.
pub struct RouterOptions {
    routes: Vec<RouteConfig>,
    settings: Settings,
    history: Option<Box<dyn History>>,
    query_codec: Option<Arc<dyn QueryCodec>>,
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("routes", &self.routes.len())
            .field("settings", &self.settings)
            .field("history", &self.history.as_ref().map(|h| h.mode()))
            .finish_non_exhaustive()
    }
}

impl RouterOptions {
    /// Options for `routes` with default settings and in-memory history.
    pub fn new(routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
            settings: Settings::default(),
            history: None,
            query_codec: None,
        }
    }

    /// Sets the router settings.
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the history backend.
    #[must_use]
    pub fn history(mut self, history: impl History + 'static) -> Self {
        self.history = Some(Box::new(history));
        self
    }

    /// Replaces the default query codec.
    #[must_use]
    pub fn query_codec(mut self, codec: Arc<dyn QueryCodec>) -> Self {
        self.query_codec = Some(codec);
        self
    }
}

/// The outcome of [`Router::resolve`].
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The normalized target.
    pub location: Location,
    /// The route the target matches.
    pub route: Route,
    /// The link target, including the history's base.
    pub href: String,
}

/// A navigation engine instance.
///
/// Independent routers share nothing; each owns its route table, history and
/// hooks.
pub struct Router {
    settings: Settings,
    matcher: RwLock<Matcher>,
    history: Mutex<Box<dyn History>>,
    current: RwLock<Route>,
    markers: Markers,
    hook_ids: HookIds,
    before_each: Hooks<dyn NavigationGuard>,
    before_resolve: Hooks<dyn NavigationGuard>,
    after_each: Hooks<AfterHook>,
    error_hooks: Hooks<ErrorHook>,
    listeners: Hooks<RouteListener>,
    ready: Mutex<ReadyState>,
    instances: Arc<InstanceRegistry>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("mode", &self.mode())
            .field("current", &self.current_route().full_path)
            .field("before_each", &self.before_each)
            .field("after_each", &self.after_each)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Builds a router from `options`.
    pub fn new(options: RouterOptions) -> Self {
        let RouterOptions {
            routes,
            settings,
            history,
            query_codec,
        } = options;

        let mut matcher = Matcher::from_settings(routes, &settings);
        if let Some(codec) = query_codec {
            matcher = matcher.with_query_codec(codec);
        }
        let history = history.unwrap_or_else(|| Box::new(MemoryHistory::new()));

        tracing::debug!(
            mode = %history.mode(),
            routes = matcher.routes().len(),
            warnings = matcher.warnings().len(),
            "router created"
        );

        Self {
            settings,
            matcher: RwLock::new(matcher),
            history: Mutex::new(history),
            current: RwLock::new(Route::start()),
            markers: Markers::default(),
            hook_ids: HookIds::default(),
            before_each: Hooks::new(),
            before_resolve: Hooks::new(),
            after_each: Hooks::new(),
            error_hooks: Hooks::new(),
            listeners: Hooks::new(),
            ready: Mutex::new(ReadyState::default()),
            instances: Arc::new(InstanceRegistry::new()),
        }
    }

    /// Builds a router whose history backend follows `settings.mode`.
    ///
    /// `history` mode falls back to `hash` mode when the address bar cannot
    /// push state and `settings.fallback` is set. Both address-bar modes fail
    /// without an address bar.
    pub fn from_settings(
        routes: impl IntoIterator<Item = RouteConfig>,
        settings: Settings,
        address_bar: Option<Arc<dyn AddressBar>>,
    ) -> WaypostResult<Self> {
        let history: Box<dyn History> = match (settings.mode, address_bar) {
            (RouterMode::Abstract, _) => Box::new(MemoryHistory::new()),
            (RouterMode::History, Some(bar)) if bar.supports_push_state() || !settings.fallback => {
                Box::new(BrowserHistory::new(bar, &settings.base))
            }
            (RouterMode::History, Some(bar)) => {
                tracing::info!("push-state unsupported, falling back to hash mode");
                Box::new(HashHistory::new(bar, &settings.base, true))
            }
            (RouterMode::Hash, Some(bar)) => Box::new(HashHistory::new(bar, &settings.base, false)),
            (mode, None) => {
                return Err(WaypostError::ImproperlyConfigured(format!(
                    "{mode} mode requires an address bar"
                )))
            }
        };

        let mut options = RouterOptions::new(routes).settings(settings);
        options.history = Some(history);
        Ok(Self::new(options))
    }

    // ── Accessors ────────────────────────────────────────────────────

    fn matcher(&self) -> RwLockReadGuard<'_, Matcher> {
        self.matcher.read().expect("matcher lock poisoned")
    }

    fn history(&self) -> MutexGuard<'_, Box<dyn History>> {
        self.history.lock().expect("history lock poisoned")
    }

    /// The router settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The mode of the history backend in use.
    pub fn mode(&self) -> RouterMode {
        self.history().mode()
    }

    /// The committed route.
    pub fn current_route(&self) -> Route {
        self.current.read().expect("route lock poisoned").clone()
    }

    /// The registry the UI layer records component instances in.
    pub const fn instances(&self) -> &Arc<InstanceRegistry> {
        &self.instances
    }

    // ── Routes ───────────────────────────────────────────────────────

    /// Merges more routes into the table.
    pub fn add_routes(&self, routes: impl IntoIterator<Item = RouteConfig>) {
        self.matcher
            .write()
            .expect("matcher lock poisoned")
            .add_routes(routes);
    }

    /// Adds one route, optionally below the route named `parent`.
    pub fn add_route(&self, parent: Option<&str>, route: RouteConfig) {
        self.matcher
            .write()
            .expect("matcher lock poisoned")
            .add_route(parent, route);
    }

    /// All records, in match-priority order.
    pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
        self.matcher().routes()
    }

    /// Configuration warnings collected so far.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        self.matcher().warnings().to_vec()
    }

    /// Matches `raw` without navigating.
    pub fn match_route(&self, raw: impl Into<Location>, current: Option<&Route>) -> Route {
        self.matcher().match_route(&raw.into(), current)
    }

    /// Resolves `to` against `current` (the committed route by default) and
    /// computes its link target.
    pub fn resolve(&self, to: impl Into<Location>, current: Option<&Route>, append: bool) -> Resolved {
        let committed;
        let current = if let Some(route) = current {
            route
        } else {
            committed = self.current_route();
            &committed
        };

        let (location, route) = {
            let matcher = self.matcher();
            let location = normalize_location(&to.into(), Some(current), append, matcher.codec());
            let route = matcher.match_route(&location, Some(current));
            (location, route)
        };
        let full_path = route.redirected_from.as_deref().unwrap_or(&route.full_path);
        let href = self.history().create_href(full_path);

        Resolved {
            location,
            route,
            href,
        }
    }

    // ── Hooks ────────────────────────────────────────────────────────

    /// Registers a guard run before every navigation.
    pub fn before_each(&self, guard: Arc<dyn NavigationGuard>) -> HookId {
        let id = self.hook_ids.next();
        self.before_each.add(id, guard);
        id
    }

    /// Registers a guard run after all other guards have passed.
    pub fn before_resolve(&self, guard: Arc<dyn NavigationGuard>) -> HookId {
        let id = self.hook_ids.next();
        self.before_resolve.add(id, guard);
        id
    }

    /// Registers a hook called with `(to, from)` after every commit.
    pub fn after_each<F>(&self, hook: F) -> HookId
    where
        F: Fn(&Route, &Route) + Send + Sync + 'static,
    {
        let id = self.hook_ids.next();
        self.after_each.add(id, Arc::new(hook));
        id
    }

    /// Registers a hook called with every navigation error.
    ///
    /// Without error hooks, errors are logged.
    pub fn on_error<F>(&self, hook: F) -> HookId
    where
        F: Fn(&NavigationFailure) + Send + Sync + 'static,
    {
        let id = self.hook_ids.next();
        self.error_hooks.add(id, Arc::new(hook));
        id
    }

    /// Registers a listener called with every committed route.
    pub fn listen<F>(&self, listener: F) -> HookId
    where
        F: Fn(&Route) + Send + Sync + 'static,
    {
        let id = self.hook_ids.next();
        self.listeners.add(id, Arc::new(listener));
        id
    }

    /// Removes a hook registered through any of the hook methods.
    pub fn remove_hook(&self, id: HookId) -> bool {
        self.before_each.remove(id)
            || self.before_resolve.remove(id)
            || self.after_each.remove(id)
            || self.error_hooks.remove(id)
            || self.listeners.remove(id)
    }

    /// Runs `ready` once the first navigation has committed.
    ///
    /// If the first navigation already finished, `ready` runs immediately
    /// with the current route.
    pub fn on_ready<F>(&self, ready: F)
    where
        F: FnOnce(&Route) + Send + 'static,
    {
        self.register_ready(Box::new(ready), None);
    }

    /// Like [`on_ready`](Self::on_ready), with `error` run instead if the
    /// first navigation fails.
    pub fn on_ready_or_error<F, E>(&self, ready: F, error: E)
    where
        F: FnOnce(&Route) + Send + 'static,
        E: FnOnce(&NavigationFailure) + Send + 'static,
    {
        self.register_ready(Box::new(ready), Some(Box::new(error)));
    }

    fn register_ready(
        &self,
        ready: Box<dyn FnOnce(&Route) + Send>,
        error: Option<Box<dyn FnOnce(&NavigationFailure) + Send>>,
    ) {
        let immediate = self
            .ready
            .lock()
            .expect("ready lock poisoned")
            .on_ready(ready, error);
        if let Some(ready) = immediate {
            ready(&self.current_route());
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Navigates to the history's current location.
    pub async fn start(&self) -> Result<Route, NavigationFailure> {
        let location = self.history().current_location();
        self.transition_to(Location::from(location), NavigationType::Start)
            .await
    }

    /// Navigates to `to`, adding a history entry.
    pub async fn push(&self, to: impl Into<Location>) -> Result<Route, NavigationFailure> {
        self.transition_to(to.into(), NavigationType::Push).await
    }

    /// Navigates to `to`, replacing the current history entry.
    pub async fn replace(&self, to: impl Into<Location>) -> Result<Route, NavigationFailure> {
        self.transition_to(to.into(), NavigationType::Replace).await
    }

    /// Moves `delta` entries through the history.
    ///
    /// With in-memory history the router navigates to the target entry and
    /// returns the outcome; a move out of range does nothing. Address-bar
    /// histories forward the move to the host and return `None`; the host
    /// then reports the change through
    /// [`handle_location_change`](Self::handle_location_change).
    pub async fn go(&self, delta: i64) -> Option<Result<Route, NavigationFailure>> {
        let target = self.history().go(delta)?;
        Some(
            self.transition_to(Location::from(target), NavigationType::Go(delta))
                .await,
        )
    }

    /// Moves one entry back.
    pub async fn back(&self) -> Option<Result<Route, NavigationFailure>> {
        self.go(-1).await
    }

    /// Moves one entry forward.
    pub async fn forward(&self) -> Option<Result<Route, NavigationFailure>> {
        self.go(1).await
    }

    /// Navigates to the location the host's address bar now shows.
    ///
    /// Called by the host after back/forward buttons or a fragment change.
    pub async fn handle_location_change(&self) -> Result<Route, NavigationFailure> {
        let location = self.history().current_location();
        self.transition_to(Location::from(location), NavigationType::Pop)
            .await
    }

    async fn transition_to(
        &self,
        mut target: Location,
        mut kind: NavigationType,
    ) -> Result<Route, NavigationFailure> {
        let mut redirects = 0_usize;
        loop {
            let from = self.current_route();
            let to = self.matcher().match_route(&target, Some(&from));
            let id = self.markers.begin();
            let span = navigation_span(id, &to.full_path);

            let outcome = self
                .confirm_transition(id, &to, &from)
                .instrument(span.clone())
                .await;

            match outcome {
                Ok(callbacks) if self.install(id, &to) => {
                    return Ok(span.in_scope(|| self.commit(id, to, &from, kind, callbacks)));
                }
                Ok(_) => {
                    return Err(span.in_scope(|| self.abort(Stop::Cancelled, &to, &from, kind)));
                }
                Err(Stop::Redirect(next)) if redirects < self.settings.max_redirects => {
                    redirects += 1;
                    span.in_scope(|| {
                        tracing::debug!(from = %to.full_path, "navigation guard redirected");
                    });
                    kind = kind.for_redirect(&next);
                    target = next;
                }
                Err(Stop::Redirect(_)) => {
                    let failure = NavigationFailure::Redirected {
                        from: from.full_path.clone(),
                        to: to.full_path.clone(),
                    };
                    span.in_scope(|| {
                        tracing::warn!(limit = self.settings.max_redirects, "too many guard redirects");
                    });
                    return Err(span.in_scope(|| self.fail(failure)));
                }
                Err(stop) => return Err(span.in_scope(|| self.abort(stop, &to, &from, kind))),
            }
        }
    }

    async fn confirm_transition(
        &self,
        id: u64,
        to: &Route,
        from: &Route,
    ) -> Result<Vec<PostCommit>, Stop> {
        let same_leaf = match (to.matched.last(), from.matched.last()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same_leaf && to.matched.len() == from.matched.len() && is_same_route(to, from) {
            return Err(Stop::Duplicated);
        }

        let diff = resolve_queue(&from.matched, &to.matched);
        let mut callbacks = Vec::new();

        let queue = first_queue(&diff, self.before_each.snapshot());
        run_queue(queue, to, from, &self.markers, id, &mut callbacks).await?;

        resolve_components(pending_components(&diff.activated), &self.markers, id).await?;

        let queue = second_queue(&diff.activated, self.before_resolve.snapshot());
        run_queue(queue, to, from, &self.markers, id, &mut callbacks).await?;

        if self.markers.is_stale(id) {
            return Err(Stop::Cancelled);
        }
        Ok(callbacks)
    }

    /// Makes `to` the current route unless a newer navigation has started.
    ///
    /// The staleness check and the write share the route lock, so a
    /// navigation that began after `id` can never be overwritten by it.
    fn install(&self, id: u64, to: &Route) -> bool {
        let mut current = self.current.write().expect("route lock poisoned");
        if self.markers.is_stale(id) {
            return false;
        }
        *current = to.clone();
        self.markers.commit(id);
        true
    }

    fn commit(
        &self,
        id: u64,
        to: Route,
        from: &Route,
        kind: NavigationType,
        callbacks: Vec<PostCommit>,
    ) -> Route {
        for listener in self.listeners.snapshot() {
            listener(&to);
        }
        for hook in self.after_each.snapshot() {
            hook(&to, from);
        }

        {
            let mut history = self.history();
            match kind {
                NavigationType::Push => history.push(&to.full_path),
                NavigationType::Replace | NavigationType::Start => history.replace(&to.full_path),
                NavigationType::Go(delta) => history.commit_go(delta),
                NavigationType::Pop => {}
            }
            history.ensure_url(&to.full_path, false);
        }

        let ready = self.ready.lock().expect("ready lock poisoned").settle_ready();
        for callback in ready {
            callback(&to);
        }

        let policy = PollPolicy {
            interval: self.settings.instance_poll_interval(),
            attempts: self.settings.instance_poll_attempts,
        };
        spawn_post_commit(
            callbacks,
            Arc::clone(&self.instances),
            self.markers.committed(),
            id,
            policy,
        );

        let alias = to.leaf().is_some_and(|record| record.is_alias());
        tracing::info!(from = %from.full_path, alias, "navigation committed");
        to
    }

    fn abort(&self, stop: Stop, to: &Route, from: &Route, kind: NavigationType) -> NavigationFailure {
        let (from_path, to_path) = (from.full_path.clone(), to.full_path.clone());
        let failure = match stop {
            Stop::Duplicated => {
                if let NavigationType::Go(delta) = kind {
                    self.history().commit_go(delta);
                }
                NavigationFailure::Duplicated {
                    from: from_path,
                    to: to_path,
                }
            }
            Stop::Cancelled => NavigationFailure::Cancelled {
                from: from_path,
                to: to_path,
            },
            Stop::Aborted => NavigationFailure::Aborted {
                from: from_path,
                to: to_path,
            },
            Stop::Redirect(_) => NavigationFailure::Redirected {
                from: from_path,
                to: to_path,
            },
            Stop::Error(error) => NavigationFailure::Guard {
                from: from_path,
                to: to_path,
                error,
            },
            Stop::Panicked(message) => NavigationFailure::GuardPanicked {
                from: from_path,
                to: to_path,
                message,
            },
            Stop::Component { view, reason } => NavigationFailure::AsyncComponent {
                from: from_path,
                to: to_path,
                view,
                reason,
            },
        };

        if !failure.is(NavigationFailureType::Cancelled) && !from.is_start() {
            self.history().ensure_url(&from.full_path, false);
        }
        self.fail(failure)
    }

    fn fail(&self, failure: NavigationFailure) -> NavigationFailure {
        if failure.is_error() {
            let hooks = self.error_hooks.snapshot();
            if hooks.is_empty() {
                tracing::error!(error = %failure, "uncaught error during route navigation");
            }
            for hook in hooks {
                hook(&failure);
            }
        } else {
            tracing::debug!(reason = %failure, "navigation did not commit");
        }

        if !failure.is(NavigationFailureType::Cancelled) {
            let errors = self.ready.lock().expect("ready lock poisoned").settle_error();
            for callback in errors {
                callback(&failure);
            }
        }
        failure
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use waypost_routing::guard::{guard_sync, Next};

    use super::*;
    use crate::history::testing::FakeAddressBar;

    fn router(routes: impl IntoIterator<Item = RouteConfig>) -> Router {
        Router::new(RouterOptions::new(routes))
    }

    #[tokio::test]
    async fn test_push_commits_and_records_history() {
        let router = router([RouteConfig::new("/"), RouteConfig::new("/a").name("a")]);
        router.start().await.unwrap();
        let route = router.push("/a?x=1").await.unwrap();

        assert_eq!(route.name.as_deref(), Some("a"));
        assert_eq!(router.current_route().full_path, "/a?x=1");
        assert_eq!(router.history().current_location(), "/a?x=1");
    }

    #[tokio::test]
    async fn test_memory_go_back_and_forward() {
        let router = router([RouteConfig::new("/a"), RouteConfig::new("/b")]);
        router.push("/a").await.unwrap();
        router.push("/b").await.unwrap();

        let back = router.back().await.unwrap().unwrap();
        assert_eq!(back.path, "/a");
        assert_eq!(router.history().current_location(), "/a");

        let forward = router.forward().await.unwrap().unwrap();
        assert_eq!(forward.path, "/b");
        assert!(router.forward().await.is_none());
    }

    #[tokio::test]
    async fn test_abort_rolls_back_url() {
        let bar = Arc::new(FakeAddressBar::new("https://example.com/a"));
        let router = Router::from_settings(
            [RouteConfig::new("/a"), RouteConfig::new("/b")],
            Settings {
                mode: RouterMode::History,
                ..Settings::default()
            },
            Some(bar.clone()),
        )
        .unwrap();
        router.start().await.unwrap();
        router.before_each(guard_sync(|to, _| Next::from(to.path != "/b")));

        bar.push_state("/b");
        let failure = router.handle_location_change().await.unwrap_err();
        assert!(failure.is(NavigationFailureType::Aborted));
        assert_eq!(bar.href(), "https://example.com/a");
        assert_eq!(router.current_route().path, "/a");
    }

    #[test]
    fn test_stale_navigation_cannot_install() {
        let router = router([RouteConfig::new("/a")]);
        let route = router.match_route("/a", None);

        let stale = router.markers.begin();
        let latest = router.markers.begin();
        assert!(!router.install(stale, &route));
        assert!(router.current_route().is_start());

        assert!(router.install(latest, &route));
        assert_eq!(router.current_route().path, "/a");
    }

    #[test]
    fn test_from_settings_requires_address_bar() {
        let settings = Settings {
            mode: RouterMode::Hash,
            ..Settings::default()
        };
        assert!(Router::from_settings(Vec::new(), settings, None).is_err());
    }

    #[test]
    fn test_from_settings_falls_back_to_hash() {
        let bar = Arc::new(FakeAddressBar::with_push_state("https://example.com/app/x", false));
        let settings = Settings {
            mode: RouterMode::History,
            base: "/app".into(),
            ..Settings::default()
        };
        let router = Router::from_settings(Vec::new(), settings, Some(bar.clone())).unwrap();
        assert_eq!(router.mode(), RouterMode::Hash);
        assert_eq!(bar.href(), "https://example.com/app/#/x");
    }

    #[test]
    fn test_resolve_builds_href() {
        let bar = Arc::new(FakeAddressBar::new("https://example.com/app/"));
        let settings = Settings {
            mode: RouterMode::History,
            base: "/app/".into(),
            ..Settings::default()
        };
        let router = Router::from_settings(
            [
                RouteConfig::new("/users/:id").name("user"),
                RouteConfig::new("/old").redirect("/users/1"),
            ],
            settings,
            Some(bar),
        )
        .unwrap();

        let resolved = router.resolve(
            waypost_routing::Location::named("user").param("id", "7"),
            None,
            false,
        );
        assert_eq!(resolved.route.path, "/users/7");
        assert_eq!(resolved.href, "/app/users/7");

        let redirected = router.resolve("/old", None, false);
        assert_eq!(redirected.route.path, "/users/1");
        assert_eq!(redirected.href, "/app/old");
    }

    #[tokio::test]
    async fn test_remove_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = router([RouteConfig::new("/a"), RouteConfig::new("/b")]);
        let id = router.after_each(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        router.push("/a").await.unwrap();
        assert!(router.remove_hook(id));
        assert!(!router.remove_hook(id));
        router.push("/b").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_routes_at_runtime() {
        let router = router([RouteConfig::new("/")]);
        assert!(router.push("/late").await.unwrap().is_unmatched());

        router.add_routes([RouteConfig::new("/late").name("late")]);
        let route = router.push("/late?again").await.unwrap();
        assert_eq!(route.name.as_deref(), Some("late"));
        assert_eq!(router.routes().len(), 2);
    }
}
