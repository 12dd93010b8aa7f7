//! Component references and asynchronous component loading.
//!
//! A route record maps view names to [`ComponentRef`]s. A reference is either
//! an already available [`Component`] or a [`LazyComponent`] whose factory runs
//! the first time a navigation activates the record. The factory's outcome is
//! stored in a single-assignment cell, so every record sharing the same lazy
//! component observes the same resolution.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::guard::NavigationGuard;

/// The view name used when a route has a single component.
pub const DEFAULT_VIEW: &str = "default";

/// A component definition as the router sees it: a name plus the
/// in-component guards.
#[derive(Clone, Default)]
pub struct Component {
    name: String,
    before_route_enter: Option<Arc<dyn NavigationGuard>>,
    before_route_update: Option<Arc<dyn NavigationGuard>>,
    before_route_leave: Option<Arc<dyn NavigationGuard>>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("before_route_enter", &self.before_route_enter.is_some())
            .field("before_route_update", &self.before_route_update.is_some())
            .field("before_route_leave", &self.before_route_leave.is_some())
            .finish()
    }
}

impl Component {
    /// Creates a component with no guards.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the guard run before a route rendering this component is entered.
    #[must_use]
    pub fn before_route_enter(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.before_route_enter = Some(guard);
        self
    }

    /// Sets the guard run when the route changes but this component stays.
    #[must_use]
    pub fn before_route_update(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.before_route_update = Some(guard);
        self
    }

    /// Sets the guard run before this component is navigated away from.
    #[must_use]
    pub fn before_route_leave(mut self, guard: Arc<dyn NavigationGuard>) -> Self {
        self.before_route_leave = Some(guard);
        self
    }

    /// The component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The enter guard, if any.
    pub fn enter_guard(&self) -> Option<&Arc<dyn NavigationGuard>> {
        self.before_route_enter.as_ref()
    }

    /// The update guard, if any.
    pub fn update_guard(&self) -> Option<&Arc<dyn NavigationGuard>> {
        self.before_route_update.as_ref()
    }

    /// The leave guard, if any.
    pub fn leave_guard(&self) -> Option<&Arc<dyn NavigationGuard>> {
        self.before_route_leave.as_ref()
    }
}

/// Why a lazy component could not be loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComponentLoadError {
    /// The factory's future failed.
    #[error("{0}")]
    Failed(String),
    /// A loading wrapper's timeout elapsed first.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// A pending component.
pub type ComponentFuture = BoxFuture<'static, Result<Arc<Component>, ComponentLoadError>>;

/// A component future together with the display hints a UI layer uses
/// while it is pending.
pub struct LoadingWrapper {
    /// The component being loaded.
    pub component: ComponentFuture,
    /// Shown while loading.
    pub loading: Option<Arc<Component>>,
    /// Shown if loading fails.
    pub error: Option<Arc<Component>>,
    /// How long to wait before showing `loading`.
    pub delay: Duration,
    /// Give up after this long.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for LoadingWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingWrapper")
            .field("loading", &self.loading)
            .field("error", &self.error)
            .field("delay", &self.delay)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// What a component factory produces.
pub enum FactoryOutput {
    /// The component is available right away.
    Immediate(Arc<Component>),
    /// The component arrives later.
    Deferred(ComponentFuture),
    /// The component arrives later, with loading hints and an optional timeout.
    LoadingWrapper(LoadingWrapper),
}

impl fmt::Debug for FactoryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(c) => f.debug_tuple("Immediate").field(c).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::LoadingWrapper(w) => f.debug_tuple("LoadingWrapper").field(w).finish(),
        }
    }
}

/// A factory invoked to load a component.
pub type ComponentFactory = Arc<dyn Fn() -> FactoryOutput + Send + Sync>;

/// A component loaded on first use.
pub struct LazyComponent {
    factory: ComponentFactory,
    cell: OnceCell<Arc<Component>>,
}

impl fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyComponent")
            .field("resolved", &self.cell.get())
            .finish_non_exhaustive()
    }
}

impl LazyComponent {
    /// Creates a lazy component from a factory.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> FactoryOutput + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            cell: OnceCell::new(),
        }
    }

    /// The loaded component, if loading has finished.
    pub fn get(&self) -> Option<&Arc<Component>> {
        self.cell.get()
    }

    /// Loads the component, running the factory at most once per success.
    ///
    /// Concurrent callers wait for the same load. A failed load leaves the
    /// cell empty, so a later navigation tries again.
    pub async fn resolve(&self) -> Result<Arc<Component>, ComponentLoadError> {
        self.cell
            .get_or_try_init(|| async {
                match (self.factory)() {
                    FactoryOutput::Immediate(component) => Ok(component),
                    FactoryOutput::Deferred(future) => future.await,
                    FactoryOutput::LoadingWrapper(wrapper) => match wrapper.timeout {
                        Some(limit) => tokio::time::timeout(limit, wrapper.component)
                            .await
                            .map_err(|_| ComponentLoadError::TimedOut(limit))?,
                        None => wrapper.component.await,
                    },
                }
            })
            .await
            .cloned()
    }
}

/// A view's component.
#[derive(Clone)]
pub enum ComponentRef {
    /// An available component.
    Resolved(Arc<Component>),
    /// A component loaded on first activation.
    Lazy(Arc<LazyComponent>),
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(c) => f.debug_tuple("Resolved").field(&c.name).finish(),
            Self::Lazy(lazy) => f.debug_tuple("Lazy").field(lazy).finish(),
        }
    }
}

impl ComponentRef {
    /// Creates a lazy reference from a factory.
    pub fn lazy<F>(factory: F) -> Self
    where
        F: Fn() -> FactoryOutput + Send + Sync + 'static,
    {
        Self::Lazy(Arc::new(LazyComponent::new(factory)))
    }

    /// The component, if it is available without loading.
    pub fn resolved(&self) -> Option<&Arc<Component>> {
        match self {
            Self::Resolved(component) => Some(component),
            Self::Lazy(lazy) => lazy.get(),
        }
    }

    /// The lazy component, if loading has not finished yet.
    pub fn pending(&self) -> Option<&Arc<LazyComponent>> {
        match self {
            Self::Lazy(lazy) if lazy.get().is_none() => Some(lazy),
            _ => None,
        }
    }
}

impl From<Component> for ComponentRef {
    fn from(component: Component) -> Self {
        Self::Resolved(Arc::new(component))
    }
}

impl From<Arc<Component>> for ComponentRef {
    fn from(component: Arc<Component>) -> Self {
        Self::Resolved(component)
    }
}

impl From<LazyComponent> for ComponentRef {
    fn from(lazy: LazyComponent) -> Self {
        Self::Lazy(Arc::new(lazy))
    }
}

impl From<Arc<LazyComponent>> for ComponentRef {
    fn from(lazy: Arc<LazyComponent>) -> Self {
        Self::Lazy(lazy)
    }
}
