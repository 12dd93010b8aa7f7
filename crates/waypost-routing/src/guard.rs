//! Navigation guards and their continuation type.
//!
//! Every interception point of a navigation (global hooks, per-record
//! `before_enter`, and the in-component leave/update/enter guards) is a
//! [`NavigationGuard`]. A guard inspects the target and the current route and
//! answers with a [`Next`] that tells the pipeline how to continue.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::location::Location;
use crate::route::Route;

/// An error raised by a guard. Aborts the navigation and reaches error hooks.
pub type GuardError = Arc<dyn std::error::Error + Send + Sync>;

/// A component instance handle, as registered by the UI layer.
pub type InstanceHandle = Arc<dyn Any + Send + Sync>;

/// A callback run once the entered component's instance exists.
pub type InstanceCallback = Box<dyn FnOnce(InstanceHandle) + Send>;

/// What a guard wants the navigation to do next.
pub enum Next {
    /// Continue with the next guard.
    Proceed,
    /// Continue, and run the callback with the component instance after the
    /// navigation commits. Only component enter guards use the callback;
    /// elsewhere this behaves like [`Next::Proceed`].
    ProceedWith(InstanceCallback),
    /// Stop the navigation without an error.
    Abort,
    /// Stop the navigation with an error.
    Error(GuardError),
    /// Stop this attempt and navigate to another target instead.
    Redirect(Location),
}

impl Next {
    /// Shorthand for a redirect to `target`.
    pub fn redirect(target: impl Into<Location>) -> Self {
        Self::Redirect(target.into())
    }

    /// Shorthand for an error outcome.
    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Error(Arc::new(error))
    }

    /// Returns `true` for outcomes that let the queue advance.
    pub const fn proceeds(&self) -> bool {
        matches!(self, Self::Proceed | Self::ProceedWith(_))
    }
}

impl From<bool> for Next {
    fn from(proceed: bool) -> Self {
        if proceed {
            Self::Proceed
        } else {
            Self::Abort
        }
    }
}

impl From<Location> for Next {
    fn from(target: Location) -> Self {
        Self::Redirect(target)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => f.write_str("Proceed"),
            Self::ProceedWith(_) => f.write_str("ProceedWith(..)"),
            Self::Abort => f.write_str("Abort"),
            Self::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
            Self::Redirect(loc) => f.debug_tuple("Redirect").field(loc).finish(),
        }
    }
}

/// A checkpoint invoked during a navigation attempt.
///
/// Guards may suspend for as long as they like before answering; the pipeline
/// runs them strictly one at a time.
#[async_trait]
pub trait NavigationGuard: Send + Sync {
    /// Decides how the navigation from `from` to `to` continues.
    async fn check(&self, to: &Route, from: &Route) -> Next;
}

/// Adapts an async closure into a [`NavigationGuard`].
///
/// The closure receives owned snapshots so its future can be `'static`.
pub struct FnGuard<F> {
    func: F,
}

impl<F> fmt::Debug for FnGuard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGuard").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> NavigationGuard for FnGuard<F>
where
    F: Fn(Route, Route) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Next> + Send + 'static,
{
    async fn check(&self, to: &Route, from: &Route) -> Next {
        (self.func)(to.clone(), from.clone()).await
    }
}

/// Wraps an async closure as a shared guard.
///
/// # Examples
///
/// ```
/// use waypost_routing::guard::{guard_fn, Next};
///
/// let guard = guard_fn(|to, _from| async move {
///     if to.path.starts_with("/admin") {
///         Next::redirect("/login")
///     } else {
///         Next::Proceed
///     }
/// });
/// ```
pub fn guard_fn<F, Fut>(func: F) -> Arc<dyn NavigationGuard>
where
    F: Fn(Route, Route) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Next> + Send + 'static,
{
    Arc::new(FnGuard { func })
}

/// Wraps a synchronous closure as a shared guard.
pub fn guard_sync<F>(func: F) -> Arc<dyn NavigationGuard>
where
    F: Fn(&Route, &Route) -> Next + Send + Sync + 'static,
{
    struct SyncGuard<F>(F);

    #[async_trait]
    impl<F> NavigationGuard for SyncGuard<F>
    where
        F: Fn(&Route, &Route) -> Next + Send + Sync + 'static,
    {
        async fn check(&self, to: &Route, from: &Route) -> Next {
            (self.0)(to, from)
        }
    }

    Arc::new(SyncGuard(func))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_from_bool() {
        assert!(matches!(Next::from(true), Next::Proceed));
        assert!(matches!(Next::from(false), Next::Abort));
    }

    #[test]
    fn test_proceeds() {
        assert!(Next::Proceed.proceeds());
        assert!(Next::ProceedWith(Box::new(|_| {})).proceeds());
        assert!(!Next::Abort.proceeds());
        assert!(!Next::redirect("/x").proceeds());
    }

    #[test]
    fn test_debug_hides_callback() {
        let next = Next::ProceedWith(Box::new(|_| {}));
        assert_eq!(format!("{next:?}"), "ProceedWith(..)");
    }

    #[tokio::test]
    async fn test_guard_fn_and_guard_sync() {
        let start = Route::start();
        let to = Route::start();

        let async_guard = guard_fn(|_to, _from| async { Next::Abort });
        assert!(matches!(async_guard.check(&to, &start).await, Next::Abort));

        let sync_guard = guard_sync(|to, _from| Next::from(to.matched.is_empty()));
        assert!(matches!(sync_guard.check(&to, &start).await, Next::Proceed));
    }
}
