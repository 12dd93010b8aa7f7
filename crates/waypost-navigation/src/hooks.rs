//! Router-level hook registries.
//!
//! A router keeps one [`Hooks`] list per hook kind: global before-guards,
//! resolve-guards, after-hooks, error hooks, and route listeners. Every
//! registration returns a [`HookId`] that removes the hook again.
//!
//! Hooks run in registration order. The pipeline takes a snapshot of a list
//! before running it, so hooks registered or removed while a navigation is in
//! flight only affect later navigations.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use waypost_routing::route::Route;

use crate::failure::NavigationFailure;

/// Identifies a registered hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook-{}", self.0)
    }
}

/// Hands out hook ids unique within one router.
#[derive(Debug, Default)]
pub(crate) struct HookIds(AtomicU64);

impl HookIds {
    pub(crate) fn next(&self) -> HookId {
        HookId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Called after a navigation commits, with `(to, from)`.
pub type AfterHook = dyn Fn(&Route, &Route) + Send + Sync;

/// Called with every navigation error.
pub type ErrorHook = dyn Fn(&NavigationFailure) + Send + Sync;

/// Called with every committed route.
pub type RouteListener = dyn Fn(&Route) + Send + Sync;

/// An ordered list of hooks of one kind.
pub struct Hooks<F: ?Sized> {
    entries: RwLock<Vec<(HookId, Arc<F>)>>,
}

impl<F: ?Sized> Default for Hooks<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for Hooks<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("len", &self.len()).finish()
    }
}

impl<F: ?Sized> Hooks<F> {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Appends a hook under `id`.
    pub fn add(&self, id: HookId, hook: Arc<F>) {
        self.entries
            .write()
            .expect("hook lock poisoned")
            .push((id, hook));
    }

    /// Removes the hook registered under `id`.
    ///
    /// Returns `true` if a hook was found and removed.
    pub fn remove(&self, id: HookId) -> bool {
        let mut entries = self.entries.write().expect("hook lock poisoned");
        let len_before = entries.len();
        entries.retain(|(hook_id, _)| *hook_id != id);
        entries.len() < len_before
    }

    /// The registered hooks, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries
            .read()
            .expect("hook lock poisoned")
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect()
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.entries.read().expect("hook lock poisoned").len()
    }

    /// Returns `true` if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type ReadyCallback = Box<dyn FnOnce(&Route) + Send>;
type ReadyErrorCallback = Box<dyn FnOnce(&NavigationFailure) + Send>;

/// Callbacks waiting for the outcome of the router's first navigation.
///
/// The first navigation that commits or fails settles the state; callbacks
/// registered afterwards with [`on_ready`](Self::on_ready) run immediately
/// with the current route.
#[derive(Default)]
pub(crate) struct ReadyState {
    settled: bool,
    ready: Vec<ReadyCallback>,
    errors: Vec<ReadyErrorCallback>,
}

impl fmt::Debug for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyState")
            .field("settled", &self.settled)
            .field("ready", &self.ready.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl ReadyState {
    /// Queues callbacks, or hands back `ready` if the state already settled.
    pub(crate) fn on_ready(
        &mut self,
        ready: ReadyCallback,
        error: Option<ReadyErrorCallback>,
    ) -> Option<ReadyCallback> {
        if self.settled {
            return Some(ready);
        }
        self.ready.push(ready);
        self.errors.extend(error);
        None
    }

    /// Settles the state after a commit and returns the callbacks to run.
    pub(crate) fn settle_ready(&mut self) -> Vec<ReadyCallback> {
        if self.settled {
            return Vec::new();
        }
        self.settled = true;
        self.errors.clear();
        std::mem::take(&mut self.ready)
    }

    /// Settles the state after a failure and returns the callbacks to run.
    pub(crate) fn settle_error(&mut self) -> Vec<ReadyErrorCallback> {
        if self.settled {
            return Vec::new();
        }
        self.settled = true;
        self.ready.clear();
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_hooks_keep_registration_order() {
        let ids = HookIds::default();
        let hooks: Hooks<dyn Fn() -> u8 + Send + Sync> = Hooks::new();
        hooks.add(ids.next(), Arc::new(|| 1));
        hooks.add(ids.next(), Arc::new(|| 2));
        hooks.add(ids.next(), Arc::new(|| 3));

        let values: Vec<u8> = hooks.snapshot().iter().map(|h| h()).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_hook() {
        let ids = HookIds::default();
        let hooks: Hooks<RouteListener> = Hooks::new();
        let first = ids.next();
        let second = ids.next();
        hooks.add(first, Arc::new(|_: &Route| {}));
        hooks.add(second, Arc::new(|_: &Route| {}));

        assert!(hooks.remove(first));
        assert!(!hooks.remove(first));
        assert_eq!(hooks.len(), 1);
        assert!(hooks.remove(second));
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_hook_ids_are_unique() {
        let ids = HookIds::default();
        assert_ne!(ids.next(), ids.next());
    }

    #[test]
    fn test_ready_settles_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut state = ReadyState::default();

        let counter = calls.clone();
        let pending = state.on_ready(
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            Some(Box::new(|_| panic!("error callback must not run"))),
        );
        assert!(pending.is_none());

        let route = Route::start();
        for callback in state.settle_ready() {
            callback(&route);
        }
        assert!(state.settle_ready().is_empty());
        assert!(state.settle_error().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_ready_after_settling_runs_immediately() {
        let mut state = ReadyState::default();
        state.settle_error();
        let immediate = state.on_ready(Box::new(|_| {}), None);
        assert!(immediate.is_some());
    }
}
