//! The guard pipeline.
//!
//! A navigation attempt runs two guard queues, in this order:
//!
//! 1. leave guards of deactivated components (deepest first), global
//!    before-hooks, update guards of reused components, `before_enter` of
//!    activated records, then the loading of activated lazy components;
//! 2. enter guards of activated components, then global resolve-hooks.
//!
//! Guards run strictly one after another. Before and after each guard the
//! attempt checks whether a newer navigation has started; if so it stops as
//! cancelled and the rest of its queue never runs. This module holds the
//! building blocks; [`Router`](crate::router::Router) drives them.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use futures::FutureExt;
use waypost_routing::component::LazyComponent;
use waypost_routing::guard::{GuardError, InstanceCallback, NavigationGuard, Next};
use waypost_routing::location::Location;
use waypost_routing::record::{RecordId, RouteRecord};
use waypost_routing::route::Route;

use crate::instances::InstanceRegistry;

// ── Navigation bookkeeping ──────────────────────────────────────────

/// How a navigation was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    /// Adds a history entry.
    Push,
    /// Overwrites the current history entry.
    Replace,
    /// Follows a location change reported by the host.
    Pop,
    /// Moves through an in-memory history by the given delta.
    Go(i64),
    /// The router's initial navigation.
    Start,
}

impl NavigationType {
    /// The type used to restart towards a guard's redirect target.
    pub const fn for_redirect(self, target: &Location) -> Self {
        if target.replace {
            return Self::Replace;
        }
        match self {
            Self::Replace | Self::Start => Self::Replace,
            Self::Push | Self::Pop | Self::Go(_) => Self::Push,
        }
    }
}

/// The pending and committed navigation markers.
///
/// Every attempt takes a fresh id and stores it as pending; an attempt whose
/// id is no longer pending is stale.
#[derive(Debug, Default)]
pub(crate) struct Markers {
    next: AtomicU64,
    pending: AtomicU64,
    committed: Arc<AtomicU64>,
}

impl Markers {
    /// Starts a new attempt and makes it the pending one.
    pub(crate) fn begin(&self) -> u64 {
        let id = self.next.fetch_add(1, Ordering::AcqRel) + 1;
        self.pending.store(id, Ordering::Release);
        id
    }

    pub(crate) fn is_stale(&self, id: u64) -> bool {
        self.pending.load(Ordering::Acquire) != id
    }

    pub(crate) fn commit(&self, id: u64) {
        self.committed.store(id, Ordering::Release);
    }

    /// A handle background tasks use to see whether `id` is still committed.
    pub(crate) fn committed(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.committed)
    }
}

// ── Chain diffing ───────────────────────────────────────────────────

/// How the matched chain changes between two routes.
#[derive(Debug, Default)]
pub struct ChainDiff {
    /// Records present in both chains, root first.
    pub updated: Vec<Arc<RouteRecord>>,
    /// Records only in the old chain, root first.
    pub deactivated: Vec<Arc<RouteRecord>>,
    /// Records only in the new chain, root first.
    pub activated: Vec<Arc<RouteRecord>>,
}

/// Splits two matched chains at their longest common prefix.
///
/// Records are compared by identity, not by value.
pub fn resolve_queue(current: &[Arc<RouteRecord>], next: &[Arc<RouteRecord>]) -> ChainDiff {
    let shared = current
        .iter()
        .zip(next)
        .take_while(|(a, b)| Arc::ptr_eq(a, b))
        .count();

    ChainDiff {
        updated: next[..shared].to_vec(),
        deactivated: current[shared..].to_vec(),
        activated: next[shared..].to_vec(),
    }
}

// ── Guard queues ────────────────────────────────────────────────────

/// Where a queued guard comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    /// A deactivated component's leave guard.
    Leave,
    /// A global before-hook.
    BeforeEach,
    /// A reused component's update guard.
    Update,
    /// An activated record's `before_enter`.
    BeforeEnter,
    /// An activated component's enter guard.
    Enter,
    /// A global resolve-hook.
    BeforeResolve,
}

impl GuardStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::BeforeEach => "before_each",
            Self::Update => "update",
            Self::BeforeEnter => "before_enter",
            Self::Enter => "enter",
            Self::BeforeResolve => "before_resolve",
        }
    }
}

pub(crate) struct QueuedGuard {
    stage: GuardStage,
    guard: Arc<dyn NavigationGuard>,
    /// The component slot an enter guard's callback is bound to.
    slot: Option<(RecordId, String)>,
}

impl QueuedGuard {
    const fn global(stage: GuardStage, guard: Arc<dyn NavigationGuard>) -> Self {
        Self {
            stage,
            guard,
            slot: None,
        }
    }
}

/// The first queue: leave, before-each, update, and before-enter guards.
pub(crate) fn first_queue(
    diff: &ChainDiff,
    before_each: Vec<Arc<dyn NavigationGuard>>,
) -> Vec<QueuedGuard> {
    let mut leave: Vec<QueuedGuard> = diff
        .deactivated
        .iter()
        .flat_map(|record| record.components.values())
        .filter_map(|component| component.resolved()?.leave_guard().cloned())
        .map(|guard| QueuedGuard::global(GuardStage::Leave, guard))
        .collect();
    leave.reverse();

    let globals = before_each
        .into_iter()
        .map(|guard| QueuedGuard::global(GuardStage::BeforeEach, guard));

    let update = diff
        .updated
        .iter()
        .flat_map(|record| record.components.values())
        .filter_map(|component| component.resolved()?.update_guard().cloned())
        .map(|guard| QueuedGuard::global(GuardStage::Update, guard));

    let enter = diff
        .activated
        .iter()
        .filter_map(|record| record.before_enter.clone())
        .map(|guard| QueuedGuard::global(GuardStage::BeforeEnter, guard));

    leave.extend(globals);
    leave.extend(update);
    leave.extend(enter);
    leave
}

/// The second queue: component enter guards, then resolve-hooks.
///
/// Built after lazy components have loaded, so their enter guards are known.
pub(crate) fn second_queue(
    activated: &[Arc<RouteRecord>],
    before_resolve: Vec<Arc<dyn NavigationGuard>>,
) -> Vec<QueuedGuard> {
    let mut queue: Vec<QueuedGuard> = activated
        .iter()
        .flat_map(|record| {
            record.components.iter().filter_map(move |(view, component)| {
                let guard = component.resolved()?.enter_guard()?.clone();
                Some(QueuedGuard {
                    stage: GuardStage::Enter,
                    guard,
                    slot: Some((record.id, view.clone())),
                })
            })
        })
        .collect();
    queue.extend(
        before_resolve
            .into_iter()
            .map(|guard| QueuedGuard::global(GuardStage::BeforeResolve, guard)),
    );
    queue
}

/// Lazy components of `activated` that have not loaded yet.
pub(crate) fn pending_components(activated: &[Arc<RouteRecord>]) -> Vec<(String, Arc<LazyComponent>)> {
    activated
        .iter()
        .flat_map(|record| {
            record
                .components
                .iter()
                .filter_map(|(view, component)| Some((view.clone(), Arc::clone(component.pending()?))))
        })
        .collect()
}

// ── Running ─────────────────────────────────────────────────────────

/// Why a queue stopped early.
#[derive(Debug)]
pub(crate) enum Stop {
    Duplicated,
    Cancelled,
    Aborted,
    Error(GuardError),
    Panicked(String),
    Component { view: String, reason: String },
    Redirect(Location),
}

/// A callback waiting for the component instance of `(record, view)`.
pub(crate) struct PostCommit {
    record: RecordId,
    view: String,
    callback: InstanceCallback,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs `queue` for the attempt `id`, collecting enter-guard callbacks.
pub(crate) async fn run_queue(
    queue: Vec<QueuedGuard>,
    to: &Route,
    from: &Route,
    markers: &Markers,
    id: u64,
    callbacks: &mut Vec<PostCommit>,
) -> Result<(), Stop> {
    for entry in queue {
        if markers.is_stale(id) {
            return Err(Stop::Cancelled);
        }

        tracing::trace!(stage = entry.stage.as_str(), "running guard");
        let outcome = AssertUnwindSafe(entry.guard.check(to, from))
            .catch_unwind()
            .await;

        if markers.is_stale(id) {
            return Err(Stop::Cancelled);
        }

        match outcome {
            Err(payload) => return Err(Stop::Panicked(panic_message(payload.as_ref()))),
            Ok(Next::Proceed) => {}
            Ok(Next::ProceedWith(callback)) => match entry.slot {
                Some((record, view)) => callbacks.push(PostCommit {
                    record,
                    view,
                    callback,
                }),
                None => tracing::debug!(
                    stage = entry.stage.as_str(),
                    "instance callback ignored outside a component enter guard"
                ),
            },
            Ok(Next::Abort) => return Err(Stop::Aborted),
            Ok(Next::Error(error)) => return Err(Stop::Error(error)),
            Ok(Next::Redirect(target)) => return Err(Stop::Redirect(target)),
        }
    }
    Ok(())
}

/// Loads every pending lazy component concurrently.
///
/// Fails with the first view whose component could not be loaded.
pub(crate) async fn resolve_components(
    pending: Vec<(String, Arc<LazyComponent>)>,
    markers: &Markers,
    id: u64,
) -> Result<(), Stop> {
    if pending.is_empty() {
        return Ok(());
    }
    if markers.is_stale(id) {
        return Err(Stop::Cancelled);
    }

    tracing::debug!(count = pending.len(), "resolving async components");
    let loads = pending.iter().map(|(view, lazy)| async move {
        lazy.resolve()
            .await
            .map_err(|error| (view.clone(), error.to_string()))
    });

    match AssertUnwindSafe(try_join_all(loads)).catch_unwind().await {
        Ok(Ok(_)) if markers.is_stale(id) => Err(Stop::Cancelled),
        Ok(Ok(_)) => Ok(()),
        Ok(Err((view, reason))) => Err(Stop::Component { view, reason }),
        Err(payload) => Err(Stop::Panicked(panic_message(payload.as_ref()))),
    }
}

// ── Post-commit callbacks ───────────────────────────────────────────

/// How post-commit callbacks wait for their component instance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollPolicy {
    pub(crate) interval: Duration,
    pub(crate) attempts: u32,
}

/// Runs `callbacks` on a background task once their instances exist.
///
/// Each callback polls the registry every `policy.interval`, up to
/// `policy.attempts` times, and is dropped as soon as navigation `id` is no
/// longer the committed one.
pub(crate) fn spawn_post_commit(
    callbacks: Vec<PostCommit>,
    instances: Arc<InstanceRegistry>,
    committed: Arc<AtomicU64>,
    id: u64,
    policy: PollPolicy,
) {
    if callbacks.is_empty() {
        return;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!(
            count = callbacks.len(),
            "no async runtime available, dropping post-commit callbacks"
        );
        return;
    };

    runtime.spawn(async move {
        let deliveries = callbacks
            .into_iter()
            .map(|entry| deliver(entry, &instances, &committed, id, policy));
        futures::future::join_all(deliveries).await;
    });
}

async fn deliver(
    entry: PostCommit,
    instances: &InstanceRegistry,
    committed: &AtomicU64,
    id: u64,
    policy: PollPolicy,
) {
    for attempt in 0..=policy.attempts {
        if committed.load(Ordering::Acquire) != id {
            tracing::trace!(record = %entry.record, view = %entry.view, "navigation superseded");
            return;
        }
        if let Some(instance) = instances.get(entry.record, &entry.view) {
            (entry.callback)(instance);
            return;
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    tracing::debug!(
        record = %entry.record,
        view = %entry.view,
        "component instance never appeared, dropping callback"
    );
}
