//! Reactive Runtime
//!
//! The runtime owns one reactive graph: which effects subscribe to which
//! dependencies, the reverse index used for teardown, and the active-effect
//! stack that wires reads to subscriptions.
//!
//! # How It Works
//!
//! 1. When an effect runs, it pushes itself onto the runtime's active stack.
//!
//! 2. When a signal is read, [`RuntimeInner::track`] adds an edge between the
//!    signal's dependency and the active effect. Both directions go in under
//!    one write lock, so the subscription is symmetric by construction.
//!
//! 3. When a signal's value changes, [`RuntimeInner::notify`] snapshots the
//!    dependency's subscriber set and re-runs each subscriber. The snapshot is
//!    mandatory: a subscriber's run mutates the very sets being iterated.
//!
//! # Invariant
//!
//! An effect appears in a dependency's subscriber set iff that dependency
//! appears in the effect's dependency set. Every paired removal carries a
//! `debug_assert!` on the reciprocal half; a miss is an engine bug and fatal
//! in debug builds.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::Result;

use super::context::ActiveStack;
use super::effect::EffectInner;
use super::ids::{DepId, EffectId};

/// The edge sets of one reactive graph.
#[derive(Default)]
struct GraphState {
    /// For each dependency, the effects subscribed to it.
    subscribers: HashMap<DepId, HashSet<EffectId>>,

    /// For each effect, the dependencies it is currently subscribed to.
    /// Rebuilt wholesale on every run, never incrementally patched.
    dependencies: HashMap<EffectId, HashSet<DepId>>,

    /// Registered effects, held weakly so disposal is never blocked by the
    /// registry itself.
    effects: HashMap<EffectId, Weak<EffectInner>>,
}

pub(crate) struct RuntimeInner {
    graph: RwLock<GraphState>,
    pub(crate) active: ActiveStack,
}

/// A handle to one reactive graph.
///
/// Cloning is cheap and shares the graph. Each runtime is fully independent;
/// signals and effects created on one runtime never interact with another.
#[derive(Clone)]
pub struct Runtime {
    pub(crate) inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Create a new, empty reactive graph.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                graph: RwLock::new(GraphState::default()),
                active: ActiveStack::new(),
            }),
        }
    }

    /// Whether an effect is currently running on this runtime.
    pub fn is_tracking(&self) -> bool {
        self.inner.active.is_tracking()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.inner.graph.read();
        f.debug_struct("Runtime")
            .field("dependencies", &graph.subscribers.len())
            .field("effects", &graph.effects.len())
            .field("tracking", &self.inner.active.is_tracking())
            .finish()
    }
}

impl RuntimeInner {
    /// Record a read of `dep` by the currently active effect, if any.
    ///
    /// A read outside any effect is legal and simply untracked.
    pub(crate) fn track(&self, dep: DepId) {
        let Some(effect) = self.active.current() else {
            return;
        };
        let mut graph = self.graph.write();
        graph.subscribers.entry(dep).or_default().insert(effect);
        graph.dependencies.entry(effect).or_default().insert(dep);
        trace!(?dep, ?effect, "tracked read");
    }

    /// Re-run every effect subscribed to `dep`.
    ///
    /// Iterates a snapshot of the subscriber set taken before any run starts;
    /// churn caused by the runs themselves does not affect which subscribers
    /// from this notification get executed. The first failing run aborts the
    /// remainder of the snapshot and propagates.
    pub(crate) fn notify(&self, dep: DepId) -> Result<()> {
        let snapshot: Vec<(EffectId, Weak<EffectInner>)> = {
            let graph = self.graph.read();
            let Some(subs) = graph.subscribers.get(&dep) else {
                return Ok(());
            };
            subs.iter()
                .map(|id| {
                    let weak = graph.effects.get(id).cloned().unwrap_or_default();
                    (*id, weak)
                })
                .collect()
        };

        trace!(?dep, subscribers = snapshot.len(), "notify");

        let mut dead: SmallVec<[EffectId; 4]> = SmallVec::new();
        let mut live = Vec::with_capacity(snapshot.len());
        for (id, weak) in snapshot {
            match weak.upgrade() {
                Some(effect) => live.push(effect),
                None => dead.push(id),
            }
        }

        // Effects dropped without an explicit dispose leave tombstones;
        // reclaim them before running anything.
        for id in dead {
            self.remove_effect(id);
        }

        for effect in live {
            effect.run(self)?;
        }
        Ok(())
    }

    /// Make an effect reachable from notifications.
    pub(crate) fn register_effect(&self, effect: &Arc<EffectInner>) {
        self.graph
            .write()
            .effects
            .insert(effect.id(), Arc::downgrade(effect));
    }

    /// Tear down every subscription an effect currently holds.
    ///
    /// Called before each run so that branches not taken in the new run drop
    /// their stale subscriptions, and on disposal.
    pub(crate) fn clear_dependencies(&self, effect: EffectId) {
        let mut graph = self.graph.write();
        let Some(deps) = graph.dependencies.remove(&effect) else {
            return;
        };
        for dep in deps {
            if let Some(subs) = graph.subscribers.get_mut(&dep) {
                let removed = subs.remove(&effect);
                debug_assert!(
                    removed,
                    "dependency {dep:?} lost its subscriber half for {effect:?}"
                );
            }
        }
    }

    /// Fully remove an effect from the graph: subscriptions and registry.
    pub(crate) fn remove_effect(&self, effect: EffectId) {
        self.clear_dependencies(effect);
        self.graph.write().effects.remove(&effect);
    }

    /// Drop a dependency and every edge pointing at it.
    pub(crate) fn release_dependency(&self, dep: DepId) {
        let mut graph = self.graph.write();
        let Some(subs) = graph.subscribers.remove(&dep) else {
            return;
        };
        for effect in subs {
            if let Some(deps) = graph.dependencies.get_mut(&effect) {
                let removed = deps.remove(&dep);
                debug_assert!(
                    removed,
                    "effect {effect:?} lost its dependency half for {dep:?}"
                );
            }
        }
    }

    /// Number of effects subscribed to `dep`.
    pub(crate) fn subscriber_count(&self, dep: DepId) -> usize {
        self.graph
            .read()
            .subscribers
            .get(&dep)
            .map_or(0, HashSet::len)
    }

    /// Number of dependencies `effect` is currently subscribed to.
    pub(crate) fn dependency_count(&self, effect: EffectId) -> usize {
        self.graph
            .read()
            .dependencies
            .get(&effect)
            .map_or(0, HashSet::len)
    }

    /// Check the bidirectional subscription invariant over the whole graph.
    #[cfg(test)]
    fn is_symmetric(&self) -> bool {
        let graph = self.graph.read();
        let forward = graph.subscribers.iter().all(|(dep, subs)| {
            subs.iter().all(|effect| {
                graph
                    .dependencies
                    .get(effect)
                    .is_some_and(|deps| deps.contains(dep))
            })
        });
        let backward = graph.dependencies.iter().all(|(effect, deps)| {
            deps.iter().all(|dep| {
                graph
                    .subscribers
                    .get(dep)
                    .is_some_and(|subs| subs.contains(effect))
            })
        });
        forward && backward
    }
}

/// Shared ownership token for one dependency.
///
/// Reactive containers hold this behind an `Arc`; when the last clone drops,
/// the dependency and all edges pointing at it are released from the graph.
pub(crate) struct DepHandle {
    id: DepId,
    runtime: Weak<RuntimeInner>,
}

impl DepHandle {
    pub(crate) fn new(runtime: &Runtime) -> Self {
        Self {
            id: DepId::new(),
            runtime: Arc::downgrade(&runtime.inner),
        }
    }

    pub(crate) fn id(&self) -> DepId {
        self.id
    }
}

impl Drop for DepHandle {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.release_dependency(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, Signal};

    #[test]
    fn untracked_read_adds_no_edges() {
        let runtime = Runtime::new();
        let signal = Signal::new(&runtime, 1);

        let _ = signal.get();

        assert_eq!(signal.subscriber_count(), 0);
        assert!(runtime.inner.is_symmetric());
    }

    #[test]
    fn graph_stays_symmetric_under_churn() {
        let runtime = Runtime::new();
        let a = Signal::new(&runtime, 0);
        let b = Signal::new(&runtime, 0);
        let flag = Signal::new(&runtime, true);

        let (a2, b2, flag2) = (a.clone(), b.clone(), flag.clone());
        let effect = Effect::new(&runtime, move || {
            if flag2.get() {
                let _ = a2.get();
            } else {
                let _ = b2.get();
            }
            Ok(())
        })
        .unwrap();

        assert!(runtime.inner.is_symmetric());
        assert_eq!(a.subscriber_count(), 1);
        assert_eq!(b.subscriber_count(), 0);

        // Flip the branch several times; edges must follow.
        for mounted in [false, true, false] {
            flag.set(mounted).unwrap();
            assert!(runtime.inner.is_symmetric());
        }
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 1);

        effect.dispose();
        assert!(runtime.inner.is_symmetric());
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn dropping_signal_releases_its_edges() {
        let runtime = Runtime::new();
        let signal = Signal::new(&runtime, 0);

        // The closure reads through a slot so the test can drop every clone
        // of the signal while the effect is still alive.
        let slot = Arc::new(parking_lot::Mutex::new(Some(signal.clone())));
        let reader = Arc::clone(&slot);
        let effect = Effect::new(&runtime, move || {
            if let Some(signal) = reader.lock().as_ref() {
                let _ = signal.get();
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(effect.dependency_count(), 1);

        // All clones gone: the dependency leaves the graph and the effect's
        // back-reference goes with it.
        slot.lock().take();
        drop(signal);
        assert_eq!(effect.dependency_count(), 0);
        assert!(runtime.inner.is_symmetric());
    }

    #[test]
    fn notify_prunes_dropped_effects() {
        let runtime = Runtime::new();
        let signal = Signal::new(&runtime, 0);

        let reader = signal.clone();
        let effect = Effect::new(&runtime, move || {
            let _ = reader.get();
            Ok(())
        })
        .unwrap();
        assert_eq!(signal.subscriber_count(), 1);

        // Dropped without dispose: the next notification reclaims it.
        drop(effect);
        signal.set(1).unwrap();
        assert_eq!(signal.subscriber_count(), 0);
        assert!(runtime.inner.is_symmetric());
    }

    #[test]
    fn runtimes_are_independent() {
        let rt_a = Runtime::new();
        let rt_b = Runtime::new();
        let on_a = Signal::new(&rt_a, 0);

        let reader = on_a.clone();
        let _effect = Effect::new(&rt_b, move || {
            // Reads a signal that lives on another runtime: the other graph
            // has no active effect, so no subscription forms.
            let _ = reader.get();
            Ok(())
        })
        .unwrap();

        assert_eq!(on_a.subscriber_count(), 0);
    }
}
