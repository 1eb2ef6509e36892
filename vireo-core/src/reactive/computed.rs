//! Computed Values
//!
//! A Computed is a read-only reactive container whose value is derived from
//! other reactive values by a getter function.
//!
//! # How Computed Values Work
//!
//! 1. Construction runs the getter once under a backing effect, so the
//!    computed subscribes to everything the getter reads.
//!
//! 2. When an input changes, the backing effect recomputes. If the result
//!    compares equal to the cached value, nothing further happens; the
//!    computed's own subscribers are left alone.
//!
//! 3. Reading the computed returns the cached result and, inside a tracked
//!    context, subscribes the reader to the computed's own dependency.
//!    Effects depend on derived state exactly as they depend on signals.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;

use super::ids::DepId;
use super::runtime::{DepHandle, Runtime};
use super::Effect;

/// A cached derived value that recomputes when its inputs change.
///
/// Cloning shares state. The backing effect lives as long as the computed
/// does; [`Computed::dispose`] stops it synchronously.
pub struct Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    dep: Arc<DepHandle>,
    value: Arc<RwLock<Option<T>>>,
    effect: Effect,
    runtime: Runtime,
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a computed value from a getter.
    ///
    /// The getter runs once immediately; its reads become the computed's
    /// input subscriptions.
    pub fn new<F>(runtime: &Runtime, getter: F) -> Result<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let dep = Arc::new(DepHandle::new(runtime));
        let value: Arc<RwLock<Option<T>>> = Arc::new(RwLock::new(None));

        let dep_id = dep.id();
        let cache = Arc::clone(&value);
        let graph = runtime.clone();
        let effect = Effect::new(runtime, move || {
            let next = getter();
            let changed = {
                let current = cache.read();
                current.as_ref() != Some(&next)
            };
            if !changed {
                return Ok(());
            }
            *cache.write() = Some(next);
            graph.inner.notify(dep_id)
        })?;

        Ok(Self {
            dep,
            value,
            effect,
            runtime: runtime.clone(),
        })
    }

    /// The computed's dependency ID.
    pub fn id(&self) -> DepId {
        self.dep.id()
    }

    /// Get the cached value.
    ///
    /// Inside a running effect this subscribes the effect to the computed.
    pub fn get(&self) -> T {
        self.runtime.inner.track(self.dep.id());
        self.get_untracked()
    }

    /// Get the cached value without establishing a subscription.
    pub fn get_untracked(&self) -> T {
        self.value
            .read()
            .clone()
            .expect("computed value initialized on construction")
    }

    /// Synchronously stop recomputation and drop all input subscriptions.
    pub fn dispose(&self) {
        self.effect.dispose();
    }

    /// Number of effects currently subscribed to this computed.
    pub fn subscriber_count(&self) -> usize {
        self.runtime.inner.subscriber_count(self.dep.id())
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            dep: Arc::clone(&self.dep),
            value: Arc::clone(&self.value),
            effect: self.effect.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.dep.id())
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn computed_derives_from_signal() {
        let runtime = Runtime::new();
        let count = Signal::new(&runtime, 2);

        let reader = count.clone();
        let doubled = Computed::new(&runtime, move || reader.get() * 2).unwrap();
        assert_eq!(doubled.get(), 4);

        count.set(5).unwrap();
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn effect_tracks_computed() {
        let runtime = Runtime::new();
        let count = Signal::new(&runtime, 1);

        let reader = count.clone();
        let doubled = Computed::new(&runtime, move || reader.get() * 2).unwrap();

        let observed = Arc::new(AtomicI32::new(0));
        let observed_clone = observed.clone();
        let derived = doubled.clone();
        let _effect = Effect::new(&runtime, move || {
            observed_clone.store(derived.get(), Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert_eq!(observed.load(Ordering::SeqCst), 2);
        assert_eq!(doubled.subscriber_count(), 1);

        count.set(3).unwrap();
        assert_eq!(observed.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn unchanged_result_does_not_notify_subscribers() {
        let runtime = Runtime::new();
        let count = Signal::new(&runtime, 1);

        // Parity only changes when the number flips between odd and even.
        let reader = count.clone();
        let parity = Computed::new(&runtime, move || reader.get() % 2).unwrap();

        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();
        let derived = parity.clone();
        let _effect = Effect::new(&runtime, move || {
            let _ = derived.get();
            runs_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // 1 -> 3: parity stays odd, downstream effect untouched.
        count.set(3).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // 3 -> 4: parity flips, downstream effect re-runs.
        count.set(4).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disposed_computed_stops_recomputing() {
        let runtime = Runtime::new();
        let count = Signal::new(&runtime, 1);

        let reader = count.clone();
        let doubled = Computed::new(&runtime, move || reader.get() * 2).unwrap();
        assert_eq!(doubled.get(), 2);

        doubled.dispose();
        count.set(10).unwrap();

        // The cache keeps its last value.
        assert_eq!(doubled.get_untracked(), 2);
    }

    #[test]
    fn computed_chain_propagates() {
        let runtime = Runtime::new();
        let base = Signal::new(&runtime, 5);

        let reader = base.clone();
        let doubled = Computed::new(&runtime, move || reader.get() * 2).unwrap();
        let derived = doubled.clone();
        let plus_ten = Computed::new(&runtime, move || derived.get() + 10).unwrap();

        assert_eq!(doubled.get(), 10);
        assert_eq!(plus_ten.get(), 20);

        base.set(10).unwrap();
        assert_eq!(doubled.get(), 20);
        assert_eq!(plus_ten.get(), 30);
    }
}
