//! Effect Implementation
//!
//! An Effect is a re-runnable computation that subscribes to every reactive
//! value it reads during its run.
//!
//! # How Effects Work
//!
//! 1. Creation runs the computation once, immediately, which establishes
//!    the initial subscriptions.
//!
//! 2. When any subscribed dependency changes, the effect re-runs.
//!
//! 3. Before each run, the effect tears down its entire previous dependency
//!    set. An effect reading `a` or `b` depending on a branch must drop its
//!    subscription to whichever side the new run does not take; incremental
//!    patching cannot guarantee that, a full rebuild can.
//!
//! # Failure
//!
//! The wrapped computation returns a `Result`. On failure the active-effect
//! slot is still restored (the tracking scope is a drop guard) and the error
//! propagates to whatever triggered the run. The dependency set may be left
//! partial from the failed attempt; the next run rebuilds it wholesale.
//!
//! # Re-entrancy
//!
//! An effect that writes a signal it also reads re-enters its own run and
//! will deadlock on its closure. Stabilizing such state is a caller
//! obligation, not an engine guarantee.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::Result;

use super::context::TrackingScope;
use super::ids::EffectId;
use super::runtime::{Runtime, RuntimeInner};

type EffectFn = Box<dyn FnMut() -> Result<()> + Send>;

pub(crate) struct EffectInner {
    id: EffectId,
    f: Mutex<EffectFn>,
    disposed: AtomicBool,
    run_count: AtomicUsize,
}

impl EffectInner {
    pub(crate) fn id(&self) -> EffectId {
        self.id
    }

    /// Execute one run: full subscription teardown, then the computation
    /// under a tracking scope that restores the previous active effect on
    /// every exit path.
    pub(crate) fn run(&self, runtime: &RuntimeInner) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Ok(());
        }

        runtime.clear_dependencies(self.id);

        let _scope = TrackingScope::enter(&runtime.active, self.id);
        trace!(effect = ?self.id, "effect run");
        self.run_count.fetch_add(1, Ordering::SeqCst);
        (self.f.lock())()
    }
}

/// A re-runnable computation that auto-subscribes to everything it reads.
///
/// Cloning shares state; disposal through any clone stops all of them.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::new();
/// let count = Signal::new(&runtime, 0);
///
/// let reader = count.clone();
/// let effect = Effect::new(&runtime, move || {
///     println!("count is {}", reader.get());
///     Ok(())
/// })?;
///
/// count.set(5)?; // effect re-runs
/// ```
pub struct Effect {
    inner: Arc<EffectInner>,
    runtime: Runtime,
}

impl Effect {
    /// Create an effect and run it immediately to establish subscriptions.
    pub fn new<F>(runtime: &Runtime, f: F) -> Result<Self>
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        let effect = Self::new_lazy(runtime, f);
        effect.run()?;
        Ok(effect)
    }

    /// Create an effect without running it.
    ///
    /// It holds no subscriptions until the first [`Effect::run`].
    pub fn new_lazy<F>(runtime: &Runtime, f: F) -> Self
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        let inner = Arc::new(EffectInner {
            id: EffectId::new(),
            f: Mutex::new(Box::new(f)),
            disposed: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
        });
        runtime.inner.register_effect(&inner);
        Self {
            inner,
            runtime: runtime.clone(),
        }
    }

    /// The effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Run the computation now.
    pub fn run(&self) -> Result<()> {
        self.inner.run(&self.runtime.inner)
    }

    /// Synchronously stop the effect and unsubscribe it everywhere.
    ///
    /// After disposal the effect never runs again, and no dependency holds a
    /// reference to it.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            self.runtime.inner.remove_effect(self.inner.id);
        }
    }

    /// Whether the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of completed or attempted runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Number of dependencies the effect is currently subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.runtime.inner.dependency_count(self.inner.id)
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            runtime: self.runtime.clone(),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Observe a reactive source and invoke a callback with its current value.
///
/// The source getter runs under tracking, so whatever it reads becomes the
/// watcher's dependency set; the callback itself runs with the value already
/// computed. The callback fires once immediately with the initial value.
pub fn watch<T, G, C>(runtime: &Runtime, source: G, mut callback: C) -> Result<Effect>
where
    T: 'static,
    G: Fn() -> T + Send + 'static,
    C: FnMut(&T) + Send + 'static,
{
    Effect::new(runtime, move || {
        let value = source();
        callback(&value);
        Ok(())
    })
}
