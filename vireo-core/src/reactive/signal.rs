//! Signal Implementation
//!
//! A Signal is the basic unit of reactive state: a value cell that knows
//! which effects read it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an effect is running, the signal registers
//!    that effect as a subscriber.
//!
//! 2. When a signal's value changes, all subscribers re-run.
//!
//! 3. Writes are equality-gated: setting a value equal to the stored one is
//!    a complete no-op, so redundant writes cannot cause render churn. This
//!    is why `T` must implement `PartialEq`.
//!
//! # Errors
//!
//! [`Signal::set`] returns whatever the triggered effect runs return. The
//! notification machinery never swallows a failure; the first failing
//! subscriber aborts the rest of the notification snapshot and the error
//! surfaces at the write site.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::Result;

use super::ids::DepId;
use super::runtime::{DepHandle, Runtime};

/// A reactive container holding a value of type `T`.
///
/// Cloning a signal shares its state: all clones read and write the same
/// value and the same dependency.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::new();
/// let count = Signal::new(&runtime, 0);
///
/// // Read the value (tracked when inside an effect)
/// let value = count.get();
///
/// // Update the value (re-runs subscribers)
/// count.set(5)?;
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// The dependency this container notifies through. Released from the
    /// graph when the last clone drops.
    dep: Arc<DepHandle>,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// The graph this signal lives on.
    runtime: Runtime,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal on the given runtime.
    pub fn new(runtime: &Runtime, value: T) -> Self {
        Self {
            dep: Arc::new(DepHandle::new(runtime)),
            value: Arc::new(RwLock::new(value)),
            runtime: runtime.clone(),
        }
    }

    /// The signal's dependency ID.
    pub fn id(&self) -> DepId {
        self.dep.id()
    }

    /// Get the current value.
    ///
    /// If an effect is currently running on this signal's runtime, it is
    /// subscribed to the signal. Reading outside any effect is legal and
    /// simply untracked.
    pub fn get(&self) -> T {
        self.runtime.inner.track(self.dep.id());
        self.value.read().clone()
    }

    /// Get the current value without establishing a subscription.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Store a new value and re-run subscribers.
    ///
    /// A value equal to the current one is a no-op: nothing is stored and
    /// nobody is notified.
    pub fn set(&self, value: T) -> Result<()> {
        {
            let mut guard = self.value.write();
            if *guard == value {
                trace!(dep = ?self.dep.id(), "write gated: value unchanged");
                return Ok(());
            }
            *guard = value;
        }
        self.runtime.inner.notify(self.dep.id())
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(new_value)
    }

    /// Number of effects currently subscribed to this signal.
    pub fn subscriber_count(&self) -> usize {
        self.runtime.inner.subscriber_count(self.dep.id())
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            dep: Arc::clone(&self.dep),
            value: Arc::clone(&self.value),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.dep.id())
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
