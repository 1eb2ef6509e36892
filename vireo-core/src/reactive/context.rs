//! Active-Effect Context
//!
//! Tracks which effect is currently running on a given runtime. When a signal
//! is read, the runtime consults this stack to decide whether the read should
//! establish a subscription.
//!
//! The stack is scoped to one [`Runtime`](super::Runtime) rather than being
//! process-wide, so multiple independent reactive graphs stay isolated from
//! each other. Entries are pushed and popped through a guard so the stack is
//! restored even when the effect's computation fails or panics.

use parking_lot::Mutex;

use super::ids::EffectId;

/// The stack of effects currently executing on one runtime.
///
/// Nested runs (an effect triggering a computed recomputation, for example)
/// push inner entries; only the top of the stack receives new subscriptions.
#[derive(Debug, Default)]
pub(crate) struct ActiveStack {
    stack: Mutex<Vec<EffectId>>,
}

impl ActiveStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The effect currently being tracked, if any.
    pub(crate) fn current(&self) -> Option<EffectId> {
        self.stack.lock().last().copied()
    }

    /// Whether any effect is currently running.
    pub(crate) fn is_tracking(&self) -> bool {
        !self.stack.lock().is_empty()
    }
}

/// Guard that marks an effect as active for the duration of its run.
///
/// Dropping the guard restores the previously active effect on both normal
/// return and unwinding, so a failing computation cannot corrupt the ambient
/// tracking context for unrelated code paths.
pub(crate) struct TrackingScope<'a> {
    stack: &'a ActiveStack,
    effect: EffectId,
}

impl<'a> TrackingScope<'a> {
    pub(crate) fn enter(stack: &'a ActiveStack, effect: EffectId) -> Self {
        stack.stack.lock().push(effect);
        Self { stack, effect }
    }
}

impl Drop for TrackingScope<'_> {
    fn drop(&mut self) {
        let popped = self.stack.stack.lock().pop();
        debug_assert_eq!(
            popped,
            Some(self.effect),
            "tracking scope mismatch: expected {:?}, got {:?}",
            self.effect,
            popped
        );
    }
}
