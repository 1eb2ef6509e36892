//! Lifecycle Dispatch
//!
//! A small ordered registry of callbacks keyed by hook. The mount driver
//! calls hooks around reconciler operations: BeforeMount/Mounted bracket the
//! initial subtree construction, BeforeUpdate/Updated bracket each patch,
//! BeforeUnmount/Unmounted bracket teardown, and Created fires once when the
//! component instance is set up.
//!
//! Callbacks run in registration order. A failure in a regular hook stops
//! the remaining callbacks for that hook and propagates; the caller decides
//! whether to continue. Error callbacks are different: they receive the
//! raised error as input and every one of them always runs.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// The lifecycle stages a component moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    BeforeUnmount,
    Unmounted,
}

type HookFn = Box<dyn Fn() -> Result<()> + Send + Sync>;
type ErrorHookFn = Box<dyn Fn(&Error) + Send + Sync>;

/// Ordered multi-subscriber registry of lifecycle callbacks.
#[derive(Default)]
pub struct LifecycleRegistry {
    hooks: HashMap<Hook, Vec<HookFn>>,
    error_hooks: Vec<ErrorHookFn>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for a hook.
    pub fn on<F>(&mut self, hook: Hook, callback: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.entry(hook).or_default().push(Box::new(callback));
    }

    /// Register an error-captured callback.
    pub fn on_error<F>(&mut self, callback: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.error_hooks.push(Box::new(callback));
    }

    /// Invoke every callback registered for `hook`, in registration order.
    ///
    /// The first failure stops the rest and propagates, wrapped with the
    /// hook it came from.
    pub fn call(&self, hook: Hook) -> Result<()> {
        let Some(callbacks) = self.hooks.get(&hook) else {
            return Ok(());
        };
        for callback in callbacks {
            callback().map_err(|source| Error::Hook {
                hook,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    /// Invoke every error-captured callback with `error`. All of them run.
    pub fn call_error(&self, error: &Error) {
        for callback in &self.error_hooks {
            callback(error);
        }
    }

    /// Whether any error-captured callback is registered.
    pub fn has_error_hooks(&self) -> bool {
        !self.error_hooks.is_empty()
    }

    /// Number of callbacks registered for `hook`.
    pub fn hook_count(&self, hook: Hook) -> usize {
        self.hooks.get(&hook).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for LifecycleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleRegistry")
            .field("hooks", &self.hooks.values().map(Vec::len).sum::<usize>())
            .field("error_hooks", &self.error_hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn callbacks_run_in_registration_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut registry = LifecycleRegistry::new();

        for label in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            registry.on(Hook::Mounted, move || {
                sink.lock().push(label);
                Ok(())
            });
        }

        registry.call(Hook::Mounted).unwrap();
        assert_eq!(order.lock().as_slice(), ["first", "second", "third"]);
    }

    #[test]
    fn failure_stops_remaining_callbacks() {
        let later_ran = Arc::new(AtomicUsize::new(0));
        let mut registry = LifecycleRegistry::new();

        registry.on(Hook::BeforeMount, || Err(Error::render("hook failed")));
        let counter = Arc::clone(&later_ran);
        registry.on(Hook::BeforeMount, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = registry.call(Hook::BeforeMount).unwrap_err();
        assert!(matches!(
            err,
            Error::Hook {
                hook: Hook::BeforeMount,
                ..
            }
        ));
        assert_eq!(later_ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_error_callbacks_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = LifecycleRegistry::new();

        for _ in 0..3 {
            let counter = Arc::clone(&calls);
            registry.on_error(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        registry.call_error(&Error::render("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unregistered_hook_is_a_noop() {
        let registry = LifecycleRegistry::new();
        registry.call(Hook::Updated).unwrap();
        assert_eq!(registry.hook_count(Hook::Updated), 0);
        assert!(!registry.has_error_hooks());
    }
}
