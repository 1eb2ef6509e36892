//! Integration Tests for the Reactive System
//!
//! These tests verify that signals, computed values, and effects work
//! together correctly through the public API.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use vireo_core::reactive::{watch, Computed, Effect, Runtime, Signal};

/// Writing a different value re-runs a subscribed effect exactly once;
/// writing an equal value re-runs nothing.
#[test]
fn write_tracking_is_exact() {
    let runtime = Runtime::new();
    let signal = Signal::new(&runtime, 0);
    let runs = Arc::new(AtomicI32::new(0));

    let reader = signal.clone();
    let counter = runs.clone();
    let _effect = Effect::new(&runtime, move || {
        let _ = reader.get();
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    signal.set(1).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    // Equal write: zero re-runs.
    signal.set(1).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// An effect that conditionally reads `a` or `b` and currently reads only
/// `a` must not re-run when `b` changes.
#[test]
fn stale_subscriptions_are_dropped() {
    let runtime = Runtime::new();
    let use_a = Signal::new(&runtime, true);
    let a = Signal::new(&runtime, 0);
    let b = Signal::new(&runtime, 0);
    let runs = Arc::new(AtomicI32::new(0));

    let (flag, a2, b2) = (use_a.clone(), a.clone(), b.clone());
    let counter = runs.clone();
    let _effect = Effect::new(&runtime, move || {
        if flag.get() {
            let _ = a2.get();
        } else {
            let _ = b2.get();
        }
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // Currently on the `a` branch: `b` is not a dependency.
    b.set(10).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    a.set(10).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    // Switch branches: now `a` must stop triggering.
    use_a.set(false).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 3);

    a.set(20).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 3);

    b.set(20).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 4);
}

/// Effects see computed values exactly like signals, and equality gating in
/// the computed shields downstream subscribers.
#[test]
fn computed_feeds_effects() {
    let runtime = Runtime::new();
    let celsius = Signal::new(&runtime, 0i32);

    let reader = celsius.clone();
    let freezing = Computed::new(&runtime, move || reader.get() <= 0).unwrap();

    let observed = Arc::new(AtomicI32::new(-1));
    let sink = observed.clone();
    let derived = freezing.clone();
    let _effect = Effect::new(&runtime, move || {
        sink.store(derived.get() as i32, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 1);

    // Still freezing: computed result unchanged, effect untouched.
    celsius.set(-5).unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 1);

    celsius.set(12).unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 0);
}

/// Disposal is synchronous: no state change afterwards reaches the effect.
#[test]
fn dispose_stops_rerun_immediately() {
    let runtime = Runtime::new();
    let signal = Signal::new(&runtime, 0);
    let runs = Arc::new(AtomicI32::new(0));

    let reader = signal.clone();
    let counter = runs.clone();
    let effect = Effect::new(&runtime, move || {
        let _ = reader.get();
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    effect.dispose();
    assert_eq!(signal.subscriber_count(), 0);

    signal.set(1).unwrap();
    signal.set(2).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// A failing effect surfaces its error at the write site and leaves the
/// ambient tracking context intact for unrelated work.
#[test]
fn effect_failure_propagates_to_the_write() {
    let runtime = Runtime::new();
    let signal = Signal::new(&runtime, 0);

    let reader = signal.clone();
    let _effect = Effect::new(&runtime, move || {
        if reader.get() > 0 {
            return Err(vireo_core::Error::render("value went positive"));
        }
        Ok(())
    })
    .unwrap();

    let err = signal.set(5).unwrap_err();
    assert!(err.to_string().contains("value went positive"));
    assert!(!runtime.is_tracking());

    // The graph still works for unrelated effects.
    let other = Signal::new(&runtime, 0);
    let reader = other.clone();
    let effect = Effect::new(&runtime, move || {
        let _ = reader.get();
        Ok(())
    })
    .unwrap();
    other.set(1).unwrap();
    assert_eq!(effect.run_count(), 2);
}

/// Watchers deliver the source value on every change.
#[test]
fn watch_observes_changes() {
    let runtime = Runtime::new();
    let count = Signal::new(&runtime, 1);
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let reader = count.clone();
    let sink = Arc::clone(&seen);
    let watcher = watch(
        &runtime,
        move || reader.get() * 10,
        move |value: &i32| sink.lock().push(*value),
    )
    .unwrap();

    count.set(2).unwrap();
    count.set(3).unwrap();
    assert_eq!(seen.lock().as_slice(), [10, 20, 30]);

    watcher.dispose();
    count.set(4).unwrap();
    assert_eq!(seen.lock().len(), 3);
}

/// Two runtimes never share subscriptions, even for interleaved work.
#[test]
fn independent_graphs_stay_isolated() {
    let rt_a = Runtime::new();
    let rt_b = Runtime::new();

    let on_a = Signal::new(&rt_a, 0);
    let on_b = Signal::new(&rt_b, 0);
    let runs_a = Arc::new(AtomicI32::new(0));
    let runs_b = Arc::new(AtomicI32::new(0));

    let (reader, counter) = (on_a.clone(), runs_a.clone());
    let _effect_a = Effect::new(&rt_a, move || {
        let _ = reader.get();
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    let (reader, counter) = (on_b.clone(), runs_b.clone());
    let _effect_b = Effect::new(&rt_b, move || {
        let _ = reader.get();
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    on_a.set(1).unwrap();
    assert_eq!(runs_a.load(Ordering::SeqCst), 2);
    assert_eq!(runs_b.load(Ordering::SeqCst), 1);
}
