//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, computed values,
//! and effects. These primitives form the foundation of Vireo's fine-grained
//! reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while an effect is running, the signal automatically registers that effect
//! as a subscriber. When the signal's value changes, every subscriber re-runs.
//! Writes are equality-gated: storing a value equal to the current one
//! notifies nobody.
//!
//! ## Effects
//!
//! An Effect is a re-runnable computation that subscribes to everything it
//! reads. Before each run it tears down its previous subscriptions entirely,
//! so branches not taken this time around do not keep stale subscriptions
//! alive.
//!
//! ## Computed values
//!
//! A Computed is a read-only container backed by an effect that recomputes a
//! getter whenever its inputs change. Reading a computed value returns the
//! cached result and, inside a tracked context, subscribes the reader to the
//! computed's own dependency.
//!
//! # Implementation Notes
//!
//! Each [`Runtime`] owns one reactive graph: the subscriber sets, the
//! per-effect dependency sets, and the active-effect stack used to wire reads
//! to subscriptions. Multiple independent graphs can coexist in one process;
//! nothing here is global. The engine assumes a single logical thread of
//! control per graph; the locking exists to keep that assumption safe, not
//! to support concurrent effect execution.

mod computed;
mod context;
mod effect;
mod ids;
mod runtime;
mod signal;

pub use computed::Computed;
pub use effect::{watch, Effect};
pub use ids::{DepId, EffectId};
pub use runtime::Runtime;
pub use signal::Signal;
