//! Vireo Core
//!
//! This crate provides the core runtime for the Vireo reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (signals, computed values, effects)
//! - Automatic dependency tracking
//! - A virtual tree with an incremental mount/diff/patch reconciler
//! - Component lifecycle dispatch
//!
//! Template compilation, routing, stores, and concrete rendering backends
//! live outside this crate; they produce or consume the data structures
//! defined here through narrow seams (`Component`, `Platform`).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: signals, effects, computed values, and the per-graph runtime
//!   that wires reads to subscriptions
//! - `vdom`: immutable virtual nodes, the platform seam, and the reconciler
//!   that turns tree diffs into platform calls
//! - `component`: the `Component` trait, lifecycle hooks, and the `App`
//!   driver that connects a render function to the reconciler
//!
//! # Example
//!
//! ```rust,ignore
//! use vireo_core::reactive::{Runtime, Signal, Effect};
//!
//! let runtime = Runtime::new();
//! let count = Signal::new(&runtime, 0);
//!
//! let count_reader = count.clone();
//! let effect = Effect::new(&runtime, move || {
//!     println!("count is {}", count_reader.get());
//!     Ok(())
//! })?;
//!
//! count.set(5)?;
//! // Effect automatically re-runs, prints: "count is 5"
//! ```

pub mod component;
pub mod error;
pub mod reactive;
pub mod vdom;

pub use error::{Error, Result};
