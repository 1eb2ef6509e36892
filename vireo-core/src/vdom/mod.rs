//! Virtual Tree
//!
//! This module implements the virtual element tree and the reconciler that
//! keeps a platform-rendered tree synchronized with it.
//!
//! # Overview
//!
//! - [`VNode`] is an immutable description of one element or text unit. A
//!   render pass always produces a whole new tree; a tree handed to the
//!   reconciler is never mutated, only replaced.
//! - [`Platform`] is the narrow seam through which concrete rendering
//!   backends are driven. The reconciler never touches a rendering surface
//!   directly.
//! - [`Reconciler`] walks an old and a new tree and emits the minimal set of
//!   structural and attribute operations, correlating virtual nodes with
//!   platform elements through a bidirectional mapping it exclusively owns.
//! - [`MemoryPlatform`] is an in-memory backend with an ordered mutation log,
//!   used for headless rendering and for asserting exactly which operations a
//!   patch performed.

mod memory;
mod node;
mod platform;
mod reconciler;

pub use memory::{MemoryHandle, MemoryPlatform, Mutation};
pub use node::{ElementBuilder, ElementNode, NodeId, TextNode, VNode};
pub use platform::{Platform, PlatformError};
pub use reconciler::Reconciler;
