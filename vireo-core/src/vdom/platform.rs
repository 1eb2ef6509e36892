//! Platform Seam
//!
//! The reconciler drives a concrete rendering surface exclusively through the
//! [`Platform`] trait. A backend maps handles to real elements (DOM nodes, a
//! terminal grid, a test document) and performs the structural and attribute
//! operations the reconciler asks for.
//!
//! Failures are reported per operation and surfaced to the reconciler's
//! caller immediately; there is no retry. A failed operation may leave the
//! rendered tree partially patched, which callers should treat as requiring
//! a remount of the affected subtree.

use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// A failed platform operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("platform operation `{op}` failed: {message}")]
pub struct PlatformError {
    /// The operation that failed, e.g. `"insert_before"`.
    pub op: &'static str,
    pub message: String,
}

impl PlatformError {
    pub fn new(op: &'static str, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

/// Operations a rendering backend must provide.
///
/// Handles are opaque references to concretely rendered elements, owned by
/// the backend. The reconciler only stores and passes them back.
pub trait Platform {
    type Handle: Clone + Eq + Hash + Debug;

    /// Create an element of the given tag, detached from any parent.
    fn create_element(&mut self, tag: &str) -> Result<Self::Handle, PlatformError>;

    /// Create a text primitive, detached from any parent.
    fn create_text(&mut self, content: &str) -> Result<Self::Handle, PlatformError>;

    /// Set (or overwrite) an attribute on an element.
    fn set_attribute(
        &mut self,
        element: &Self::Handle,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError>;

    /// Remove an attribute from an element.
    fn remove_attribute(&mut self, element: &Self::Handle, name: &str)
        -> Result<(), PlatformError>;

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<(), PlatformError>;

    /// Insert `new_child` immediately before `reference` among `parent`'s
    /// children, detaching it from any previous parent first.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        new_child: &Self::Handle,
        reference: &Self::Handle,
    ) -> Result<(), PlatformError>;

    /// Detach `child` from `parent`.
    fn remove_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<(), PlatformError>;
}
