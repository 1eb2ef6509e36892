//! Error Types
//!
//! The crate-wide error taxonomy. Reconciler and lifecycle failures are
//! explicit `Result` returns so callers can decide a recovery policy (the
//! usual one being a full remount of the affected subtree). Internal graph
//! inconsistencies are engine bugs and are checked with `debug_assert!`
//! rather than surfaced as variants.

use thiserror::Error;

use crate::component::Hook;
use crate::vdom::{NodeId, PlatformError};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the reactive engine, the reconciler, and the
/// component driver.
#[derive(Debug, Error)]
pub enum Error {
    /// `patch` or `unmount` was called with a node that has no live
    /// platform-element mapping. The caller drove the mount/patch/unmount
    /// sequence out of order.
    #[error("stale node reference: {0:?} has no mounted platform element")]
    StaleReference(NodeId),

    /// A platform call failed. Reported upward immediately; the tree may be
    /// left partially patched and the caller should treat the affected
    /// subtree as needing a remount.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A render function or effect computation failed. The active-effect
    /// slot is restored before this propagates, so unrelated reactive reads
    /// remain correct.
    #[error("render failed: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A non-error lifecycle callback failed. Propagates to whoever invoked
    /// the lifecycle transition.
    #[error("lifecycle hook {hook:?} failed: {source}")]
    Hook {
        hook: Hook,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Build a [`Error::Render`] from a plain message.
    pub fn render(message: impl Into<String>) -> Self {
        Error::Render(message.into().into())
    }
}
