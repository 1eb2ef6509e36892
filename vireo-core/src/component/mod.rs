//! Components
//!
//! A component is a render function plus lifecycle callbacks. The [`App`]
//! driver wires one component instance to a [`Reconciler`]: it installs a
//! render effect whose first run mounts the tree. Later runs, triggered by
//! whatever reactive state the render read, patch old against new.
//!
//! # State machine
//!
//! `Unmounted → Mounted → Mounted(updated)* → Unmounted`. Updates happen
//! only while mounted; after [`App::unmount`] the render effect is disposed
//! and no state change re-renders the component.
//!
//! # Errors
//!
//! A failure during a render pass (render function, lifecycle callback, or
//! platform call) is routed to the component's error-captured callbacks if
//! any are registered; otherwise it propagates to whatever triggered the
//! run. For an update, that is the `Signal::set` call that notified the
//! render effect.

mod lifecycle;

pub use lifecycle::{Hook, LifecycleRegistry};

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::reactive::{Effect, Runtime};
use crate::vdom::{Platform, Reconciler, VNode};

/// A renderable unit.
///
/// `render` must be deterministic given the same reactive reads; the reads
/// themselves are how the component subscribes to state. Side effects belong
/// in lifecycle callbacks, not in `render`.
pub trait Component: Send + Sync + 'static {
    /// Register lifecycle callbacks. Called once, before `Created` fires.
    fn setup(&self, hooks: &mut LifecycleRegistry) {
        let _ = hooks;
    }

    /// Produce the virtual tree for the current state.
    fn render(&self) -> Result<VNode>;
}

struct MountState<P: Platform> {
    reconciler: Reconciler<P>,
    tree: Option<VNode>,
    container: Option<P::Handle>,
}

/// Drives one component instance against a platform.
pub struct App<P>
where
    P: Platform + Send + 'static,
    P::Handle: Send,
{
    runtime: Runtime,
    component: Arc<dyn Component>,
    lifecycle: Arc<LifecycleRegistry>,
    state: Arc<Mutex<MountState<P>>>,
    render_effect: Option<Effect>,
}

impl<P> App<P>
where
    P: Platform + Send + 'static,
    P::Handle: Send,
{
    /// Create the component instance. Runs its `setup` and the `Created`
    /// hook.
    pub fn new(runtime: &Runtime, platform: P, component: impl Component) -> Result<Self> {
        let mut lifecycle = LifecycleRegistry::new();
        component.setup(&mut lifecycle);
        lifecycle.call(Hook::Created)?;
        Ok(Self {
            runtime: runtime.clone(),
            component: Arc::new(component),
            lifecycle: Arc::new(lifecycle),
            state: Arc::new(Mutex::new(MountState {
                reconciler: Reconciler::new(platform),
                tree: None,
                container: None,
            })),
            render_effect: None,
        })
    }

    /// Render the component into `container`.
    ///
    /// Brackets the initial subtree construction with `BeforeMount` and
    /// `Mounted`, and installs the render effect that keeps the tree
    /// synchronized from then on.
    pub fn mount(&mut self, container: P::Handle) -> Result<()> {
        if self.render_effect.is_some() {
            return Err(Error::render("component is already mounted"));
        }
        debug!("mount component");
        self.lifecycle.call(Hook::BeforeMount)?;
        self.state.lock().container = Some(container);

        let component = Arc::clone(&self.component);
        let lifecycle = Arc::clone(&self.lifecycle);
        let state = Arc::clone(&self.state);
        let effect = Effect::new(&self.runtime, move || {
            match render_pass(&component, &lifecycle, &state) {
                Ok(()) => Ok(()),
                Err(error) if lifecycle.has_error_hooks() => {
                    lifecycle.call_error(&error);
                    Ok(())
                }
                Err(error) => Err(error),
            }
        })?;
        self.render_effect = Some(effect);

        self.lifecycle.call(Hook::Mounted)?;
        Ok(())
    }

    /// Tear the component down.
    ///
    /// Disposes the render effect synchronously (no state change can re-run
    /// it afterwards), detaches the tree, and clears the node mappings.
    pub fn unmount(&mut self) -> Result<()> {
        let effect = self
            .render_effect
            .take()
            .ok_or_else(|| Error::render("component is not mounted"))?;
        debug!("unmount component");
        self.lifecycle.call(Hook::BeforeUnmount)?;
        effect.dispose();
        {
            let mut state = self.state.lock();
            let MountState {
                reconciler,
                tree,
                container,
            } = &mut *state;
            if let (Some(tree_ref), Some(container_ref)) = (tree.as_ref(), container.as_ref()) {
                reconciler.unmount(tree_ref, container_ref)?;
            }
            *tree = None;
            *container = None;
        }
        self.lifecycle.call(Hook::Unmounted)?;
        Ok(())
    }

    /// Whether the component currently has a mounted tree.
    pub fn is_mounted(&self) -> bool {
        self.render_effect.is_some()
    }

    /// Inspect the platform backing this app.
    pub fn with_platform<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(self.state.lock().reconciler.platform())
    }

    /// Inspect the reconciler backing this app.
    pub fn with_reconciler<R>(&self, f: impl FnOnce(&Reconciler<P>) -> R) -> R {
        f(&self.state.lock().reconciler)
    }
}

/// One run of the render effect: render under tracking, then mount or patch.
fn render_pass<P>(
    component: &Arc<dyn Component>,
    lifecycle: &LifecycleRegistry,
    state: &Mutex<MountState<P>>,
) -> Result<()>
where
    P: Platform + Send + 'static,
    P::Handle: Send,
{
    // Reads performed here subscribe the render effect to the state they hit.
    let new_tree = component.render()?;

    let mut state = state.lock();
    let MountState {
        reconciler,
        tree,
        container,
    } = &mut *state;
    let container = container
        .as_ref()
        .ok_or_else(|| Error::render("render effect ran without a container"))?;

    match tree.as_ref() {
        None => reconciler.mount(&new_tree, container)?,
        Some(old_tree) => {
            lifecycle.call(Hook::BeforeUpdate)?;
            reconciler.patch(old_tree, &new_tree, container)?;
            lifecycle.call(Hook::Updated)?;
        }
    }
    *tree = Some(new_tree);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use crate::vdom::MemoryPlatform;

    struct Greeting {
        name: Signal<String>,
    }

    impl Component for Greeting {
        fn render(&self) -> Result<VNode> {
            Ok(VNode::element("p")
                .child(VNode::text(format!("hello {}", self.name.get())))
                .build())
        }
    }

    #[test]
    fn mount_renders_and_updates_follow_state() {
        let runtime = Runtime::new();
        let platform = MemoryPlatform::new();
        let container = platform.create_container();
        let name = Signal::new(&runtime, String::from("ada"));

        let mut app = App::new(&runtime, platform.clone(), Greeting { name: name.clone() })
            .unwrap();
        app.mount(container).unwrap();
        assert_eq!(platform.html(container), "<p>hello ada</p>");

        name.set(String::from("grace")).unwrap();
        assert_eq!(platform.html(container), "<p>hello grace</p>");
    }

    #[test]
    fn unmounted_component_ignores_state() {
        let runtime = Runtime::new();
        let platform = MemoryPlatform::new();
        let container = platform.create_container();
        let name = Signal::new(&runtime, String::from("ada"));

        let mut app = App::new(&runtime, platform.clone(), Greeting { name: name.clone() })
            .unwrap();
        app.mount(container).unwrap();
        app.unmount().unwrap();

        assert!(!app.is_mounted());
        assert_eq!(platform.html(container), "");
        assert_eq!(app.with_reconciler(Reconciler::mounted_count), 0);

        name.set(String::from("grace")).unwrap();
        assert_eq!(platform.html(container), "");
    }

    #[test]
    fn double_mount_and_double_unmount_are_errors() {
        let runtime = Runtime::new();
        let platform = MemoryPlatform::new();
        let container = platform.create_container();
        let name = Signal::new(&runtime, String::from("ada"));

        let mut app = App::new(&runtime, platform, Greeting { name }).unwrap();
        app.mount(container).unwrap();
        assert!(app.mount(container).is_err());

        app.unmount().unwrap();
        assert!(app.unmount().is_err());
    }
}
