//! Reconciler
//!
//! Turns the difference between two virtual trees into the minimal set of
//! platform operations: mount builds a subtree depth-first, patch reuses
//! matching elements and diffs attributes and children, unmount detaches and
//! forgets a subtree.
//!
//! # Identity
//!
//! Two element nodes are the same logical element iff their tag and key
//! match; text nodes match iff their content matches (the platform seam has
//! no text-update operation, so changed text is a replacement). A node that
//! is not the same is replaced wholesale: build new, insert before old,
//! remove old.
//!
//! # Child reconciliation
//!
//! Children are walked from both ends with `(old_start, old_end)` and
//! `(new_start, new_end)` cursors. Matching head or tail pairs patch in
//! place. An interior mismatch falls back to a keyed lookup: the matching
//! old child is located anywhere in the remaining old range, its platform
//! element is moved before the current head anchor, patched, and its old
//! slot marked consumed; a new child with no match anywhere is freshly built
//! and inserted at the anchor. After the walk, leftover new children are
//! mounted and leftover old children are removed.
//!
//! Keys must be unique among the old children of one parent. With duplicate
//! keys the lookup may pair the wrong elements; this is a precondition
//! violation and the result is unspecified.
//!
//! # Mapping
//!
//! The reconciler exclusively owns a bidirectional node-to-handle mapping.
//! Every node of a mounted subtree has an entry; entries are deleted the
//! moment the corresponding node is replaced, removed, or superseded by the
//! new tree of a patch. At any point the mapping contains exactly the
//! currently mounted nodes.

use std::collections::HashMap;

use smallvec::SmallVec;
use tracing::debug;

use crate::error::{Error, Result};

use super::node::{NodeId, VNode};
use super::platform::Platform;

/// Two nodes describe the same logical element.
fn same_node(a: &VNode, b: &VNode) -> bool {
    match (a, b) {
        (VNode::Element(x), VNode::Element(y)) => x.tag == y.tag && x.key == y.key,
        (VNode::Text(x), VNode::Text(y)) => x.content == y.content,
        _ => false,
    }
}

/// Walks old/new tree pairs and drives a [`Platform`].
pub struct Reconciler<P: Platform> {
    platform: P,
    node_to_handle: HashMap<NodeId, P::Handle>,
    handle_to_node: HashMap<P::Handle, NodeId>,
}

impl<P: Platform> Reconciler<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            node_to_handle: HashMap::new(),
            handle_to_node: HashMap::new(),
        }
    }

    /// The backend this reconciler drives.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// The platform element a mounted node rendered to.
    pub fn handle_of(&self, node: &VNode) -> Option<&P::Handle> {
        self.node_to_handle.get(&node.id())
    }

    /// The mounted node a platform element belongs to.
    pub fn node_of(&self, handle: &P::Handle) -> Option<NodeId> {
        self.handle_to_node.get(handle).copied()
    }

    /// Whether the node currently has a live mapping entry.
    pub fn is_mounted(&self, node: &VNode) -> bool {
        self.node_to_handle.contains_key(&node.id())
    }

    /// Number of mapping entries; equals the number of mounted nodes.
    pub fn mounted_count(&self) -> usize {
        self.node_to_handle.len()
    }

    /// Build a platform tree for `node` and attach it to `container`.
    pub fn mount(&mut self, node: &VNode, container: &P::Handle) -> Result<()> {
        debug!(node = ?node.id(), nodes = node.subtree_len(), "mount");
        let element = self.build_subtree(node)?;
        self.platform.append_child(container, &element)?;
        Ok(())
    }

    /// Reconcile an already-mounted `old` tree against `new`.
    ///
    /// `container` is the platform element holding `old`'s root. Calling
    /// this with a node that was never mounted (or already unmounted) is a
    /// caller error and returns [`Error::StaleReference`].
    pub fn patch(&mut self, old: &VNode, new: &VNode, container: &P::Handle) -> Result<()> {
        let handle = self
            .node_to_handle
            .get(&old.id())
            .cloned()
            .ok_or(Error::StaleReference(old.id()))?;

        if !same_node(old, new) {
            debug!(old = ?old.id(), new = ?new.id(), "patch: replace");
            let replacement = self.build_subtree(new)?;
            self.platform.insert_before(container, &replacement, &handle)?;
            self.platform.remove_child(container, &handle)?;
            self.forget(old);
            return Ok(());
        }

        if let (VNode::Element(old_el), VNode::Element(new_el)) = (old, new) {
            self.patch_attributes(&handle, old_el, new_el)?;
            self.patch_children(&old_el.children, &new_el.children, &handle)?;
        }
        // Matching text nodes have equal content; nothing to do.

        // Hand the platform element over to the new tree's identity.
        self.node_to_handle.remove(&old.id());
        self.register(new.id(), handle);
        Ok(())
    }

    /// Detach a mounted subtree from `container` and forget its mapping.
    ///
    /// The platform seam has no parent-of query, so the caller passes the
    /// container it mounted into.
    pub fn unmount(&mut self, node: &VNode, container: &P::Handle) -> Result<()> {
        debug!(node = ?node.id(), "unmount");
        let handle = self
            .node_to_handle
            .get(&node.id())
            .cloned()
            .ok_or(Error::StaleReference(node.id()))?;
        self.platform.remove_child(container, &handle)?;
        self.forget(node);
        Ok(())
    }

    /// Depth-first construction of a platform subtree, registering the
    /// mapping for every node built.
    fn build_subtree(&mut self, node: &VNode) -> Result<P::Handle> {
        let handle = match node {
            VNode::Text(text) => self.platform.create_text(&text.content)?,
            VNode::Element(element) => {
                let handle = self.platform.create_element(&element.tag)?;
                for (name, value) in &element.attrs {
                    self.platform.set_attribute(&handle, name, value)?;
                }
                for child in &element.children {
                    let child_handle = self.build_subtree(child)?;
                    self.platform.append_child(&handle, &child_handle)?;
                }
                handle
            }
        };
        self.register(node.id(), handle.clone());
        Ok(handle)
    }

    fn register(&mut self, id: NodeId, handle: P::Handle) {
        self.handle_to_node.insert(handle.clone(), id);
        self.node_to_handle.insert(id, handle);
    }

    /// Delete both mapping directions for a subtree.
    fn forget(&mut self, node: &VNode) {
        if let Some(handle) = self.node_to_handle.remove(&node.id()) {
            self.handle_to_node.remove(&handle);
        }
        if let VNode::Element(element) = node {
            for child in &element.children {
                self.forget(child);
            }
        }
    }

    /// Remove attributes absent from the new node, apply new or changed
    /// ones, and leave unchanged attributes untouched.
    fn patch_attributes(
        &mut self,
        element: &P::Handle,
        old: &super::node::ElementNode,
        new: &super::node::ElementNode,
    ) -> Result<()> {
        for name in old.attrs.keys() {
            if !new.attrs.contains_key(name) {
                self.platform.remove_attribute(element, name)?;
            }
        }
        for (name, value) in &new.attrs {
            if old.attrs.get(name) != Some(value) {
                self.platform.set_attribute(element, name, value)?;
            }
        }
        Ok(())
    }

    /// Two-ended child walk with a keyed-move fallback for interior
    /// mismatches.
    fn patch_children(
        &mut self,
        old: &[VNode],
        new: &[VNode],
        container: &P::Handle,
    ) -> Result<()> {
        let mut old_start: usize = 0;
        let mut new_start: usize = 0;
        let mut old_end: isize = old.len() as isize - 1;
        let mut new_end: isize = new.len() as isize - 1;

        // Old slots claimed by a keyed move, skipped by the cursors.
        let mut consumed: SmallVec<[bool; 16]> = SmallVec::new();
        consumed.resize(old.len(), false);

        while old_start as isize <= old_end && new_start as isize <= new_end {
            if consumed[old_start] {
                old_start += 1;
                continue;
            }
            if consumed[old_end as usize] {
                old_end -= 1;
                continue;
            }

            let old_head = &old[old_start];
            let old_tail = &old[old_end as usize];
            let new_head = &new[new_start];
            let new_tail = &new[new_end as usize];

            if same_node(old_head, new_head) {
                self.patch(old_head, new_head, container)?;
                old_start += 1;
                new_start += 1;
            } else if same_node(old_tail, new_tail) {
                self.patch(old_tail, new_tail, container)?;
                old_end -= 1;
                new_end -= 1;
            } else {
                // Interior mismatch: find the new head anywhere in the
                // remaining old range and move its element here, or build
                // it fresh.
                let anchor = self
                    .node_to_handle
                    .get(&old_head.id())
                    .cloned()
                    .ok_or(Error::StaleReference(old_head.id()))?;
                let matched = (old_start..=old_end as usize)
                    .find(|&i| !consumed[i] && same_node(&old[i], new_head));
                match matched {
                    Some(index) => {
                        let moved = self
                            .node_to_handle
                            .get(&old[index].id())
                            .cloned()
                            .ok_or(Error::StaleReference(old[index].id()))?;
                        self.platform.insert_before(container, &moved, &anchor)?;
                        self.patch(&old[index], new_head, container)?;
                        consumed[index] = true;
                    }
                    None => {
                        let built = self.build_subtree(new_head)?;
                        self.platform.insert_before(container, &built, &anchor)?;
                    }
                }
                new_start += 1;
            }
        }

        // Mount whatever the new range still holds, before the element that
        // follows the range (already in place), or at the end.
        while new_start as isize <= new_end {
            let reference = new
                .get(new_end as usize + 1)
                .and_then(|after| self.node_to_handle.get(&after.id()).cloned());
            let built = self.build_subtree(&new[new_start])?;
            match &reference {
                Some(reference) => self.platform.insert_before(container, &built, reference)?,
                None => self.platform.append_child(container, &built)?,
            }
            new_start += 1;
        }

        // Unmount whatever the old range still holds.
        while old_start as isize <= old_end {
            if consumed[old_start] {
                old_start += 1;
                continue;
            }
            let node = &old[old_start];
            let handle = self
                .node_to_handle
                .get(&node.id())
                .cloned()
                .ok_or(Error::StaleReference(node.id()))?;
            self.platform.remove_child(container, &handle)?;
            self.forget(node);
            old_start += 1;
        }

        Ok(())
    }
}

impl<P: Platform> std::fmt::Debug for Reconciler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("mounted_count", &self.mounted_count())
            .finish()
    }
}
