//! In-Memory Platform
//!
//! A rendering backend that keeps the element tree in memory and records
//! every operation in an ordered, serializable mutation log. It serves two
//! purposes: headless rendering, and asserting in tests exactly which
//! operations a mount or patch performed, including that an operation did
//! *not* happen.
//!
//! Structural operations follow DOM semantics: inserting or appending a node
//! that already has a parent detaches it from that parent first, so a keyed
//! move is a single `insert_before`. `remove_child` goes further than the
//! DOM and reclaims the removed subtree from the node store; the reconciler
//! never reattaches a removed element, and without reclamation a long-lived
//! document would grow with every patch.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::platform::{Platform, PlatformError};

/// Opaque reference to one in-memory element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryHandle(u64);

impl MemoryHandle {
    /// Get the raw handle value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One recorded platform operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    CreateElement {
        handle: MemoryHandle,
        tag: String,
    },
    CreateText {
        handle: MemoryHandle,
        content: String,
    },
    SetAttribute {
        element: MemoryHandle,
        name: String,
        value: String,
    },
    RemoveAttribute {
        element: MemoryHandle,
        name: String,
    },
    AppendChild {
        parent: MemoryHandle,
        child: MemoryHandle,
    },
    InsertBefore {
        parent: MemoryHandle,
        child: MemoryHandle,
        reference: MemoryHandle,
    },
    RemoveChild {
        parent: MemoryHandle,
        child: MemoryHandle,
    },
}

impl Mutation {
    /// Whether this operation created a new element or text primitive.
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            Mutation::CreateElement { .. } | Mutation::CreateText { .. }
        )
    }

    /// Whether this operation detached a child from its parent.
    pub fn is_removal(&self) -> bool {
        matches!(self, Mutation::RemoveChild { .. })
    }
}

#[derive(Debug)]
enum MemoryNodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        children: Vec<MemoryHandle>,
    },
    Text(String),
}

#[derive(Debug)]
struct MemoryNode {
    parent: Option<MemoryHandle>,
    kind: MemoryNodeKind,
}

#[derive(Debug, Default)]
struct MemoryDoc {
    next_handle: u64,
    nodes: HashMap<MemoryHandle, MemoryNode>,
    log: Vec<Mutation>,
}

impl MemoryDoc {
    fn allocate(&mut self, kind: MemoryNodeKind) -> MemoryHandle {
        let handle = MemoryHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(handle, MemoryNode { parent: None, kind });
        handle
    }

    fn node(&self, handle: MemoryHandle, op: &'static str) -> Result<&MemoryNode, PlatformError> {
        self.nodes
            .get(&handle)
            .ok_or_else(|| PlatformError::new(op, format!("unknown handle {handle:?}")))
    }

    fn element_children_mut(
        &mut self,
        handle: MemoryHandle,
        op: &'static str,
    ) -> Result<&mut Vec<MemoryHandle>, PlatformError> {
        match self.nodes.get_mut(&handle) {
            Some(MemoryNode {
                kind: MemoryNodeKind::Element { children, .. },
                ..
            }) => Ok(children),
            Some(_) => Err(PlatformError::new(
                op,
                format!("{handle:?} is a text node and cannot hold children"),
            )),
            None => Err(PlatformError::new(op, format!("unknown handle {handle:?}"))),
        }
    }

    /// Detach `child` from its current parent, if it has one.
    fn detach(&mut self, child: MemoryHandle, op: &'static str) -> Result<(), PlatformError> {
        let previous = self.node(child, op)?.parent;
        if let Some(parent) = previous {
            let children = self.element_children_mut(parent, op)?;
            children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        Ok(())
    }

    fn render(&self, handle: MemoryHandle, out: &mut String) {
        let Some(node) = self.nodes.get(&handle) else {
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text(content) => out.push_str(content),
            MemoryNodeKind::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    self.render(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// In-memory rendering backend with a mutation log.
///
/// Cloning shares the document, so a test can keep a clone for inspection
/// while the reconciler owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    doc: Arc<Mutex<MemoryDoc>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached container element to mount into.
    ///
    /// Container creation is bookkeeping, not part of any patch, so it is
    /// not logged.
    pub fn create_container(&self) -> MemoryHandle {
        self.doc.lock().allocate(MemoryNodeKind::Element {
            tag: String::from("#container"),
            attrs: IndexMap::new(),
            children: Vec::new(),
        })
    }

    /// All operations recorded so far, in order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.doc.lock().log.clone()
    }

    /// Forget the recorded operations. The document itself is untouched.
    pub fn clear_mutations(&self) {
        self.doc.lock().log.clear();
    }

    /// Whether the document knows this handle.
    pub fn contains(&self, handle: MemoryHandle) -> bool {
        self.doc.lock().nodes.contains_key(&handle)
    }

    /// The child handles of an element, in order.
    pub fn children_of(&self, handle: MemoryHandle) -> Vec<MemoryHandle> {
        let doc = self.doc.lock();
        match doc.nodes.get(&handle) {
            Some(MemoryNode {
                kind: MemoryNodeKind::Element { children, .. },
                ..
            }) => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Render the subtree under `handle` as an HTML-like string.
    ///
    /// Containers render only their children.
    pub fn html(&self, handle: MemoryHandle) -> String {
        let doc = self.doc.lock();
        let mut out = String::new();
        match doc.nodes.get(&handle) {
            Some(MemoryNode {
                kind: MemoryNodeKind::Element { tag, children, .. },
                ..
            }) if tag == "#container" => {
                for child in children.clone() {
                    doc.render(child, &mut out);
                }
            }
            Some(_) => doc.render(handle, &mut out),
            None => {}
        }
        out
    }
}

impl Platform for MemoryPlatform {
    type Handle = MemoryHandle;

    fn create_element(&mut self, tag: &str) -> Result<MemoryHandle, PlatformError> {
        let mut doc = self.doc.lock();
        let handle = doc.allocate(MemoryNodeKind::Element {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        });
        doc.log.push(Mutation::CreateElement {
            handle,
            tag: tag.to_owned(),
        });
        Ok(handle)
    }

    fn create_text(&mut self, content: &str) -> Result<MemoryHandle, PlatformError> {
        let mut doc = self.doc.lock();
        let handle = doc.allocate(MemoryNodeKind::Text(content.to_owned()));
        doc.log.push(Mutation::CreateText {
            handle,
            content: content.to_owned(),
        });
        Ok(handle)
    }

    fn set_attribute(
        &mut self,
        element: &MemoryHandle,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        let mut doc = self.doc.lock();
        match doc.nodes.get_mut(element) {
            Some(MemoryNode {
                kind: MemoryNodeKind::Element { attrs, .. },
                ..
            }) => {
                attrs.insert(name.to_owned(), value.to_owned());
            }
            Some(_) => {
                return Err(PlatformError::new(
                    "set_attribute",
                    format!("{element:?} is a text node"),
                ))
            }
            None => {
                return Err(PlatformError::new(
                    "set_attribute",
                    format!("unknown handle {element:?}"),
                ))
            }
        }
        doc.log.push(Mutation::SetAttribute {
            element: *element,
            name: name.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn remove_attribute(
        &mut self,
        element: &MemoryHandle,
        name: &str,
    ) -> Result<(), PlatformError> {
        let mut doc = self.doc.lock();
        match doc.nodes.get_mut(element) {
            Some(MemoryNode {
                kind: MemoryNodeKind::Element { attrs, .. },
                ..
            }) => {
                attrs.shift_remove(name);
            }
            _ => {
                return Err(PlatformError::new(
                    "remove_attribute",
                    format!("{element:?} is not an element"),
                ))
            }
        }
        doc.log.push(Mutation::RemoveAttribute {
            element: *element,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn append_child(
        &mut self,
        parent: &MemoryHandle,
        child: &MemoryHandle,
    ) -> Result<(), PlatformError> {
        let mut doc = self.doc.lock();
        doc.node(*child, "append_child")?;
        doc.detach(*child, "append_child")?;
        doc.element_children_mut(*parent, "append_child")?.push(*child);
        if let Some(node) = doc.nodes.get_mut(child) {
            node.parent = Some(*parent);
        }
        doc.log.push(Mutation::AppendChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: &MemoryHandle,
        new_child: &MemoryHandle,
        reference: &MemoryHandle,
    ) -> Result<(), PlatformError> {
        let mut doc = self.doc.lock();
        doc.node(*new_child, "insert_before")?;
        doc.detach(*new_child, "insert_before")?;
        let children = doc.element_children_mut(*parent, "insert_before")?;
        let index = children
            .iter()
            .position(|c| c == reference)
            .ok_or_else(|| {
                PlatformError::new(
                    "insert_before",
                    format!("reference {reference:?} is not a child of {parent:?}"),
                )
            })?;
        children.insert(index, *new_child);
        if let Some(node) = doc.nodes.get_mut(new_child) {
            node.parent = Some(*parent);
        }
        doc.log.push(Mutation::InsertBefore {
            parent: *parent,
            child: *new_child,
            reference: *reference,
        });
        Ok(())
    }

    fn remove_child(
        &mut self,
        parent: &MemoryHandle,
        child: &MemoryHandle,
    ) -> Result<(), PlatformError> {
        let mut doc = self.doc.lock();
        let children = doc.element_children_mut(*parent, "remove_child")?;
        let index = children.iter().position(|c| c == child).ok_or_else(|| {
            PlatformError::new(
                "remove_child",
                format!("{child:?} is not a child of {parent:?}"),
            )
        })?;
        children.remove(index);
        // Removal is permanent in this backend: the reconciler never
        // reattaches a removed element, so the whole subtree is reclaimed
        // from the node store. Moves go through insert_before/append_child,
        // which detach without removing.
        let mut pending = vec![*child];
        while let Some(handle) = pending.pop() {
            if let Some(node) = doc.nodes.remove(&handle) {
                if let MemoryNodeKind::Element { children, .. } = node.kind {
                    pending.extend(children);
                }
            }
        }
        doc.log.push(Mutation::RemoveChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }
}
