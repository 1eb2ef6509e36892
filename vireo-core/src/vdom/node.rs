//! Virtual Nodes
//!
//! A [`VNode`] describes one unit of a rendered tree: either an element with
//! a tag, ordered attributes, an optional diff key, and children, or a plain
//! text node. Nodes are immutable once built; every render pass constructs a
//! fresh tree and the reconciler compares old against new.
//!
//! Each constructed node carries a unique [`NodeId`]. The reconciler keys its
//! node-to-platform-element mapping on it, which is what lets two structurally
//! identical trees from different render passes be told apart.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

/// Unique identity of one constructed virtual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// An element node: tag, ordered attributes, optional key, children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    id: NodeId,
    pub tag: String,
    /// Identity key used for diff matching among siblings. Keys must be
    /// unique among the children of one parent; the diff's behavior under
    /// duplicate keys is unspecified.
    pub key: Option<String>,
    /// Attributes in insertion order.
    pub attrs: IndexMap<String, String>,
    pub children: Vec<VNode>,
}

/// A text node.
#[derive(Debug, Clone)]
pub struct TextNode {
    id: NodeId,
    pub content: String,
}

/// An immutable description of one element or text unit in a rendered tree.
#[derive(Debug, Clone)]
pub enum VNode {
    Element(ElementNode),
    Text(TextNode),
}

impl VNode {
    /// Start building an element node.
    ///
    /// ```rust,ignore
    /// let item = VNode::element("li")
    ///     .key("42")
    ///     .attr("class", "item")
    ///     .child(VNode::text("hello"))
    ///     .build();
    /// ```
    pub fn element(tag: impl Into<String>) -> ElementBuilder {
        ElementBuilder {
            tag: tag.into(),
            key: None,
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Build a text node.
    pub fn text(content: impl Into<String>) -> VNode {
        VNode::Text(TextNode {
            id: NodeId::new(),
            content: content.into(),
        })
    }

    /// This node's unique identity.
    pub fn id(&self) -> NodeId {
        match self {
            VNode::Element(e) => e.id,
            VNode::Text(t) => t.id,
        }
    }

    /// The element tag, if this is an element node.
    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element(e) => Some(&e.tag),
            VNode::Text(_) => None,
        }
    }

    /// The diff key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element(e) => e.key.as_deref(),
            VNode::Text(_) => None,
        }
    }

    /// Whether this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, VNode::Text(_))
    }

    /// Total number of nodes in this subtree, root included.
    pub fn subtree_len(&self) -> usize {
        match self {
            VNode::Text(_) => 1,
            VNode::Element(e) => 1 + e.children.iter().map(VNode::subtree_len).sum::<usize>(),
        }
    }
}

/// Builder for element nodes.
#[derive(Debug)]
pub struct ElementBuilder {
    tag: String,
    key: Option<String>,
    attrs: IndexMap<String, String>,
    children: Vec<VNode>,
}

impl ElementBuilder {
    /// Set the identity key used for diff matching.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set an attribute. Later writes to the same name win; first-write
    /// order is preserved.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Append one child.
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append many children.
    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Finish the element.
    pub fn build(self) -> VNode {
        VNode::Element(ElementNode {
            id: NodeId::new(),
            tag: self.tag,
            key: self.key,
            attrs: self.attrs,
            children: self.children,
        })
    }
}
