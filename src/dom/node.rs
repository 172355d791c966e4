//! Node records stored in the tree arena
//!
//! Uses NodeId (u32) for compact node references.

use indexmap::IndexMap;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// ID of the document root, reserved for the lifetime of a tree
pub const ROOT: NodeId = 0;

/// Attribute mapping: unique keys, insertion order preserved
pub type Attributes = IndexMap<String, String>;

/// Type of node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Element with a name, attributes and children
    Tag,
    /// Literal text content
    Text,
}

/// A node in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    /// Tag name (tag nodes) or literal content (text nodes)
    value: String,
    attributes: Attributes,
    children: Vec<NodeId>,
}

impl Node {
    /// Create a new tag node
    pub(crate) fn new_tag(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Node {
            kind: NodeKind::Tag,
            parent,
            value: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Create a new text node
    pub(crate) fn new_text(content: impl Into<String>, parent: Option<NodeId>) -> Self {
        Node {
            kind: NodeKind::Text,
            parent,
            value: content.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn is_tag(&self) -> bool {
        self.kind == NodeKind::Tag
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    /// Tag name, or None for text nodes
    pub fn name(&self) -> Option<&str> {
        self.is_tag().then_some(self.value.as_str())
    }

    /// Text payload, or None for tag nodes
    pub fn text(&self) -> Option<&str> {
        self.is_text().then_some(self.value.as_str())
    }

    /// Replace the payload of a text node. Ignored on tag nodes.
    pub fn set_text(&mut self, content: impl Into<String>) {
        if self.is_text() {
            self.value = content.into();
        }
    }

    /// Parent node (None for the document root)
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child IDs in document order
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Set or overwrite an attribute. An existing key keeps its position.
    /// Text nodes never take attributes; the call is dropped.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.is_tag() {
            self.attributes.insert(name.into(), value.into());
        }
    }

    /// Replace all attributes. Dropped on text nodes.
    pub fn set_attributes(&mut self, attributes: Attributes) {
        if self.is_tag() {
            self.attributes = attributes;
        }
    }

    /// Remove an attribute, keeping the order of the rest
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Append a child ID. Returns false on text nodes.
    pub(crate) fn push_child(&mut self, child: NodeId) -> bool {
        if self.is_text() {
            return false;
        }
        self.children.push(child);
        true
    }

    pub(crate) fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&id| id != child);
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_node() {
        let node = Node::new_tag("item", Some(ROOT));
        assert_eq!(node.kind(), NodeKind::Tag);
        assert_eq!(node.name(), Some("item"));
        assert_eq!(node.text(), None);
        assert_eq!(node.parent(), Some(ROOT));
        assert!(!node.has_children());
    }

    #[test]
    fn test_text_node_drops_children_and_attributes() {
        let mut node = Node::new_text("hello", Some(ROOT));
        assert_eq!(node.text(), Some("hello"));
        assert_eq!(node.name(), None);

        node.set_attribute("k", "v");
        assert!(!node.has_attributes());
        assert!(!node.push_child(3));
        assert!(node.children().is_empty());

        node.set_text("bye");
        assert_eq!(node.text(), Some("bye"));
    }

    #[test]
    fn test_attribute_order_is_insertion_order() {
        let mut node = Node::new_tag("x", None);
        node.set_attribute("z", "1");
        node.set_attribute("a", "2");
        node.set_attribute("m", "3");
        node.set_attribute("z", "4");

        let keys: Vec<_> = node.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(node.attribute("z"), Some("4"));

        assert_eq!(node.remove_attribute("a"), Some("2".to_string()));
        let keys: Vec<_> = node.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "m"]);
    }

    #[test]
    fn test_set_text_ignored_on_tags() {
        let mut node = Node::new_tag("x", None);
        node.set_text("nope");
        assert_eq!(node.name(), Some("x"));
    }
}
