//! Arena-backed document tree
//!
//! Nodes live in a `Vec<Option<Node>>` indexed by `NodeId`. Deleting a node
//! leaves a tombstone and queues its ID for reuse; IDs are recycled oldest
//! first, before the arena grows.

use super::node::{Node, NodeId, ROOT};
use crate::error::TreeError;
use std::collections::VecDeque;
use tracing::debug;

/// Document tree: node arena, free list and live count
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    vacant: VecDeque<NodeId>,
    live: usize,
}

impl Tree {
    /// Create a tree holding a single root tag at `ROOT`
    pub fn new(root_name: impl Into<String>) -> Self {
        Tree {
            nodes: vec![Some(Node::new_tag(root_name, None))],
            vacant: VecDeque::new(),
            live: 1,
        }
    }

    /// ID of the document root
    #[inline]
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Number of live nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Always false: the root can never be deleted
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Check whether `id` refers to a live node
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize).and_then(Option::as_ref)
    }

    /// Get a mutable node by ID
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize).and_then(Option::as_mut)
    }

    /// Iterate over live nodes in ID order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (i as NodeId, node)))
    }

    /// Take the oldest vacated ID, or grow the arena
    fn allocate(&mut self, node: Node) -> NodeId {
        self.live += 1;
        match self.vacant.pop_front() {
            Some(id) => {
                self.nodes[id as usize] = Some(node);
                id
            }
            None => {
                let id = self.nodes.len() as NodeId;
                self.nodes.push(Some(node));
                id
            }
        }
    }

    /// Validate the parent, then allocate `node` and link it as the last child
    fn attach(&mut self, parent: NodeId, node: Node) -> Result<NodeId, TreeError> {
        match self.get_node(parent) {
            None => return Err(TreeError::MissingNode(parent)),
            Some(p) if p.is_text() => return Err(TreeError::TextParent(parent)),
            Some(_) => {}
        }
        let id = self.allocate(node);
        if let Some(p) = self.get_node_mut(parent) {
            p.push_child(id);
        }
        Ok(id)
    }

    /// Append a new tag node under `parent`
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId, TreeError> {
        self.attach(parent, Node::new_tag(name, Some(parent)))
    }

    /// Append a new text node under `parent`
    pub fn add_text_node(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId, TreeError> {
        self.attach(parent, Node::new_text(text, Some(parent)))
    }

    /// Set an attribute on a live node. Dropped silently on text nodes.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        let node = self.get_node_mut(id).ok_or(TreeError::MissingNode(id))?;
        node.set_attribute(name, value);
        Ok(())
    }

    /// Ancestor IDs from the immediate parent up to the root.
    /// Empty for the root and for missing nodes.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get_node(id).and_then(Node::parent);
        while let Some(parent) = current {
            out.push(parent);
            current = self.get_node(parent).and_then(Node::parent);
        }
        out
    }

    /// Nesting depth (root = 0)
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).len())
    }

    /// Re-parent the subtree rooted at `id` under `new_parent`.
    ///
    /// Returns false and leaves the tree unchanged if the move is refused.
    pub fn move_subtree(&mut self, id: NodeId, new_parent: NodeId) -> bool {
        match self.try_move_subtree(id, new_parent) {
            Ok(()) => true,
            Err(e) => {
                debug!(node = id, new_parent, "move refused: {}", e);
                false
            }
        }
    }

    /// Like [`Tree::move_subtree`], but reports why a move was refused
    pub fn try_move_subtree(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), TreeError> {
        let old_parent = self.get_node(id).ok_or(TreeError::MissingNode(id))?.parent();
        let target = self.get_node(new_parent).ok_or(TreeError::MissingNode(new_parent))?;

        if id == ROOT {
            return Err(TreeError::RootImmovable);
        }
        if id == new_parent || self.ancestors(new_parent).contains(&id) {
            return Err(TreeError::Cycle { node: id, new_parent });
        }
        if target.is_text() {
            return Err(TreeError::TextParent(new_parent));
        }

        if let Some(p) = old_parent.and_then(|p| self.get_node_mut(p)) {
            p.remove_child(id);
        }
        if let Some(p) = self.get_node_mut(new_parent) {
            p.push_child(id);
        }
        if let Some(node) = self.get_node_mut(id) {
            node.set_parent(Some(new_parent));
        }
        Ok(())
    }

    /// Detach the subtree rooted at `id` and tombstone every node in it.
    ///
    /// Vacated IDs join the free list in breadth-first order. Returns the
    /// number of nodes removed: 0 for a missing node or the root.
    pub fn delete_subtree(&mut self, id: NodeId) -> usize {
        if id == ROOT {
            debug!("delete refused: {}", TreeError::RootImmovable);
            return 0;
        }
        let parent = match self.get_node(id) {
            Some(node) => node.parent(),
            None => {
                debug!("delete refused: {}", TreeError::MissingNode(id));
                return 0;
            }
        };
        if let Some(p) = parent.and_then(|p| self.get_node_mut(p)) {
            p.remove_child(id);
        }

        let mut queue = VecDeque::from([id]);
        let mut removed = 0;
        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.get_mut(current as usize).and_then(Option::take) {
                queue.extend(node.children().iter().copied());
                self.vacant.push_back(current);
                self.live -= 1;
                removed += 1;
            }
        }
        removed
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let children = self.get_node(id).map(Node::children).unwrap_or(&[]);
        ChildIter {
            inner: children.iter(),
        }
    }

    /// Iterate over a node and its descendants (pre-order, depth-first)
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        DescendantIter { tree: self, stack }
    }

    /// Compare two trees by shape and content, ignoring ID assignment.
    ///
    /// Tag names, attribute order and values, child order and text payloads
    /// must all agree.
    pub fn structurally_eq(&self, other: &Tree) -> bool {
        let mut pending = vec![(ROOT, ROOT)];
        while let Some((a, b)) = pending.pop() {
            let (Some(left), Some(right)) = (self.get_node(a), other.get_node(b)) else {
                return false;
            };
            if left.kind() != right.kind()
                || left.name() != right.name()
                || left.text() != right.text()
                || !left.attributes().iter().eq(right.attributes().iter())
                || left.children().len() != right.children().len()
            {
                return false;
            }
            pending.extend(left.children().iter().copied().zip(right.children().iter().copied()));
        }
        true
    }
}

/// Iterator over child nodes
pub struct ChildIter<'t> {
    inner: std::slice::Iter<'t, NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().copied()
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Reverse order so the first child is visited first
        if let Some(node) = self.tree.get_node(current) {
            self.stack.extend(node.children().iter().rev().copied());
        }

        Some(current)
    }
}
