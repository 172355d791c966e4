//! DOM Module - Arena-based document tree
//!
//! Implements the mutable tree the parser builds and the serializer renders:
//! - Arena allocation for nodes, tombstones on delete
//! - NodeId (u32) indices, recycled oldest-first
//! - Cycle-checked subtree moves

pub mod node;
pub mod tree;

pub use node::{Attributes, Node, NodeId, NodeKind, ROOT};
pub use tree::{ChildIter, DescendantIter, Tree};
