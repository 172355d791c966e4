//! ResourceArc Wrappers
//!
//! Persistent tree state shared with the BEAM across NIF calls.

use crate::dom::Tree;
use rustler::ResourceArc;
use std::sync::Mutex;

/// Wrapper for Tree that can be stored in a ResourceArc.
/// The mutex serializes access from concurrent BEAM processes.
pub struct TreeResource {
    pub tree: Mutex<Tree>,
}

impl TreeResource {
    pub fn new(tree: Tree) -> Self {
        TreeResource {
            tree: Mutex::new(tree),
        }
    }

    /// Run `f` with shared access to the tree.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if the tree mutex is poisoned.
    pub fn with_tree<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&Tree) -> R,
    {
        let guard = self.tree.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&guard))
    }

    /// Run `f` with exclusive access to the tree.
    pub fn with_tree_mut<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&mut Tree) -> R,
    {
        let mut guard = self.tree.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&mut guard))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for TreeResource {}

/// Type alias for the ResourceArc
pub type TreeRef = ResourceArc<TreeResource>;
