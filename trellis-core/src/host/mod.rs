//! Host Adapter
//!
//! The reconciler never touches a concrete UI tree. Every mutation goes
//! through a [`HostAdapter`], which owns the real nodes (DOM elements,
//! terminal cells, test arena entries) and hands out opaque [`HostNode`]
//! handles.
//!
//! # Contract
//!
//! - `create_element` / `create_text` return unattached nodes.
//! - `patch_prop` with `next == None` removes the attribute or handler.
//! - `insert` with `anchor == None` appends at the end of the parent.
//!
//! The crate ships [`MemoryHost`], a headless arena implementation used by
//! the tests and benchmarks.

mod memory;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::HostError;
use crate::value::Value;

pub use memory::{HostOp, MemoryHost};

/// Opaque handle to a node owned by a host adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNode(u64);

impl HostNode {
    /// Allocate a new unique handle.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for HostNode {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for HostNode {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive tree operations the reconciler is built on.
pub trait HostAdapter: Send + Sync {
    /// Create a new, unattached element.
    fn create_element(&self, tag: &str) -> Result<HostNode, HostError>;

    /// Create a new, unattached text node.
    fn create_text(&self, text: &str) -> Result<HostNode, HostError>;

    /// Replace the text content of an element (dropping its children) or
    /// of a text node.
    fn set_text(&self, node: HostNode, text: &str) -> Result<(), HostError>;

    /// Apply a property change. `next == None` means removal.
    fn patch_prop(
        &self,
        node: HostNode,
        key: &str,
        prev: Option<&Value>,
        next: Option<&Value>,
    ) -> Result<(), HostError>;

    /// Insert `node` into `parent` before `anchor`, or at the end.
    fn insert(&self, node: HostNode, parent: HostNode, anchor: Option<HostNode>)
        -> Result<(), HostError>;

    /// Detach `node` from its parent.
    fn remove(&self, node: HostNode) -> Result<(), HostError>;

    /// The node following `node` under the same parent, if any.
    fn next_sibling(&self, node: HostNode) -> Result<Option<HostNode>, HostError>;

    /// Resolve a container selector.
    fn query_selector(&self, selector: &str) -> Option<HostNode>;
}
