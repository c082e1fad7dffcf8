//! Host binding layer - the mutation surface the engine needs from a
//! retained host tree.
//!
//! The engine never owns the rendered tree; it drives an implementation of
//! [`HostTree`] through a handful of primitives: create a node, set or clear
//! a property, add or remove a listener, insert or remove a child. A binding
//! may accept unknown properties permissively (the reference host does) or
//! reject them; rejections are recoverable - the commit engine logs them and
//! keeps going.

use std::fmt;

use thiserror::Error;

use crate::types::{Handler, Value};

pub mod memory;
pub mod props;

pub use memory::{MemoryHost, MemoryNode, MemoryNodeId, Mutation};

// =============================================================================
// Errors
// =============================================================================

/// Failure surfaced by a host binding.
#[derive(Debug, Error)]
pub enum HostError {
    /// The node handle does not name a live node.
    #[error("unknown host node {0}")]
    UnknownNode(String),

    /// The parent cannot hold children (e.g. a text node).
    #[error("host node {0} cannot contain children")]
    NotAContainer(String),

    /// The child is not attached to the given parent.
    #[error("host node {child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },
}

// =============================================================================
// Host Tree
// =============================================================================

/// Retained tree operated on by the engine.
///
/// Node handles are minted by the binding and treated as opaque by the
/// engine; a handle stays valid until the node is removed from the tree.
/// Structural calls (`append_child`, `remove_child`) happen only inside the
/// uninterruptible commit pass; node creation and initial property
/// assignment happen while the scheduler processes a placement, before the
/// node is attached anywhere.
pub trait HostTree {
    /// Opaque node identity minted by the binding.
    type Node: Copy + Eq + fmt::Debug;

    /// Create a detached node for `tag`.
    fn create_node(&mut self, tag: &str) -> Result<Self::Node, HostError>;

    /// Create a detached, empty text node.
    fn create_text(&mut self) -> Result<Self::Node, HostError>;

    /// Assign a property on `node`.
    fn set_property(&mut self, node: Self::Node, key: &str, value: &Value)
    -> Result<(), HostError>;

    /// Reset a property on `node` to its empty state.
    fn clear_property(&mut self, node: Self::Node, key: &str) -> Result<(), HostError>;

    /// Register a listener for the native event `event` on `node`,
    /// replacing any existing listener for the same event.
    fn add_listener(
        &mut self,
        node: Self::Node,
        event: &str,
        handler: Handler,
    ) -> Result<(), HostError>;

    /// Unregister the listener for `event` on `node`.
    fn remove_listener(&mut self, node: Self::Node, event: &str) -> Result<(), HostError>;

    /// Attach `child` as the last child of `parent`.
    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), HostError>;

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), HostError>;
}
