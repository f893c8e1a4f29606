//! Hierarchy nodes for role and resource graphs
//!
//! A node is a named vertex with ordered child edges. Roles and resources use
//! the same structure but are distinct types, so a role can never be passed
//! where a resource is expected:
//!
//! - [`Role`] is `Node<RoleKind>`
//! - [`Resource`] is `Node<ResourceKind>`
//!
//! Nodes are shared handles. Cloning a node clones the handle, not the
//! vertex, and edges added through any clone are visible through all of them.
//! Graphs must stay acyclic; [`Node::add_child`] rejects edges that would
//! close a cycle. The check and the insert are separate steps, so edits to
//! one graph must be serialized by the caller (queries may run concurrently).

use crate::distance;
use crate::error::{AclError, Result};
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker trait separating the two node hierarchies
pub trait NodeKind: Send + Sync + 'static {
    /// Human-readable label used in logs and debug output
    const LABEL: &'static str;
}

/// Marker for subject (role) nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleKind;

/// Marker for object (resource) nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceKind;

impl NodeKind for RoleKind {
    const LABEL: &'static str = "role";
}

impl NodeKind for ResourceKind {
    const LABEL: &'static str = "resource";
}

/// A subject in the role hierarchy
pub type Role = Node<RoleKind>;

/// An object in the resource hierarchy
pub type Resource = Node<ResourceKind>;

struct NodeInner<K: NodeKind> {
    name: String,
    children: RwLock<Vec<Node<K>>>,
    _kind: PhantomData<fn() -> K>,
}

/// Named vertex in a role or resource graph
///
/// # Examples
///
/// ```
/// use hieracl_rs::Role;
///
/// let admin = Role::new("Admin");
/// let moderator = Role::new("Moderator");
/// admin.add_child(&moderator).unwrap();
///
/// assert!(admin.is_ancestor_of(&moderator));
/// assert!(!moderator.is_ancestor_of(&admin));
///
/// // Closing the loop is rejected
/// assert!(moderator.add_child(&admin).is_err());
/// ```
pub struct Node<K: NodeKind> {
    inner: Arc<NodeInner<K>>,
}

impl<K: NodeKind> Node<K> {
    /// Create a node with no children
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            inner: Arc::new(NodeInner {
                name: name.into(),
                children: RwLock::new(Vec::new()),
                _kind: PhantomData,
            }),
        }
    }

    /// Node name (registry key within its kind)
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Snapshot of the direct children, in insertion order
    pub fn children(&self) -> Vec<Node<K>> {
        self.inner.children.read().clone()
    }

    /// Check whether `child` is a direct child of this node (by identity)
    pub fn has_child(&self, child: &Node<K>) -> bool {
        self.inner.children.read().iter().any(|c| c.ptr_eq(child))
    }

    /// Add a directed edge from this node to `child`
    ///
    /// Adding an edge that already exists is a no-op. Two `add_child` calls
    /// racing on the same graph can each pass the cycle check, so callers
    /// sharing a graph across threads must hold an exclusive lock while
    /// editing it.
    ///
    /// # Errors
    ///
    /// Returns `CycleDetected` if `child` is this node or one of its ancestors.
    pub fn add_child(&self, child: &Node<K>) -> Result<()> {
        if self.has_child(child) {
            return Ok(());
        }

        if self.ptr_eq(child) || distance::distance(child, self, usize::MAX).is_some() {
            warn!(
                kind = K::LABEL,
                parent = %self.name(),
                child = %child.name(),
                "Rejecting edge that would create a cycle"
            );
            return Err(AclError::CycleDetected {
                parent: self.name().to_string(),
                child: child.name().to_string(),
            });
        }

        debug!(
            kind = K::LABEL,
            parent = %self.name(),
            child = %child.name(),
            "Adding child edge"
        );
        self.inner.children.write().push(child.clone());
        Ok(())
    }

    /// Remove the direct child with the given name
    ///
    /// Returns `true` if an edge was removed.
    pub fn remove_child(&self, name: &str) -> bool {
        let mut children = self.inner.children.write();
        let before = children.len();
        children.retain(|c| c.name() != name);
        before != children.len()
    }

    /// Check whether `other` is a strict descendant of this node
    pub fn is_ancestor_of(&self, other: &Node<K>) -> bool {
        !self.ptr_eq(other) && distance::distance(self, other, usize::MAX).is_some()
    }

    /// Identity comparison: `true` only for handles to the same vertex
    pub fn ptr_eq(&self, other: &Node<K>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity key for visited sets
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn read_children(&self) -> RwLockReadGuard<'_, Vec<Node<K>>> {
        self.inner.children.read()
    }
}

impl<K: NodeKind> Drop for NodeInner<K> {
    // Iterative: dropping a chain must not recurse once per level
    fn drop(&mut self) {
        let mut pending = std::mem::take(self.children.get_mut());
        while let Some(child) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(child.inner) {
                pending.append(inner.children.get_mut());
            }
        }
    }
}

impl<K: NodeKind> Clone for Node<K> {
    fn clone(&self) -> Self {
        Node {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: NodeKind> fmt::Debug for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<String> = self
            .read_children()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        f.debug_struct("Node")
            .field("kind", &K::LABEL)
            .field("name", &self.inner.name)
            .field("children", &children)
            .finish()
    }
}

impl<K: NodeKind> fmt::Display for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}
