//! Ordered, name-deduplicated groups of nodes
//!
//! An aggregate lets a caller query with several roles (or resources) at
//! once. Member order matters: when two members match equally specific
//! rules, the member added first wins.

use crate::node::{Node, NodeKind, ResourceKind, RoleKind};
use std::fmt;

/// Ordered group of nodes of one kind
///
/// # Examples
///
/// ```
/// use hieracl_rs::{Role, RoleAggregate};
///
/// let mut group = RoleAggregate::new();
/// group.add_member(Role::new("User"));
/// group.add_member(Role::new("Moderator"));
/// group.add_member(Role::new("User")); // already present, ignored
///
/// let names: Vec<_> = group.members().map(|(n, i)| (n.name().to_string(), i)).collect();
/// assert_eq!(names, vec![("User".to_string(), 0), ("Moderator".to_string(), 1)]);
///
/// // Re-adding after removal moves the member to the tail
/// group.remove_member("User");
/// group.add_member(Role::new("User"));
/// let (last, position) = group.members().last().unwrap();
/// assert_eq!((last.name(), position), ("User", 1));
/// ```
pub struct Aggregate<K: NodeKind> {
    members: Vec<Node<K>>,
}

/// Group of roles used as a single query subject
pub type RoleAggregate = Aggregate<RoleKind>;

/// Group of resources used as a single query object
pub type ResourceAggregate = Aggregate<ResourceKind>;

impl<K: NodeKind> Aggregate<K> {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Aggregate {
            members: Vec::new(),
        }
    }

    /// Append `node` unless a member with the same name is already present
    pub fn add_member(&mut self, node: Node<K>) {
        if self.contains(node.name()) {
            return;
        }
        self.members.push(node);
    }

    /// Remove the member with the given name
    ///
    /// Returns `true` if a member was removed.
    pub fn remove_member(&mut self, name: &str) -> bool {
        match self.members.iter().position(|m| m.name() == name) {
            Some(idx) => {
                self.members.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Members with their current 0-based positions
    pub fn members(&self) -> impl Iterator<Item = (Node<K>, usize)> + '_ {
        self.members
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.clone(), idx))
    }

    /// Look up a member by name
    pub fn get(&self, name: &str) -> Option<&Node<K>> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Check whether a member with the given name is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }
}

impl Aggregate<RoleKind> {
    /// Alias of [`add_member`](Aggregate::add_member)
    pub fn add_role(&mut self, role: Node<RoleKind>) {
        self.add_member(role);
    }

    /// Alias of [`remove_member`](Aggregate::remove_member)
    pub fn remove_role(&mut self, name: &str) -> bool {
        self.remove_member(name)
    }
}

impl Aggregate<ResourceKind> {
    /// Alias of [`add_member`](Aggregate::add_member)
    pub fn add_resource(&mut self, resource: Node<ResourceKind>) {
        self.add_member(resource);
    }

    /// Alias of [`remove_member`](Aggregate::remove_member)
    pub fn remove_resource(&mut self, name: &str) -> bool {
        self.remove_member(name)
    }
}

impl<K: NodeKind> Default for Aggregate<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKind> Clone for Aggregate<K> {
    fn clone(&self) -> Self {
        Aggregate {
            members: self.members.clone(),
        }
    }
}

impl<K: NodeKind> FromIterator<Node<K>> for Aggregate<K> {
    fn from_iter<I: IntoIterator<Item = Node<K>>>(iter: I) -> Self {
        let mut aggregate = Aggregate::new();
        for node in iter {
            aggregate.add_member(node);
        }
        aggregate
    }
}

impl<K: NodeKind> fmt::Debug for Aggregate<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("kind", &K::LABEL)
            .field("members", &self.names())
            .finish()
    }
}
