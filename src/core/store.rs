//! Rule storage and node registries
//!
//! The store keeps rule records in insertion order, each stamped with a
//! sequence number that is never reused. Alongside the records it keeps one
//! name registry per node kind; nodes are registered the first time they
//! appear in a rule, and queries by bare name resolve through these
//! registries.
//!
//! Two lookup modes are kept apart on purpose:
//! - queries resolve *names* through the registries
//! - rule removal filters records by node *identity*

use crate::node::{Node, NodeKind, Resource, ResourceKind, Role, RoleKind};
use crate::rule::{named_rule_factory, RuleArg, RuleFactory, RuleRef};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace};

/// Sequence number of a rule record
///
/// Larger ids were inserted later. Ids are never reused, even after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(u64);

impl RuleId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stored rule: (role, resource, action) bound to allow or deny
#[derive(Debug, Clone)]
pub struct RuleRecord {
    id: RuleId,
    role: Role,
    resource: Resource,
    action: String,
    allowed: bool,
    rule: RuleRef,
}

impl RuleRecord {
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Action name, taken from the payload at insertion time
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// The payload exactly as supplied (or built by the factory)
    pub fn rule(&self) -> &RuleRef {
        &self.rule
    }

    fn matches_filter(
        &self,
        role: Option<&Role>,
        resource: Option<&Resource>,
        action: &str,
        allowed: Option<bool>,
    ) -> bool {
        self.action == action
            && role.map_or(true, |r| r.ptr_eq(&self.role))
            && resource.map_or(true, |r| r.ptr_eq(&self.resource))
            && allowed.map_or(true, |a| a == self.allowed)
    }
}

/// Name-to-node map for one node kind
///
/// Keeps registration order so that lookups through descendants are
/// deterministic.
pub struct Registry<K: NodeKind> {
    nodes: Vec<Node<K>>,
    index: AHashMap<String, usize>,
}

impl<K: NodeKind> Registry<K> {
    pub fn new() -> Self {
        Registry {
            nodes: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Register `node` under its name unless that name is already taken
    ///
    /// The first node registered under a name keeps it.
    pub fn register(&mut self, node: &Node<K>) {
        if let Some(&idx) = self.index.get(node.name()) {
            if !self.nodes[idx].ptr_eq(node) {
                trace!(
                    kind = K::LABEL,
                    name = %node.name(),
                    "Name already registered to another node; keeping the first"
                );
            }
            return;
        }
        self.index.insert(node.name().to_string(), self.nodes.len());
        self.nodes.push(node.clone());
    }

    /// Registered node with exactly this name
    pub fn get(&self, name: &str) -> Option<&Node<K>> {
        self.index.get(name).map(|&idx| &self.nodes[idx])
    }

    /// Resolve a name to a node known to the engine
    ///
    /// A registered node wins. Otherwise the descendants of registered nodes
    /// are searched breadth-first, in registration order, so a child added
    /// under a registered parent is found by name too.
    pub fn find(&self, name: &str) -> Option<Node<K>> {
        if let Some(node) = self.get(name) {
            return Some(node.clone());
        }

        let mut visited: AHashSet<usize> = self.nodes.iter().map(Node::id).collect();
        let mut queue: VecDeque<Node<K>> = self.nodes.iter().cloned().collect();

        while let Some(node) = queue.pop_front() {
            for child in node.read_children().iter() {
                if child.name() == name {
                    return Some(child.clone());
                }
                if visited.insert(child.id()) {
                    queue.push_back(child.clone());
                }
            }
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registered nodes in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node<K>> {
        self.nodes.iter()
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }
}

impl<K: NodeKind> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKind> fmt::Debug for Registry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &K::LABEL)
            .field("names", &self.names())
            .finish()
    }
}

/// Append-only rule list plus node registries
pub struct RuleStore {
    records: Vec<RuleRecord>,
    next_id: u64,
    roles: Registry<RoleKind>,
    resources: Registry<ResourceKind>,
    factory: RuleFactory,
}

impl RuleStore {
    /// Create an empty store using the [`NamedRule`](crate::NamedRule) factory
    pub fn new() -> Self {
        Self::with_factory(named_rule_factory())
    }

    /// Create an empty store with a custom payload factory
    pub fn with_factory(factory: RuleFactory) -> Self {
        RuleStore {
            records: Vec::new(),
            next_id: 0,
            roles: Registry::new(),
            resources: Registry::new(),
            factory,
        }
    }

    /// Append a rule record and register its nodes
    ///
    /// Every call creates a new record, even for a triple that already has one.
    pub fn add(
        &mut self,
        role: &Role,
        resource: &Resource,
        rule: RuleArg,
        allowed: bool,
    ) -> RuleId {
        let rule = match rule {
            RuleArg::Name(name) => (self.factory)(&name),
            RuleArg::Rule(rule) => rule,
        };

        let id = RuleId(self.next_id);
        self.next_id += 1;

        debug!(
            id = %id,
            role = %role.name(),
            resource = %resource.name(),
            action = %rule.name(),
            allowed,
            "Adding rule"
        );

        self.roles.register(role);
        self.resources.register(resource);

        self.records.push(RuleRecord {
            id,
            role: role.clone(),
            resource: resource.clone(),
            action: rule.name().to_string(),
            allowed,
            rule,
        });

        id
    }

    /// Delete every record matching the filter
    ///
    /// `None` fields match anything. Nodes are compared by identity, the
    /// action by string equality. Returns the number of records deleted.
    pub fn remove(
        &mut self,
        role: Option<&Role>,
        resource: Option<&Resource>,
        action: &str,
        allowed: Option<bool>,
    ) -> usize {
        let before = self.records.len();
        self.records
            .retain(|record| !record.matches_filter(role, resource, action, allowed));
        let removed = before - self.records.len();

        debug!(
            role = role.map(|r| r.name()),
            resource = resource.map(|r| r.name()),
            action,
            allowed,
            removed,
            "Removed rules"
        );
        removed
    }

    /// Delete a single record by id
    pub fn remove_by_id(&mut self, id: RuleId) -> bool {
        match self.records.iter().position(|r| r.id == id) {
            Some(idx) => {
                self.records.remove(idx);
                debug!(id = %id, "Removed rule");
                true
            }
            None => false,
        }
    }

    /// Delete all records; registries and the sequence counter are kept
    pub fn clear(&mut self) {
        debug!(count = self.records.len(), "Clearing all rules");
        self.records.clear();
    }

    /// Replace the factory used for bare-name rules added from now on
    pub fn set_factory(&mut self, factory: RuleFactory) {
        debug!("Replacing rule factory");
        self.factory = factory;
    }

    pub fn factory(&self) -> &RuleFactory {
        &self.factory
    }

    /// Records in insertion order
    pub fn records(&self) -> impl Iterator<Item = &RuleRecord> {
        self.records.iter()
    }

    /// Records governing `action`, in insertion order
    pub fn records_for<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a RuleRecord> {
        self.records.iter().filter(move |r| r.action == action)
    }

    pub fn get(&self, id: RuleId) -> Option<&RuleRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check whether any record governs `action`
    pub fn has_action(&self, action: &str) -> bool {
        self.records_for(action).next().is_some()
    }

    pub fn roles(&self) -> &Registry<RoleKind> {
        &self.roles
    }

    pub fn resources(&self) -> &Registry<ResourceKind> {
        &self.resources
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleStore")
            .field("records", &self.records.len())
            .field("next_id", &self.next_id)
            .field("roles", &self.roles)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}
