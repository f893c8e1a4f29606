//! Rule resolution with specificity and recency ordering
//!
//! Resolution runs in four steps:
//!
//! 1. Expand the subject and object arguments into candidate lists. A name or
//!    a node gives one candidate at position 0; an aggregate gives each member
//!    at its current position. Unknown names give no candidates.
//! 2. For every subject candidate (outer loop) and object candidate (inner
//!    loop), test every record for the queried action. A record matches when
//!    the candidate is its bound node or a descendant of it, on both sides.
//! 3. Rank matches by total distance, then subject position, then object
//!    position, then newest record first.
//! 4. The head of the ranking decides.
//!
//! Resolution is read-only.

use crate::aggregate::Aggregate;
use crate::distance::{reach, Reach};
use crate::node::{Node, NodeKind, ResourceKind, RoleKind};
use crate::rule::RuleRef;
use crate::store::{Registry, RuleId, RuleRecord, RuleStore};
use std::cmp::Reverse;
use std::fmt;
use tracing::{trace, warn};

/// Query argument for one side of an access check
///
/// Built implicitly from `&str`, `&String`, `&Node` or `&Aggregate`.
pub enum Target<'a, K: NodeKind> {
    /// Name resolved through the registry (registered nodes and their
    /// descendants)
    Name(&'a str),
    /// A node used directly, registered or not
    Node(&'a Node<K>),
    /// Every member, in member order
    Aggregate(&'a Aggregate<K>),
}

impl<'a, K: NodeKind> Target<'a, K> {
    /// Expand into `(candidate, position)` pairs
    pub fn candidates(&self, registry: &Registry<K>) -> Vec<(Node<K>, usize)> {
        match self {
            Target::Name(name) => registry
                .find(name)
                .map(|node| vec![(node, 0)])
                .unwrap_or_default(),
            Target::Node(node) => vec![((*node).clone(), 0)],
            Target::Aggregate(aggregate) => aggregate.members().collect(),
        }
    }

    /// Short label for logs and error messages
    pub fn describe(&self) -> String {
        match self {
            Target::Name(name) => name.to_string(),
            Target::Node(node) => node.name().to_string(),
            Target::Aggregate(aggregate) => format!("[{}]", aggregate.names().join(", ")),
        }
    }
}

impl<'a, K: NodeKind> Clone for Target<'a, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K: NodeKind> Copy for Target<'a, K> {}

impl<'a, K: NodeKind> fmt::Debug for Target<'a, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Target::Node(node) => f.debug_tuple("Node").field(&node.name()).finish(),
            Target::Aggregate(aggregate) => {
                f.debug_tuple("Aggregate").field(&aggregate.names()).finish()
            }
        }
    }
}

impl<'a, K: NodeKind> From<&'a str> for Target<'a, K> {
    fn from(name: &'a str) -> Self {
        Target::Name(name)
    }
}

impl<'a, K: NodeKind> From<&'a String> for Target<'a, K> {
    fn from(name: &'a String) -> Self {
        Target::Name(name.as_str())
    }
}

impl<'a, K: NodeKind> From<&'a Node<K>> for Target<'a, K> {
    fn from(node: &'a Node<K>) -> Self {
        Target::Node(node)
    }
}

impl<'a, K: NodeKind> From<&'a Aggregate<K>> for Target<'a, K> {
    fn from(aggregate: &'a Aggregate<K>) -> Self {
        Target::Aggregate(aggregate)
    }
}

/// One ranked match: a record applied to one candidate pair
#[derive(Debug, Clone)]
pub struct RuleMatch {
    /// Subject distance plus object distance
    pub distance: usize,
    /// Position of the subject candidate in its expansion
    pub subject_position: usize,
    /// Position of the object candidate in its expansion
    pub object_position: usize,
    pub rule_id: RuleId,
    pub allowed: bool,
    pub rule: RuleRef,
}

impl RuleMatch {
    fn rank_key(&self) -> (usize, usize, usize, Reverse<RuleId>) {
        (
            self.distance,
            self.subject_position,
            self.object_position,
            Reverse(self.rule_id),
        )
    }

    fn new(
        record: &RuleRecord,
        distance: usize,
        subject_position: usize,
        object_position: usize,
    ) -> Self {
        RuleMatch {
            distance,
            subject_position,
            object_position,
            rule_id: record.id(),
            allowed: record.allowed(),
            rule: record.rule().clone(),
        }
    }
}

/// Read-only resolver over a rule store
pub struct Resolver<'s> {
    store: &'s RuleStore,
    max_depth: usize,
}

impl<'s> Resolver<'s> {
    pub fn new(store: &'s RuleStore, max_depth: usize) -> Self {
        Resolver { store, max_depth }
    }

    /// All matches for the query, best first
    pub fn resolve(
        &self,
        subject: Target<'_, RoleKind>,
        object: Target<'_, ResourceKind>,
        action: &str,
    ) -> Vec<RuleMatch> {
        let subjects = subject.candidates(self.store.roles());
        let objects = object.candidates(self.store.resources());

        if subjects.is_empty() || objects.is_empty() {
            trace!(
                subject = %subject.describe(),
                object = %object.describe(),
                action,
                "No candidates; nothing can match"
            );
            return Vec::new();
        }

        let records: Vec<&RuleRecord> = self.store.records_for(action).collect();
        if records.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        let mut truncated = 0usize;
        let mut hops = |r: Reach| {
            if r == Reach::Truncated {
                truncated += 1;
            }
            r.hops()
        };
        for (subject_node, subject_position) in &subjects {
            for (object_node, object_position) in &objects {
                for record in &records {
                    let Some(d_subject) = hops(reach(record.role(), subject_node, self.max_depth))
                    else {
                        continue;
                    };
                    let Some(d_object) =
                        hops(reach(record.resource(), object_node, self.max_depth))
                    else {
                        continue;
                    };
                    matches.push(RuleMatch::new(
                        record,
                        d_subject + d_object,
                        *subject_position,
                        *object_position,
                    ));
                }
            }
        }

        if truncated > 0 {
            warn!(
                subject = %subject.describe(),
                object = %object.describe(),
                action,
                max_depth = self.max_depth,
                truncated,
                "Traversal depth bound reached; deeper targets treated as unreachable"
            );
        }

        matches.sort_by_key(RuleMatch::rank_key);

        trace!(
            subject = %subject.describe(),
            object = %object.describe(),
            action,
            candidates = subjects.len() * objects.len(),
            records = records.len(),
            matches = matches.len(),
            "Resolved query"
        );
        matches
    }

    /// Decision for the query: the head match's effect, or deny
    pub fn decide(
        &self,
        subject: Target<'_, RoleKind>,
        object: Target<'_, ResourceKind>,
        action: &str,
    ) -> bool {
        self.resolve(subject, object, action)
            .first()
            .map_or(false, |m| m.allowed)
    }
}

/// Ranked rule payloads for a query, best match first
///
/// Recomputed on every query; holding one does not track later changes.
#[derive(Debug)]
pub struct RuleResults {
    allowed: bool,
    matches: std::vec::IntoIter<RuleMatch>,
}

impl RuleResults {
    pub(crate) fn new(matches: Vec<RuleMatch>) -> Self {
        RuleResults {
            allowed: matches.first().map_or(false, |m| m.allowed),
            matches: matches.into_iter(),
        }
    }

    /// Decision of the best match at the time of the query (deny if none)
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

impl Iterator for RuleResults {
    type Item = RuleRef;

    fn next(&mut self) -> Option<RuleRef> {
        self.matches.next().map(|m| m.rule)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.matches.size_hint()
    }
}

impl ExactSizeIterator for RuleResults {}
