//! Shortest-path distance over child edges
//!
//! Breadth-first traversal, level by level. A DAG may offer several paths of
//! different lengths between the same pair of nodes; BFS returns the shortest
//! one because it stops at the first level containing the target.

use crate::node::{Node, NodeKind};
use ahash::AHashSet;
use tracing::trace;

/// Outcome of a bounded search from one node towards another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reach {
    /// Target found this many hops down
    Found(usize),
    /// Target is not a descendant
    Unreachable,
    /// Nodes remained below the depth bound when the search stopped
    Truncated,
}

impl Reach {
    pub(crate) fn hops(self) -> Option<usize> {
        match self {
            Reach::Found(hops) => Some(hops),
            Reach::Unreachable | Reach::Truncated => None,
        }
    }
}

/// Number of child-edge hops from `from` down to `to`
///
/// Returns `Some(0)` when both handles are the same node, `None` when `to`
/// is not a descendant of `from` or lies deeper than `max_depth` hops.
///
/// # Examples
///
/// ```
/// use hieracl_rs::{distance, Resource};
///
/// let site = Resource::new("Site");
/// let blog = Resource::new("Blog");
/// let page = Resource::new("Page");
/// site.add_child(&blog).unwrap();
/// blog.add_child(&page).unwrap();
///
/// assert_eq!(distance(&site, &site, 16), Some(0));
/// assert_eq!(distance(&site, &page, 16), Some(2));
/// assert_eq!(distance(&page, &site, 16), None);
/// ```
pub fn distance<K: NodeKind>(from: &Node<K>, to: &Node<K>, max_depth: usize) -> Option<usize> {
    reach(from, to, max_depth).hops()
}

/// Bounded breadth-first search, reporting whether the bound cut it short
pub(crate) fn reach<K: NodeKind>(from: &Node<K>, to: &Node<K>, max_depth: usize) -> Reach {
    if from.ptr_eq(to) {
        return Reach::Found(0);
    }

    let mut visited: AHashSet<usize> = AHashSet::new();
    visited.insert(from.id());
    let mut frontier = vec![from.clone()];

    for depth in 1..=max_depth {
        let mut next = Vec::new();

        for node in &frontier {
            for child in node.read_children().iter() {
                if child.ptr_eq(to) {
                    return Reach::Found(depth);
                }
                if visited.insert(child.id()) {
                    next.push(child.clone());
                }
            }
        }

        if next.is_empty() {
            return Reach::Unreachable;
        }
        frontier = next;
    }

    trace!(
        kind = K::LABEL,
        from = %from.name(),
        to = %to.name(),
        max_depth,
        "Search stopped at depth bound"
    );
    Reach::Truncated
}
