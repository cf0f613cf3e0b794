//! Arena primitives for the AND/OR activation graph.
//!
//! Nodes live in a contiguous arena and are addressed by [`NodeId`]. Ids are
//! dense, assigned in definition order, and ordered by their inner `u32`, so
//! every traversal that iterates ids in ascending order is deterministic.

use ps_types::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense node identifier, an index into the graph's node arena.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A graph node. `parameter` fields index the graph's parameter set.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The single root. Always done.
    Start,
    /// A reachable sub-domain of a parameter.
    And { parameter: usize, domain: Domain },
    /// The activation point of a parameter.
    Or { parameter: usize },
}

impl Node {
    pub fn parameter(&self) -> Option<usize> {
        match self {
            Node::Start => None,
            Node::And { parameter, .. } | Node::Or { parameter } => Some(*parameter),
        }
    }

    pub fn domain(&self) -> Option<&Domain> {
        match self {
            Node::And { domain, .. } => Some(domain),
            _ => None,
        }
    }

    pub fn is_or(&self) -> bool {
        matches!(self, Node::Or { .. })
    }

    pub fn is_and(&self) -> bool {
        matches!(self, Node::And { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Start => "start",
            Node::And { .. } => "AND",
            Node::Or { .. } => "OR",
        }
    }
}

/// Directed edge. Group 0 is disjunctive; a nonzero group is a conjunction of
/// every edge into the same target carrying that group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub group: i32,
}

/// Precomputed activation gate of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Gate {
    pub(crate) disjunctive: Vec<NodeId>,
    pub(crate) groups: Vec<Vec<NodeId>>,
}

impl Gate {
    /// True iff some group-0 parent is done, or some conjunctive group is
    /// done in full.
    pub(crate) fn is_open(&self, done: &DoneSet) -> bool {
        self.disjunctive.iter().any(|n| done.contains(*n))
            || self
                .groups
                .iter()
                .any(|group| group.iter().all(|n| done.contains(*n)))
    }
}

/// Bitmap of done AND nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneSet {
    bits: Vec<bool>,
}

impl DoneSet {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.bits.get(id.index()).copied().unwrap_or(false)
    }

    #[inline]
    pub fn insert(&mut self, id: NodeId) {
        if let Some(bit) = self.bits.get_mut(id.index()) {
            *bit = true;
        }
    }

    #[inline]
    pub fn remove(&mut self, id: NodeId) {
        if let Some(bit) = self.bits.get_mut(id.index()) {
            *bit = false;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, done)| **done)
            .map(|(i, _)| NodeId::new(i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_semantics() {
        let (a, b, c) = (NodeId::new(0), NodeId::new(1), NodeId::new(2));
        let gate = Gate {
            disjunctive: vec![a],
            groups: vec![vec![b, c]],
        };

        let mut done = DoneSet::new(3);
        assert!(!gate.is_open(&done));
        done.insert(b);
        assert!(!gate.is_open(&done));
        done.insert(c);
        assert!(gate.is_open(&done));
        done.remove(b);
        done.insert(a);
        assert!(gate.is_open(&done));
        assert_eq!(done.iter().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn empty_gate_is_closed() {
        assert!(!Gate::default().is_open(&DoneSet::new(4)));
    }

    #[test]
    fn node_accessors() {
        let and = Node::And {
            parameter: 2,
            domain: Domain::integer(0, 3),
        };
        assert_eq!(and.parameter(), Some(2));
        assert!(and.is_and());
        assert_eq!(Node::Start.parameter(), None);
        assert!(Node::Or { parameter: 0 }.domain().is_none());
        assert_eq!(NodeId::new(7).to_string(), "NodeId(7)");
    }
}
