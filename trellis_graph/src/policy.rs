// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pluggable id generation and acceptance policies.
//!
//! Hosts pass a [`Policy`] to the store at construction — never through
//! ambient state — to control how ids are minted and which node/edge
//! additions are accepted. [`SequentialIds`] is the default and applies
//! [`default_edge_rules`].

use crate::types::{EdgeId, Node, NodeId, Port};

/// Why an `add_node` call did not insert a node.
///
/// Rejections are ordinary values, not panics: the interaction layer reports
/// them as immediate feedback and carries on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeRejection {
    /// The caller-supplied (or generated) id is already in use.
    IdTaken,
    /// The node declares one port name twice on a side.
    DuplicatePortName,
    /// The policy's acceptance predicate declined the node.
    Rejected,
}

/// Why an `add_edge` call did not insert an edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeRejection {
    /// An endpoint references a node id absent from the document.
    UnknownNode(NodeId),
    /// An endpoint's port ordinal is out of range for its side.
    UnknownPort {
        /// Node the port was looked up on.
        node: NodeId,
        /// Out-of-range ordinal.
        index: usize,
    },
    /// Both endpoints sit on the same side; no output → input orientation
    /// exists.
    SameSide,
    /// Both endpoints sit on the same node.
    SameNode,
    /// The port type tags differ.
    TagMismatch,
    /// The destination input port already has an incoming edge.
    InputOccupied,
    /// A custom policy predicate declined the edge.
    Rejected,
}

/// A candidate connection, resolved and normalized output → input, handed to
/// [`Policy::accept_edge`] before anything is mutated.
#[derive(Debug)]
pub struct EdgeCandidate<'a> {
    /// Source node (output side).
    pub start_node: NodeId,
    /// Resolved source port.
    pub start_port: &'a Port,
    /// Destination node (input side).
    pub end_node: NodeId,
    /// Resolved destination port.
    pub end_port: &'a Port,
    /// `true` when the destination input port already has an incoming edge.
    pub input_occupied: bool,
}

/// The default acceptance rules, exposed so custom policies can layer on top
/// of them instead of restating them.
pub fn default_edge_rules(candidate: &EdgeCandidate<'_>) -> Result<(), EdgeRejection> {
    if candidate.start_node == candidate.end_node {
        return Err(EdgeRejection::SameNode);
    }
    if candidate.start_port.tag != candidate.end_port.tag {
        return Err(EdgeRejection::TagMismatch);
    }
    if candidate.input_occupied {
        return Err(EdgeRejection::InputOccupied);
    }
    Ok(())
}

/// Host-supplied id generation and acceptance policy.
///
/// Generators must never emit an id already live in the document;
/// [`Policy::observe_node_id`] / [`Policy::observe_edge_id`] are called for
/// every caller-supplied id so generators can steer around them.
pub trait Policy {
    /// Mint an id for a node added without a caller-supplied one.
    fn next_node_id(&mut self) -> NodeId;

    /// Mint an id for a new edge.
    fn next_edge_id(&mut self) -> EdgeId;

    /// A caller-supplied node id entered the document.
    fn observe_node_id(&mut self, id: NodeId) {
        let _ = id;
    }

    /// A caller-supplied edge id entered the document.
    fn observe_edge_id(&mut self, id: EdgeId) {
        let _ = id;
    }

    /// Whether to accept a node addition. Defaults to accepting everything.
    fn accept_node(&self, node: &Node) -> Result<(), NodeRejection> {
        let _ = node;
        Ok(())
    }

    /// Whether to accept a resolved connection. Defaults to
    /// [`default_edge_rules`].
    fn accept_edge(&self, candidate: &EdgeCandidate<'_>) -> Result<(), EdgeRejection> {
        default_edge_rules(candidate)
    }
}

/// Default policy: monotone counters, default acceptance rules.
///
/// Counters advance past observed ids, so documents with caller-minted ids
/// and generated ids coexist without collisions. [`NodeId::DRAFT`] is never
/// emitted.
#[derive(Clone, Debug)]
pub struct SequentialIds {
    next_node: u64,
    next_edge: u64,
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self {
            next_node: 1,
            next_edge: 1,
        }
    }
}

impl SequentialIds {
    /// Create a generator starting both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Policy for SequentialIds {
    fn next_node_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        id
    }

    fn next_edge_id(&mut self) -> EdgeId {
        let id = EdgeId::new(self.next_edge);
        self.next_edge += 1;
        id
    }

    fn observe_node_id(&mut self, id: NodeId) {
        if id != NodeId::DRAFT && id.get() >= self.next_node {
            self.next_node = id.get() + 1;
        }
    }

    fn observe_edge_id(&mut self, id: EdgeId) {
        if id.get() >= self.next_edge {
            self.next_edge = id.get() + 1;
        }
    }
}
