// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document model: ids, ports, nodes, edges, and the draft layout override.

use alloc::string::String;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Rect;
use smallvec::SmallVec;

/// Identifier for a node in the document.
///
/// Ids are plain values into flat id-keyed maps; nothing in the engine holds
/// an ownership link to another entity, so reference cycles cannot form.
/// Hosts may mint their own ids (documents round-trip) or let the store's
/// [`Policy`](crate::Policy) generate them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Reserved id for the in-progress draft-placement node.
    ///
    /// [`SequentialIds`](crate::SequentialIds) never emits it; custom
    /// policies must avoid it as well.
    pub const DRAFT: Self = Self(u64::MAX);

    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Identifier for an edge in the document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u64);

impl EdgeId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Which side of a node a port sits on.
///
/// Inputs anchor along the top edge, outputs along the bottom edge; an edge
/// always runs output → input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PortSide {
    /// Incoming side. At most one edge per input port under the default
    /// policy.
    Input,
    /// Outgoing side. Fan-out is unrestricted.
    Output,
}

/// A named, typed connection point on a node.
///
/// Names are unique within their node and side; the same name may appear on
/// both sides of one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    /// Name, unique within node + side.
    pub name: String,
    /// Type tag. The default policy only connects ports with equal tags.
    pub tag: String,
}

impl Port {
    /// Create a port from name and type tag.
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

/// A positioned, titled entity with ordered input and output ports.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Canonical world-space rectangle. Draft layout overrides never touch it.
    pub rect: Rect,
    /// Display title.
    pub title: String,
    /// Ordered input ports (anchored along the top edge).
    pub inputs: SmallVec<[Port; 4]>,
    /// Ordered output ports (anchored along the bottom edge).
    pub outputs: SmallVec<[Port; 4]>,
}

impl Node {
    /// Create a node with no ports.
    pub fn new(rect: Rect, title: impl Into<String>) -> Self {
        Self {
            rect,
            title: title.into(),
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
        }
    }

    /// Append an input port.
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.inputs.push(Port::new(name, tag));
        self
    }

    /// Append an output port.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.outputs.push(Port::new(name, tag));
        self
    }
}

/// One end of an edge: a node plus a port name on it.
///
/// Stored by name, not ordinal, so port reordering on a node does not silently
/// rewire existing edges.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// The node the edge is anchored to.
    pub node: NodeId,
    /// Port name on that node (output side for starts, input side for ends).
    pub port: String,
}

/// A directed connection from an output port to an input port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Source endpoint; always an output port.
    pub start: Endpoint,
    /// Destination endpoint; always an input port.
    pub end: Endpoint,
}

/// A port addressed by ordinal, as connection gestures produce it.
///
/// Hit testing resolves a pointer to "the i-th port on this side of this
/// node"; [`GraphStore::add_edge`](crate::GraphStore::add_edge) resolves the
/// ordinal to a port name at connection time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PortRef {
    /// Node carrying the port.
    pub node: NodeId,
    /// Side the port sits on.
    pub side: PortSide,
    /// Zero-based position within that side's ordered port list.
    pub index: usize,
}

impl PortRef {
    /// Address the `index`-th port on `side` of `node`.
    #[must_use]
    pub const fn new(node: NodeId, side: PortSide, index: usize) -> Self {
        Self { node, side, index }
    }
}

/// The round-trippable canonical document: flat id-keyed node and edge maps.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Live nodes by id.
    pub nodes: HashMap<NodeId, Node>,
    /// Live edges by id.
    pub edges: HashMap<EdgeId, Edge>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Temporary per-node rectangle overrides during an in-progress
/// move/resize/placement.
///
/// Only rendering and edge-geometry preview read this; canonical geometry and
/// the spatial index never do. Its key set is always a subset of the nodes
/// currently subject to an interaction, and it empties on confirm or cancel.
#[derive(Clone, Debug, Default)]
pub struct DraftLayout {
    overrides: HashMap<NodeId, Rect>,
}

impl DraftLayout {
    /// Create an empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the draft rectangle for `node`.
    pub fn set(&mut self, node: NodeId, rect: Rect) {
        self.overrides.insert(node, rect);
    }

    /// The draft rectangle for `node`, if one is in effect.
    #[must_use]
    pub fn rect_of(&self, node: NodeId) -> Option<Rect> {
        self.overrides.get(&node).copied()
    }

    /// Drop the override for `node`.
    pub fn remove(&mut self, node: NodeId) {
        self.overrides.remove(&node);
    }

    /// Drop every override.
    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    /// `true` when no override is in effect.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Iterate over `(node, draft rect)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Rect)> + '_ {
        self.overrides.iter().map(|(id, r)| (*id, *r))
    }
}

/// Fatal validation failure for an init document.
///
/// The engine cannot guarantee its invariants over a document whose edges
/// reference missing nodes or ports, so construction fails fast instead of
/// initializing partial state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentError {
    /// An edge references a node id absent from the node map.
    MissingNode {
        /// The offending edge.
        edge: EdgeId,
        /// The referenced, absent node.
        node: NodeId,
    },
    /// An edge references a port name absent from the expected side of an
    /// existing node.
    MissingPort {
        /// The offending edge.
        edge: EdgeId,
        /// The node the port was expected on.
        node: NodeId,
        /// The expected side (output for starts, input for ends).
        side: PortSide,
        /// The missing port name.
        port: String,
    },
    /// A node declares the same port name twice on one side.
    DuplicatePortName {
        /// The offending node.
        node: NodeId,
        /// The side carrying the duplicate.
        side: PortSide,
        /// The duplicated name.
        name: String,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode { edge, node } => {
                write!(f, "edge {} references missing node {}", edge.get(), node.get())
            }
            Self::MissingPort {
                edge,
                node,
                side,
                port,
            } => write!(
                f,
                "edge {} references missing {:?} port {port:?} on node {}",
                edge.get(),
                side,
                node.get()
            ),
            Self::DuplicatePortName { node, side, name } => write!(
                f,
                "node {} declares {:?} port {name:?} more than once",
                node.get(),
                side
            ),
        }
    }
}

impl core::error::Error for DocumentError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_layout_round_trips() {
        let mut draft = DraftLayout::new();
        let id = NodeId::new(3);
        assert!(draft.rect_of(id).is_none());
        draft.set(id, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(draft.rect_of(id), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
        draft.clear();
        assert!(draft.is_empty());
    }

    #[test]
    fn node_builder_orders_ports() {
        let node = Node::new(Rect::new(0.0, 0.0, 10.0, 10.0), "n")
            .with_input("a", "t")
            .with_input("b", "t")
            .with_output("out", "t");
        assert_eq!(node.inputs[0].name, "a");
        assert_eq!(node.inputs[1].name, "b");
        assert_eq!(node.outputs[0].name, "out");
    }

    #[test]
    fn draft_id_is_reserved() {
        assert_eq!(NodeId::DRAFT.get(), u64::MAX);
    }
}
