// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The store: canonical document plus every derived index, mutated atomically.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Rect};
use trellis_quadtree::QuadTree;

use crate::policy::{EdgeCandidate, EdgeRejection, NodeRejection, Policy, SequentialIds};
use crate::types::{
    Document, DocumentError, DraftLayout, Edge, EdgeId, Endpoint, Node, NodeId, Port, PortRef,
    PortSide,
};

/// Cached absolute endpoint coordinates for one edge.
///
/// Materialized, never recomputed on read: after any geometry change the
/// owner must call [`GraphStore::refresh_edge_anchors`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeAnchors {
    /// World-space anchor of the start (output) port.
    pub start: Point,
    /// World-space anchor of the end (input) port.
    pub end: Point,
}

/// Port-name → ordinal maps for one node, one per side.
#[derive(Clone, Debug, Default)]
struct PortOrdinals {
    inputs: HashMap<String, usize>,
    outputs: HashMap<String, usize>,
}

impl PortOrdinals {
    /// Build both maps, reporting the first duplicate name within a side.
    fn build(node: &Node) -> Result<Self, (PortSide, String)> {
        let mut ordinals = Self::default();
        for (i, port) in node.inputs.iter().enumerate() {
            if ordinals.inputs.insert(port.name.clone(), i).is_some() {
                return Err((PortSide::Input, port.name.clone()));
            }
        }
        for (i, port) in node.outputs.iter().enumerate() {
            if ordinals.outputs.insert(port.name.clone(), i).is_some() {
                return Err((PortSide::Output, port.name.clone()));
            }
        }
        Ok(ordinals)
    }

    fn ordinal(&self, side: PortSide, name: &str) -> Option<usize> {
        match side {
            PortSide::Input => self.inputs.get(name).copied(),
            PortSide::Output => self.outputs.get(name).copied(),
        }
    }
}

/// Per-port incident edge sets for one node, one map per side.
#[derive(Clone, Debug, Default)]
struct PortEdges {
    inputs: HashMap<String, HashSet<EdgeId>>,
    outputs: HashMap<String, HashSet<EdgeId>>,
}

impl PortEdges {
    fn side(&self, side: PortSide) -> &HashMap<String, HashSet<EdgeId>> {
        match side {
            PortSide::Input => &self.inputs,
            PortSide::Output => &self.outputs,
        }
    }

    fn side_mut(&mut self, side: PortSide) -> &mut HashMap<String, HashSet<EdgeId>> {
        match side {
            PortSide::Input => &mut self.inputs,
            PortSide::Output => &mut self.outputs,
        }
    }
}

/// The complete derived state of a store: document, index web, quadtree.
///
/// Cloning yields a deep snapshot that shares nothing with the live store,
/// which is exactly what history entries need.
#[derive(Clone, Debug)]
pub struct GraphState {
    doc: Document,
    port_index: HashMap<NodeId, PortOrdinals>,
    node_edges: HashMap<NodeId, HashSet<EdgeId>>,
    port_edges: HashMap<NodeId, PortEdges>,
    anchors: HashMap<EdgeId, EdgeAnchors>,
    index: QuadTree<NodeId>,
}

impl GraphState {
    fn empty(bound: Rect, min_cell: f64) -> Self {
        Self {
            doc: Document::new(),
            port_index: HashMap::new(),
            node_edges: HashMap::new(),
            port_edges: HashMap::new(),
            anchors: HashMap::new(),
            index: QuadTree::with_min_cell(bound, min_cell),
        }
    }

    fn resolve_port(&self, port: PortRef) -> Result<&Port, EdgeRejection> {
        let node = self
            .doc
            .nodes
            .get(&port.node)
            .ok_or(EdgeRejection::UnknownNode(port.node))?;
        let list = match port.side {
            PortSide::Input => &node.inputs,
            PortSide::Output => &node.outputs,
        };
        list.get(port.index).ok_or(EdgeRejection::UnknownPort {
            node: port.node,
            index: port.index,
        })
    }

    fn input_occupied(&self, node: NodeId, name: &str) -> bool {
        self.port_edges
            .get(&node)
            .and_then(|p| p.side(PortSide::Input).get(name))
            .is_some_and(|set| !set.is_empty())
    }

    /// Anchor of one endpoint under the given layout source.
    fn endpoint_anchor(
        &self,
        endpoint: &Endpoint,
        side: PortSide,
        draft: Option<&DraftLayout>,
    ) -> Option<Point> {
        let node = self.doc.nodes.get(&endpoint.node)?;
        let ordinal = self
            .port_index
            .get(&endpoint.node)?
            .ordinal(side, &endpoint.port)?;
        let count = match side {
            PortSide::Input => node.inputs.len(),
            PortSide::Output => node.outputs.len(),
        };
        let rect = draft
            .and_then(|d| d.rect_of(endpoint.node))
            .unwrap_or(node.rect);
        Some(anchor_point(rect, side, ordinal, count))
    }

    fn compute_anchors(&self, edge: &Edge, draft: Option<&DraftLayout>) -> Option<EdgeAnchors> {
        Some(EdgeAnchors {
            start: self.endpoint_anchor(&edge.start, PortSide::Output, draft)?,
            end: self.endpoint_anchor(&edge.end, PortSide::Input, draft)?,
        })
    }

    fn link(&mut self, id: EdgeId, endpoint: &Endpoint, side: PortSide) {
        self.node_edges.entry(endpoint.node).or_default().insert(id);
        self.port_edges
            .entry(endpoint.node)
            .or_default()
            .side_mut(side)
            .entry(endpoint.port.clone())
            .or_default()
            .insert(id);
    }

    fn unlink(&mut self, id: EdgeId, endpoint: &Endpoint, side: PortSide) {
        if let Some(set) = self.node_edges.get_mut(&endpoint.node) {
            set.remove(&id);
        }
        if let Some(ports) = self.port_edges.get_mut(&endpoint.node) {
            let by_name = ports.side_mut(side);
            if let Some(set) = by_name.get_mut(&endpoint.port) {
                set.remove(&id);
                if set.is_empty() {
                    by_name.remove(&endpoint.port);
                }
            }
        }
    }
}

/// Proportional spacing along a node edge: ordinal `i` of `count` ports lands
/// at `x + w·(i+1)/(count+1)`; inputs anchor on the top edge, outputs on the
/// bottom.
fn anchor_point(rect: Rect, side: PortSide, ordinal: usize, count: usize) -> Point {
    let x = rect.x0 + rect.width() * ((ordinal + 1) as f64) / ((count + 1) as f64);
    let y = match side {
        PortSide::Input => rect.y0,
        PortSide::Output => rect.y1,
    };
    Point::new(x, y)
}

/// Canonical node/edge document plus its derived index web.
///
/// Every operation leaves the document, port-index maps, adjacency maps,
/// anchor cache, and quadtree mutually consistent before returning; no
/// partially-updated state is ever observable. Operations on nonexistent ids
/// are idempotent no-ops, and acceptance rejections are ordinary `Err`
/// values.
#[derive(Clone)]
pub struct GraphStore<P: Policy = SequentialIds> {
    state: GraphState,
    policy: P,
}

impl<P: Policy> core::fmt::Debug for GraphStore<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.state.doc.nodes.len())
            .field("edges", &self.state.doc.edges.len())
            .field("index", &self.state.index)
            .finish_non_exhaustive()
    }
}

impl<P: Policy> GraphStore<P> {
    /// Create an empty store indexed over `bound` at the coarse default
    /// resolution.
    pub fn new(bound: Rect, policy: P) -> Self {
        Self::with_min_cell(bound, trellis_quadtree::DEFAULT_MIN_CELL, policy)
    }

    /// Create an empty store whose quadtree subdivides down to `min_cell`.
    pub fn with_min_cell(bound: Rect, min_cell: f64, policy: P) -> Self {
        Self {
            state: GraphState::empty(bound, min_cell),
            policy,
        }
    }

    /// Build a store from an existing document at the coarse default
    /// resolution.
    ///
    /// The document is validated up front; an edge referencing a missing
    /// node or port, or a node with a duplicate port name, fails construction
    /// with a [`DocumentError`] and no partial state.
    pub fn from_document(bound: Rect, policy: P, doc: Document) -> Result<Self, DocumentError> {
        Self::from_document_with_min_cell(bound, trellis_quadtree::DEFAULT_MIN_CELL, policy, doc)
    }

    /// [`GraphStore::from_document`] with an explicit quadtree resolution.
    pub fn from_document_with_min_cell(
        bound: Rect,
        min_cell: f64,
        policy: P,
        doc: Document,
    ) -> Result<Self, DocumentError> {
        // Validate everything before building anything.
        let mut port_index: HashMap<NodeId, PortOrdinals> = HashMap::new();
        for (&id, node) in &doc.nodes {
            let ordinals = PortOrdinals::build(node)
                .map_err(|(side, name)| DocumentError::DuplicatePortName { node: id, side, name })?;
            port_index.insert(id, ordinals);
        }
        for (&eid, edge) in &doc.edges {
            for (endpoint, side) in [
                (&edge.start, PortSide::Output),
                (&edge.end, PortSide::Input),
            ] {
                let ordinals =
                    port_index
                        .get(&endpoint.node)
                        .ok_or(DocumentError::MissingNode {
                            edge: eid,
                            node: endpoint.node,
                        })?;
                if ordinals.ordinal(side, &endpoint.port).is_none() {
                    return Err(DocumentError::MissingPort {
                        edge: eid,
                        node: endpoint.node,
                        side,
                        port: endpoint.port.clone(),
                    });
                }
            }
        }

        let mut store = Self::with_min_cell(bound, min_cell, policy);
        store.state.port_index = port_index;

        // Insert nodes in id order so the quadtree shape is a function of the
        // document, not of map iteration order.
        let mut node_ids: Vec<NodeId> = doc.nodes.keys().copied().collect();
        node_ids.sort_unstable();
        for &id in &node_ids {
            let node = &doc.nodes[&id];
            store.state.index.insert(node.rect, id);
            store.state.node_edges.insert(id, HashSet::new());
            store.state.port_edges.insert(id, PortEdges::default());
            store.policy.observe_node_id(id);
        }
        store.state.doc.nodes = doc.nodes;

        for (&eid, edge) in &doc.edges {
            store.state.link(eid, &edge.start, PortSide::Output);
            store.state.link(eid, &edge.end, PortSide::Input);
            store.policy.observe_edge_id(eid);
        }
        store.state.doc.edges = doc.edges;
        for (&eid, edge) in &store.state.doc.edges {
            if let Some(anchors) = store.state.compute_anchors(edge, None) {
                store.state.anchors.insert(eid, anchors);
            }
        }
        Ok(store)
    }

    /// The round-trippable canonical document.
    pub fn document(&self) -> &Document {
        &self.state.doc
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.state.doc.nodes.get(&id)
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.state.doc.edges.get(&id)
    }

    /// Cached endpoint anchors for an edge.
    pub fn anchors(&self, id: EdgeId) -> Option<EdgeAnchors> {
        self.state.anchors.get(&id).copied()
    }

    /// Edges incident to `node` (empty for unknown ids).
    pub fn edges_of(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.state
            .node_edges
            .get(&node)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Coarse spatial query: candidate node ids whose quadtree cells touch
    /// `window`. Callers needing exactness re-check canonical rects.
    pub fn nodes_in(&self, window: Rect) -> Vec<NodeId> {
        self.state.index.covered(window)
    }

    /// Read access to the spatial index (diagnostics and benches).
    pub fn spatial(&self) -> &QuadTree<NodeId> {
        &self.state.index
    }

    /// Add a node, under `id` when supplied, else under a generated id.
    ///
    /// Runs the policy's acceptance predicate first; a rejection leaves the
    /// store untouched. On success the node is in the document, the
    /// quadtree, both port-index maps, and has empty adjacency entries.
    pub fn add_node(&mut self, id: Option<NodeId>, node: Node) -> Result<NodeId, NodeRejection> {
        self.policy.accept_node(&node)?;
        let ordinals =
            PortOrdinals::build(&node).map_err(|_| NodeRejection::DuplicatePortName)?;
        let id = match id {
            Some(id) => {
                if self.state.doc.nodes.contains_key(&id) {
                    return Err(NodeRejection::IdTaken);
                }
                self.policy.observe_node_id(id);
                id
            }
            None => {
                let id = self.policy.next_node_id();
                if self.state.doc.nodes.contains_key(&id) {
                    return Err(NodeRejection::IdTaken);
                }
                id
            }
        };
        self.state.index.insert(node.rect, id);
        self.state.port_index.insert(id, ordinals);
        self.state.node_edges.insert(id, HashSet::new());
        self.state.port_edges.insert(id, PortEdges::default());
        self.state.doc.nodes.insert(id, node);
        Ok(id)
    }

    /// Delete a node, cascading over its incident edges first so the
    /// endpoint-existence invariant never breaks. Returns `false` for
    /// unknown ids.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        if !self.state.doc.nodes.contains_key(&id) {
            return false;
        }
        let incident: Vec<EdgeId> = self.edges_of(id).collect();
        for eid in incident {
            self.delete_edge(eid);
        }
        let Some(node) = self.state.doc.nodes.remove(&id) else {
            return false;
        };
        self.state.index.remove(node.rect.origin(), id);
        self.state.port_index.remove(&id);
        self.state.node_edges.remove(&id);
        self.state.port_edges.remove(&id);
        true
    }

    /// Connect two ports.
    ///
    /// The pair may arrive in either order (hosts let users drag from either
    /// end); it is normalized so the stored edge runs output → input. The
    /// ordinals resolve to port names via the ordered port lists, the
    /// policy's acceptance predicate runs over the resolved candidate, and on
    /// success the edge is registered in both adjacency maps with its
    /// anchors cached from current geometry.
    pub fn add_edge(&mut self, a: PortRef, b: PortRef) -> Result<EdgeId, EdgeRejection> {
        let (start, end) = match (a.side, b.side) {
            (PortSide::Output, PortSide::Input) => (a, b),
            (PortSide::Input, PortSide::Output) => (b, a),
            _ => return Err(EdgeRejection::SameSide),
        };
        let start_port = self.state.resolve_port(start)?;
        let end_port = self.state.resolve_port(end)?;
        let candidate = EdgeCandidate {
            start_node: start.node,
            start_port,
            end_node: end.node,
            end_port,
            input_occupied: self.state.input_occupied(end.node, &end_port.name),
        };
        self.policy.accept_edge(&candidate)?;
        let start_name = start_port.name.clone();
        let end_name = end_port.name.clone();

        let id = self.policy.next_edge_id();
        let edge = Edge {
            start: Endpoint {
                node: start.node,
                port: start_name,
            },
            end: Endpoint {
                node: end.node,
                port: end_name,
            },
        };
        self.state.link(id, &edge.start, PortSide::Output);
        self.state.link(id, &edge.end, PortSide::Input);
        if let Some(anchors) = self.state.compute_anchors(&edge, None) {
            self.state.anchors.insert(id, anchors);
        }
        self.state.doc.edges.insert(id, edge);
        Ok(id)
    }

    /// Delete an edge, dropping its adjacency and cache entries. Returns
    /// `false` for unknown ids.
    pub fn delete_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.state.doc.edges.remove(&id) else {
            return false;
        };
        self.state.unlink(id, &edge.start, PortSide::Output);
        self.state.unlink(id, &edge.end, PortSide::Input);
        self.state.anchors.remove(&id);
        true
    }

    /// Recompute cached anchors for every edge touching `node`.
    ///
    /// Each endpoint sources its node rect from `draft` when an override is
    /// in effect there, else from canonical geometry. Must be called after
    /// any geometry change; the cache never refreshes itself on read.
    pub fn refresh_edge_anchors(&mut self, node: NodeId, draft: Option<&DraftLayout>) {
        let Some(edges) = self.state.node_edges.get(&node) else {
            return;
        };
        let mut updates: Vec<(EdgeId, EdgeAnchors)> = Vec::new();
        for &eid in edges {
            if let Some(edge) = self.state.doc.edges.get(&eid)
                && let Some(anchors) = self.state.compute_anchors(edge, draft)
            {
                updates.push((eid, anchors));
            }
        }
        for (eid, anchors) in updates {
            self.state.anchors.insert(eid, anchors);
        }
    }

    /// Commit a new canonical rect for `node`: re-keys its quadtree entry
    /// (growing the content bound when needed) and refreshes its edges'
    /// anchors from canonical geometry. Returns `false` for unknown ids.
    pub fn commit_rect(&mut self, node: NodeId, rect: Rect) -> bool {
        let Some(entry) = self.state.doc.nodes.get_mut(&node) else {
            return false;
        };
        let old = entry.rect;
        entry.rect = rect;
        self.state.index.remove(old.origin(), node);
        self.state.index.insert(rect, node);
        self.refresh_edge_anchors(node, None);
        true
    }

    /// Deep snapshot of the full derived state for the history stack.
    pub fn snapshot(&self) -> GraphState {
        self.state.clone()
    }

    /// Replace the full derived state with a (cloned) history snapshot.
    pub fn restore(&mut self, state: GraphState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const BOUND: Rect = Rect::new(0.0, 0.0, 600.0, 600.0);

    fn source(x: f64, y: f64) -> Node {
        Node::new(Rect::new(x, y, x + 100.0, y + 50.0), "source").with_output("out", "flow")
    }

    fn sink(x: f64, y: f64) -> Node {
        Node::new(Rect::new(x, y, x + 100.0, y + 50.0), "sink").with_input("in", "flow")
    }

    fn store() -> GraphStore {
        GraphStore::new(BOUND, SequentialIds::new())
    }

    fn out_ref(node: NodeId) -> PortRef {
        PortRef::new(node, PortSide::Output, 0)
    }

    fn in_ref(node: NodeId) -> PortRef {
        PortRef::new(node, PortSide::Input, 0)
    }

    #[test]
    fn add_node_builds_every_index() {
        let mut store = store();
        let id = store.add_node(None, source(10.0, 10.0)).unwrap();
        assert!(store.node(id).is_some());
        assert_eq!(store.edges_of(id).count(), 0);
        assert_eq!(store.nodes_in(Rect::new(0.0, 0.0, 50.0, 50.0)), vec![id]);
        assert_eq!(store.spatial().len(), 1);
    }

    #[test]
    fn caller_ids_round_trip_and_collide() {
        let mut store = store();
        let id = NodeId::new(40);
        assert_eq!(store.add_node(Some(id), source(0.0, 0.0)), Ok(id));
        assert_eq!(
            store.add_node(Some(id), source(0.0, 0.0)),
            Err(NodeRejection::IdTaken)
        );
        // The generator steered past the observed id.
        let next = store.add_node(None, sink(0.0, 200.0)).unwrap();
        assert_eq!(next, NodeId::new(41));
    }

    #[test]
    fn edge_acceptance_matrix() {
        let mut store = store();
        let a = store
            .add_node(
                None,
                Node::new(Rect::new(0.0, 0.0, 100.0, 50.0), "a")
                    .with_input("in", "flow")
                    .with_output("out", "flow"),
            )
            .unwrap();
        let b = store
            .add_node(
                None,
                Node::new(Rect::new(0.0, 200.0, 100.0, 250.0), "b")
                    .with_input("in", "flow")
                    .with_output("out", "data"),
            )
            .unwrap();

        // Same node.
        assert_eq!(
            store.add_edge(out_ref(a), in_ref(a)),
            Err(EdgeRejection::SameNode)
        );
        // Same side.
        assert_eq!(
            store.add_edge(out_ref(a), out_ref(b)),
            Err(EdgeRejection::SameSide)
        );
        // Tag mismatch: b's output is "data", a's input is "flow".
        assert_eq!(
            store.add_edge(out_ref(b), in_ref(a)),
            Err(EdgeRejection::TagMismatch)
        );
        // Accepted, in either argument order.
        let e = store.add_edge(in_ref(b), out_ref(a)).unwrap();
        let edge = store.edge(e).unwrap();
        assert_eq!(edge.start.node, a);
        assert_eq!(edge.end.node, b);
        // The destination input is now occupied.
        assert_eq!(
            store.add_edge(out_ref(a), in_ref(b)),
            Err(EdgeRejection::InputOccupied)
        );
        // Unknown ids and out-of-range ordinals.
        assert_eq!(
            store.add_edge(out_ref(NodeId::new(99)), in_ref(b)),
            Err(EdgeRejection::UnknownNode(NodeId::new(99)))
        );
        assert_eq!(
            store.add_edge(PortRef::new(a, PortSide::Output, 7), in_ref(b)),
            Err(EdgeRejection::UnknownPort { node: a, index: 7 })
        );
    }

    #[test]
    fn anchors_follow_the_port_formula() {
        let mut store = store();
        let a = store.add_node(None, source(0.0, 0.0)).unwrap();
        let b = store.add_node(None, sink(0.0, 100.0)).unwrap();
        let e = store.add_edge(out_ref(a), in_ref(b)).unwrap();
        let anchors = store.anchors(e).unwrap();
        // One port on each side: centered at (i+1)/(n+1) = 1/2 of the width.
        assert_eq!(anchors.start, Point::new(50.0, 50.0));
        assert_eq!(anchors.end, Point::new(50.0, 100.0));
    }

    #[test]
    fn anchor_spacing_is_proportional() {
        let node = Node::new(Rect::new(0.0, 0.0, 90.0, 30.0), "n")
            .with_input("a", "t")
            .with_input("b", "t");
        assert_eq!(
            anchor_point(node.rect, PortSide::Input, 0, node.inputs.len()),
            Point::new(30.0, 0.0)
        );
        assert_eq!(
            anchor_point(node.rect, PortSide::Input, 1, node.inputs.len()),
            Point::new(60.0, 0.0)
        );
    }

    #[test]
    fn refresh_with_draft_overrides_one_endpoint() {
        let mut store = store();
        let a = store.add_node(None, source(0.0, 0.0)).unwrap();
        let b = store.add_node(None, sink(0.0, 100.0)).unwrap();
        let e = store.add_edge(out_ref(a), in_ref(b)).unwrap();

        let mut draft = DraftLayout::new();
        draft.set(a, Rect::new(200.0, 0.0, 300.0, 50.0));
        store.refresh_edge_anchors(a, Some(&draft));
        let anchors = store.anchors(e).unwrap();
        assert_eq!(anchors.start, Point::new(250.0, 50.0));
        // The other endpoint keeps canonical geometry.
        assert_eq!(anchors.end, Point::new(50.0, 100.0));

        // Refreshing without the draft restores canonical anchors.
        store.refresh_edge_anchors(a, None);
        assert_eq!(store.anchors(e).unwrap().start, Point::new(50.0, 50.0));
    }

    #[test]
    fn delete_node_cascades_to_edges() {
        let mut store = store();
        let a = store.add_node(None, source(0.0, 0.0)).unwrap();
        let b = store.add_node(None, sink(0.0, 100.0)).unwrap();
        let e = store.add_edge(out_ref(a), in_ref(b)).unwrap();

        assert!(store.delete_node(a));
        assert!(store.node(a).is_none());
        assert!(store.edge(e).is_none());
        assert!(store.anchors(e).is_none());
        // The surviving endpoint's adjacency entry is clean but present.
        assert_eq!(store.edges_of(b).count(), 0);
        // Its input is free again.
        let a2 = store.add_node(None, source(0.0, 300.0)).unwrap();
        assert!(store.add_edge(out_ref(a2), in_ref(b)).is_ok());
    }

    #[test]
    fn deletes_are_idempotent() {
        let mut store = store();
        let a = store.add_node(None, source(0.0, 0.0)).unwrap();
        assert!(store.delete_node(a));
        assert!(!store.delete_node(a));
        assert!(!store.delete_edge(EdgeId::new(1)));
    }

    #[test]
    fn commit_rect_rekeys_the_quadtree() {
        let mut store = GraphStore::with_min_cell(BOUND, 50.0, SequentialIds::new());
        let a = store.add_node(None, source(10.0, 10.0)).unwrap();
        assert!(store.commit_rect(a, Rect::new(400.0, 400.0, 500.0, 450.0)));
        assert!(!store.nodes_in(Rect::new(0.0, 0.0, 120.0, 70.0)).contains(&a));
        assert!(
            store
                .nodes_in(Rect::new(390.0, 390.0, 510.0, 460.0))
                .contains(&a)
        );
        assert_eq!(store.spatial().len(), 1);
    }

    #[test]
    fn referential_invariant_survives_mixed_operations() {
        let mut store = store();
        let mut nodes = Vec::new();
        for i in 0..6 {
            let node = if i % 2 == 0 {
                source(f64::from(i) * 40.0, 0.0)
            } else {
                sink(f64::from(i) * 40.0, 200.0)
            };
            nodes.push(store.add_node(None, node).unwrap());
        }
        let _ = store.add_edge(out_ref(nodes[0]), in_ref(nodes[1]));
        let _ = store.add_edge(out_ref(nodes[2]), in_ref(nodes[3]));
        let _ = store.add_edge(out_ref(nodes[4]), in_ref(nodes[5]));
        store.delete_node(nodes[1]);
        store.delete_node(nodes[4]);

        for edge in store.document().edges.values() {
            let start = store.node(edge.start.node).expect("start node exists");
            let end = store.node(edge.end.node).expect("end node exists");
            assert!(start.outputs.iter().any(|p| p.name == edge.start.port));
            assert!(end.inputs.iter().any(|p| p.name == edge.end.port));
        }
        // Exactly one spatial entry per surviving node.
        let mut indexed = store.nodes_in(store.spatial().bound());
        indexed.sort_unstable();
        let mut live: Vec<NodeId> = store.document().nodes.keys().copied().collect();
        live.sort_unstable();
        assert_eq!(indexed, live);
    }

    #[test]
    fn from_document_round_trips() {
        let mut doc = Document::new();
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        doc.nodes.insert(a, source(0.0, 0.0));
        doc.nodes.insert(b, sink(0.0, 100.0));
        doc.edges.insert(
            EdgeId::new(1),
            Edge {
                start: Endpoint {
                    node: a,
                    port: "out".into(),
                },
                end: Endpoint {
                    node: b,
                    port: "in".into(),
                },
            },
        );

        let store = GraphStore::from_document(BOUND, SequentialIds::new(), doc).unwrap();
        assert_eq!(store.edges_of(a).count(), 1);
        assert_eq!(store.edges_of(b).count(), 1);
        assert_eq!(
            store.anchors(EdgeId::new(1)).unwrap().start,
            Point::new(50.0, 50.0)
        );
        assert_eq!(store.nodes_in(store.spatial().bound()).len(), 2);
    }

    #[test]
    fn from_document_rejects_missing_node() {
        let mut doc = Document::new();
        let a = NodeId::new(1);
        doc.nodes.insert(a, source(0.0, 0.0));
        doc.edges.insert(
            EdgeId::new(1),
            Edge {
                start: Endpoint {
                    node: a,
                    port: "out".into(),
                },
                end: Endpoint {
                    node: NodeId::new(9),
                    port: "in".into(),
                },
            },
        );
        let err = GraphStore::from_document(BOUND, SequentialIds::new(), doc).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingNode {
                edge: EdgeId::new(1),
                node: NodeId::new(9)
            }
        );
    }

    #[test]
    fn from_document_rejects_missing_port() {
        let mut doc = Document::new();
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        doc.nodes.insert(a, source(0.0, 0.0));
        doc.nodes.insert(b, sink(0.0, 100.0));
        doc.edges.insert(
            EdgeId::new(1),
            Edge {
                start: Endpoint {
                    node: a,
                    port: "nope".into(),
                },
                end: Endpoint {
                    node: b,
                    port: "in".into(),
                },
            },
        );
        let err = GraphStore::from_document(BOUND, SequentialIds::new(), doc).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPort { .. }));
    }

    #[test]
    fn from_document_rejects_duplicate_port_names() {
        let mut doc = Document::new();
        doc.nodes.insert(
            NodeId::new(1),
            Node::new(Rect::new(0.0, 0.0, 100.0, 50.0), "dup")
                .with_input("x", "t")
                .with_input("x", "t"),
        );
        let err = GraphStore::from_document(BOUND, SequentialIds::new(), doc).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicatePortName { .. }));
    }

    #[test]
    fn rejecting_policy_blocks_nodes() {
        struct NoNodes;
        impl Policy for NoNodes {
            fn next_node_id(&mut self) -> NodeId {
                NodeId::new(1)
            }
            fn next_edge_id(&mut self) -> EdgeId {
                EdgeId::new(1)
            }
            fn accept_node(&self, _node: &Node) -> Result<(), NodeRejection> {
                Err(NodeRejection::Rejected)
            }
        }
        let mut store = GraphStore::new(BOUND, NoNodes);
        assert_eq!(
            store.add_node(None, source(0.0, 0.0)),
            Err(NodeRejection::Rejected)
        );
        assert!(store.document().nodes.is_empty());
        assert!(store.spatial().is_empty());
    }
}
