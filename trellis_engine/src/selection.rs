// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection, hover, and cross-highlight state.
//!
//! Selection and highlight are separate sets: selecting nodes highlights
//! their incident edges, selecting edges highlights their endpoint nodes.
//! Highlights are always *recomputed* from the selection and the store's
//! adjacency maps — they are derived state and never edited directly.
//! Renderers give selected state draw precedence over highlighted when both
//! apply to one id (the published frame already excludes selected ids from
//! the highlight lists).
//!
//! All operations are idempotent no-ops on unknown ids: a click racing a
//! UI-driven delete is harmless.

use alloc::vec::Vec;

use hashbrown::HashSet;
use kurbo::Rect;
use trellis_graph::{EdgeId, GraphStore, NodeId, Policy, PortRef};

use crate::camera::Camera;

/// Selected/highlighted/hovered ids plus the ports of an in-flight
/// connection gesture.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    nodes: HashSet<NodeId>,
    edges: HashSet<EdgeId>,
    highlighted_nodes: HashSet<NodeId>,
    highlighted_edges: HashSet<EdgeId>,
    hovered: Option<NodeId>,
    active_port: Option<PortRef>,
    target_port: Option<PortRef>,
}

impl SelectionState {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected node ids.
    #[must_use]
    pub fn nodes(&self) -> &HashSet<NodeId> {
        &self.nodes
    }

    /// Selected edge ids.
    #[must_use]
    pub fn edges(&self) -> &HashSet<EdgeId> {
        &self.edges
    }

    /// Nodes highlighted because a selected edge touches them.
    #[must_use]
    pub fn highlighted_nodes(&self) -> &HashSet<NodeId> {
        &self.highlighted_nodes
    }

    /// Edges highlighted because a selected node touches them.
    #[must_use]
    pub fn highlighted_edges(&self) -> &HashSet<EdgeId> {
        &self.highlighted_edges
    }

    /// The hovered node, if any.
    #[must_use]
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Source port of an in-flight connection gesture.
    #[must_use]
    pub fn active_port(&self) -> Option<PortRef> {
        self.active_port
    }

    /// Candidate destination port of an in-flight connection gesture.
    #[must_use]
    pub fn target_port(&self) -> Option<PortRef> {
        self.target_port
    }

    /// Add one node to the selection.
    pub fn select_node<P: Policy>(&mut self, store: &GraphStore<P>, id: NodeId) {
        if store.node(id).is_some() && self.nodes.insert(id) {
            self.recompute(store);
        }
    }

    /// Remove one node from the selection.
    pub fn deselect_node<P: Policy>(&mut self, store: &GraphStore<P>, id: NodeId) {
        if self.nodes.remove(&id) {
            self.recompute(store);
        }
    }

    /// Toggle one node's membership.
    pub fn toggle_node<P: Policy>(&mut self, store: &GraphStore<P>, id: NodeId) {
        if self.nodes.contains(&id) {
            self.deselect_node(store, id);
        } else {
            self.select_node(store, id);
        }
    }

    /// Replace the node selection with a batch (unknown ids are dropped).
    pub fn replace_nodes<P: Policy>(
        &mut self,
        store: &GraphStore<P>,
        ids: impl IntoIterator<Item = NodeId>,
    ) {
        self.nodes = ids
            .into_iter()
            .filter(|&id| store.node(id).is_some())
            .collect();
        self.recompute(store);
    }

    /// Add one edge to the selection.
    pub fn select_edge<P: Policy>(&mut self, store: &GraphStore<P>, id: EdgeId) {
        if store.edge(id).is_some() && self.edges.insert(id) {
            self.recompute(store);
        }
    }

    /// Remove one edge from the selection.
    pub fn deselect_edge<P: Policy>(&mut self, store: &GraphStore<P>, id: EdgeId) {
        if self.edges.remove(&id) {
            self.recompute(store);
        }
    }

    /// Toggle one edge's membership.
    pub fn toggle_edge<P: Policy>(&mut self, store: &GraphStore<P>, id: EdgeId) {
        if self.edges.contains(&id) {
            self.deselect_edge(store, id);
        } else {
            self.select_edge(store, id);
        }
    }

    /// Replace the edge selection with a batch (unknown ids are dropped).
    pub fn replace_edges<P: Policy>(
        &mut self,
        store: &GraphStore<P>,
        ids: impl IntoIterator<Item = EdgeId>,
    ) {
        self.edges = ids
            .into_iter()
            .filter(|&id| store.edge(id).is_some())
            .collect();
        self.recompute(store);
    }

    /// Clear selections, highlights, and the connection gesture ports.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.highlighted_nodes.clear();
        self.highlighted_edges.clear();
        self.active_port = None;
        self.target_port = None;
    }

    /// Set or clear the hovered node. Unknown ids are a no-op.
    pub fn hover<P: Policy>(&mut self, store: &GraphStore<P>, id: Option<NodeId>) {
        match id {
            Some(id) if store.node(id).is_none() => {}
            other => self.hovered = other,
        }
    }

    /// Begin a connection gesture from `port`.
    pub fn set_active_port(&mut self, port: Option<PortRef>) {
        self.active_port = port;
    }

    /// Update the candidate destination of a connection gesture.
    pub fn set_target_port(&mut self, port: Option<PortRef>) {
        self.target_port = port;
    }

    /// Box selection: screen drag rect → world rect → coarse spatial filter
    /// → precise rect check → replace the node selection.
    ///
    /// The quadtree may over-approximate at coarse resolutions, so every
    /// candidate is re-checked against its canonical rectangle before it is
    /// committed. Intended to run on every drag-move frame.
    pub fn box_select<P: Policy>(
        &mut self,
        store: &GraphStore<P>,
        camera: &Camera,
        screen_rect: Rect,
    ) {
        let world = camera.screen_to_world_rect(screen_rect);
        let hits: Vec<NodeId> = store
            .nodes_in(world)
            .into_iter()
            .filter(|&id| {
                store
                    .node(id)
                    .is_some_and(|node| overlaps(node.rect, world))
            })
            .collect();
        self.replace_nodes(store, hits);
    }

    /// Drop every reference to a deleted node.
    ///
    /// Callers re-run [`SelectionState::recompute`] once the store has
    /// settled (a cascade may delete several entities in one operation).
    pub fn forget_node(&mut self, id: NodeId) {
        self.nodes.remove(&id);
        self.highlighted_nodes.remove(&id);
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.active_port.is_some_and(|p| p.node == id) {
            self.active_port = None;
        }
        if self.target_port.is_some_and(|p| p.node == id) {
            self.target_port = None;
        }
    }

    /// Drop every reference to a deleted edge.
    pub fn forget_edge(&mut self, id: EdgeId) {
        self.edges.remove(&id);
        self.highlighted_edges.remove(&id);
    }

    /// Drop references to ids no longer in the document and rebuild
    /// highlights (after undo/redo swapped the graph state underneath).
    pub fn prune<P: Policy>(&mut self, store: &GraphStore<P>) {
        self.nodes.retain(|&id| store.node(id).is_some());
        self.edges.retain(|&id| store.edge(id).is_some());
        if self.hovered.is_some_and(|id| store.node(id).is_none()) {
            self.hovered = None;
        }
        if self
            .active_port
            .is_some_and(|p| store.node(p.node).is_none())
        {
            self.active_port = None;
        }
        if self
            .target_port
            .is_some_and(|p| store.node(p.node).is_none())
        {
            self.target_port = None;
        }
        self.recompute(store);
    }

    /// Rebuild both highlight sets from the current selection.
    ///
    /// Selected nodes highlight the union of their incident edges; selected
    /// edges highlight the union of their endpoints.
    pub fn recompute<P: Policy>(&mut self, store: &GraphStore<P>) {
        self.highlighted_edges = self
            .nodes
            .iter()
            .flat_map(|&id| store.edges_of(id))
            .collect();
        self.highlighted_nodes = self
            .edges
            .iter()
            .filter_map(|id| store.edge(*id))
            .flat_map(|edge| [edge.start.node, edge.end.node])
            .collect();
    }
}

/// Closed-interval rect overlap (touching counts).
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
