// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-phase viewport culling: immediate entry detection, debounced confirm.
//!
//! Panning fires a spatial query per frame, but replacing the confirmed
//! visible set that often would churn the render set and retrigger entry
//! animations. The culler therefore splits the work:
//!
//! 1. **Immediate pass** on every view change: when the view leaves the last
//!    fully-resolved region, query the raw view rect and publish only the
//!    ids not already confirmed as an ordered *newly-visible* sequence. The
//!    resolved region is untouched.
//! 2. **Confirm pass** after a quiet period: query the view expanded by a
//!    margin, replace the confirmed set with exactly that result, clear the
//!    newly-visible sequence, and cache the expanded rect. A superseding
//!    view change reschedules the pending confirm instead of running both.
//!
//! There is no ambient clock: callers stamp view changes with a millisecond
//! timestamp and pump [`ViewportCuller::tick`].
//!
//! Edge visibility is always derived, never indexed: an edge is (newly-)
//! visible iff at least one endpoint node is; an edge with both endpoints
//! out of view is excluded from the render set entirely.

use alloc::vec::Vec;

use hashbrown::HashSet;
use kurbo::Rect;
use trellis_graph::{EdgeId, GraphStore, NodeId, Policy};

/// Confirmed and entering visibility sets for a world-space view rect.
#[derive(Clone, Debug)]
pub struct ViewportCuller {
    view: Rect,
    /// Last fully-resolved (margin-expanded) region, once a confirm ran.
    resolved: Option<Rect>,
    visible_nodes: HashSet<NodeId>,
    visible_edges: HashSet<EdgeId>,
    /// Ordered just-entered sequence; drives entry animation.
    entering_nodes: Vec<NodeId>,
    entering_edges: HashSet<EdgeId>,
    /// Deadline (ms) of the pending confirm pass, if one is scheduled.
    pending: Option<u64>,
    margin: f64,
    delay_ms: u64,
}

impl ViewportCuller {
    /// Create a culler with the given confirm margin (world units) and quiet
    /// period (milliseconds).
    #[must_use]
    pub fn new(margin: f64, delay_ms: u64) -> Self {
        Self {
            view: Rect::ZERO,
            resolved: None,
            visible_nodes: HashSet::new(),
            visible_edges: HashSet::new(),
            entering_nodes: Vec::new(),
            entering_edges: HashSet::new(),
            pending: None,
            margin,
            delay_ms,
        }
    }

    /// Current world-space view rect.
    #[must_use]
    pub fn view(&self) -> Rect {
        self.view
    }

    /// The cached margin-expanded region of the last confirm pass.
    #[must_use]
    pub fn resolved(&self) -> Option<Rect> {
        self.resolved
    }

    /// Confirmed-visible nodes.
    #[must_use]
    pub fn visible_nodes(&self) -> &HashSet<NodeId> {
        &self.visible_nodes
    }

    /// Confirmed-visible edges.
    #[must_use]
    pub fn visible_edges(&self) -> &HashSet<EdgeId> {
        &self.visible_edges
    }

    /// Newly-visible nodes in the order they entered.
    #[must_use]
    pub fn entering_nodes(&self) -> &[NodeId] {
        &self.entering_nodes
    }

    /// Newly-visible edges (derived from entering endpoints).
    #[must_use]
    pub fn entering_edges(&self) -> &HashSet<EdgeId> {
        &self.entering_edges
    }

    /// Whether `node` is in the confirmed or entering set.
    #[must_use]
    pub fn sees_node(&self, node: NodeId) -> bool {
        self.visible_nodes.contains(&node) || self.entering_nodes.contains(&node)
    }

    /// Whether `edge` is in the confirmed or entering set.
    #[must_use]
    pub fn sees_edge(&self, edge: EdgeId) -> bool {
        self.visible_edges.contains(&edge) || self.entering_edges.contains(&edge)
    }

    /// Apply a view change at `now_ms`: run the immediate pass and
    /// (re)schedule the confirm pass, superseding any pending one.
    pub fn set_view<P: Policy>(&mut self, store: &GraphStore<P>, view: Rect, now_ms: u64) {
        self.view = view;
        let covered_by_cache = self.resolved.is_some_and(|r| contains(r, view));
        if !covered_by_cache {
            for id in store.nodes_in(view) {
                if self.visible_nodes.contains(&id) || self.entering_nodes.contains(&id) {
                    continue;
                }
                self.entering_nodes.push(id);
                for edge in store.edges_of(id) {
                    if !self.visible_edges.contains(&edge) {
                        self.entering_edges.insert(edge);
                    }
                }
            }
        }
        self.pending = Some(now_ms + self.delay_ms);
    }

    /// Run the confirm pass if its quiet period has elapsed. Returns `true`
    /// when a confirm ran.
    pub fn tick<P: Policy>(&mut self, store: &GraphStore<P>, now_ms: u64) -> bool {
        if self.pending.is_some_and(|deadline| now_ms >= deadline) {
            self.confirm(store);
            true
        } else {
            false
        }
    }

    /// Run the confirm pass now: the visible node set becomes exactly the
    /// spatial query over the margin-expanded view.
    pub fn confirm<P: Policy>(&mut self, store: &GraphStore<P>) {
        let expanded = self.view.inflate(self.margin, self.margin);
        self.visible_nodes = store.nodes_in(expanded).into_iter().collect();
        self.visible_edges = self
            .visible_nodes
            .iter()
            .flat_map(|&id| store.edges_of(id))
            .collect();
        self.entering_nodes.clear();
        self.entering_edges.clear();
        self.resolved = Some(expanded);
        self.pending = None;
    }

    /// A freshly added node is visible at once.
    pub fn mark_node_visible(&mut self, node: NodeId) {
        self.visible_nodes.insert(node);
    }

    /// A freshly added edge with a visible endpoint is visible at once.
    pub fn mark_edge_visible(&mut self, edge: EdgeId) {
        self.visible_edges.insert(edge);
    }

    /// Drop every reference to a deleted node.
    pub fn forget_node(&mut self, node: NodeId) {
        self.visible_nodes.remove(&node);
        self.entering_nodes.retain(|&id| id != node);
    }

    /// Drop every reference to a deleted edge.
    pub fn forget_edge(&mut self, edge: EdgeId) {
        self.visible_edges.remove(&edge);
        self.entering_edges.remove(&edge);
    }

    /// Drop references to ids no longer in the document (after undo/redo
    /// swapped the whole graph state underneath).
    pub fn prune<P: Policy>(&mut self, store: &GraphStore<P>) {
        self.visible_nodes.retain(|&id| store.node(id).is_some());
        self.entering_nodes.retain(|&id| store.node(id).is_some());
        self.visible_edges.retain(|&id| store.edge(id).is_some());
        self.entering_edges.retain(|&id| store.edge(id).is_some());
    }
}

/// Closed containment: `inner` fully inside `outer`.
fn contains(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && inner.x1 <= outer.x1 && outer.y0 <= inner.y0 && inner.y1 <= outer.y1
}
