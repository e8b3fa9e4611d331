// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The command surface tying store, culler, selection, interaction, and
//! history together.
//!
//! Every command completes all derived-state updates synchronously before
//! returning, so renderers never observe a half-updated engine. The only
//! deferred work is the culler's confirm pass, which the host drives by
//! pumping [`Engine::tick`] with its frame timestamps.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Size, Vec2};
use trellis_graph::{
    Document, DocumentError, DraftLayout, EdgeId, EdgeRejection, GraphState, GraphStore, Node,
    NodeId, NodeRejection, Policy, PortRef, SequentialIds,
};

use crate::camera::Camera;
use crate::culler::ViewportCuller;
use crate::history::History;
use crate::interact::{Phase, ResizeHandle, moved_rect, resized_rect};
use crate::selection::SelectionState;

/// Construction-time knobs for an [`Engine`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Initial quadtree root bound; grows as content spills past it.
    pub bound: Rect,
    /// Quadtree resolution floor (see [`trellis_quadtree::DEFAULT_MIN_CELL`]).
    pub min_cell: f64,
    /// Margin (world units) added around the view for the confirm pass.
    pub cull_margin: f64,
    /// Quiet period (ms) before a confirm pass runs.
    pub confirm_delay_ms: u64,
    /// Minimum node size enforced by resize clamping.
    pub min_node_size: Size,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bound: Rect::new(0.0, 0.0, 1200.0, 800.0),
            min_cell: trellis_quadtree::DEFAULT_MIN_CELL,
            cull_margin: 120.0,
            confirm_delay_ms: 300,
            min_node_size: Size::new(40.0, 30.0),
        }
    }
}

/// One renderable node in a published [`Frame`].
#[derive(Clone, Debug, PartialEq)]
pub struct NodeView {
    /// The node.
    pub id: NodeId,
    /// Resolved geometry: the draft override when one is in effect, else
    /// canonical.
    pub rect: Rect,
    /// In the selected set.
    pub selected: bool,
    /// Cross-highlighted and not selected (selected takes draw precedence).
    pub highlighted: bool,
    /// Currently hovered.
    pub hovered: bool,
    /// In the newly-visible sequence (drives entry animation).
    pub entering: bool,
}

/// One renderable edge in a published [`Frame`].
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeView {
    /// The edge.
    pub id: EdgeId,
    /// Cached start (output-port) anchor, draft-aware during gestures.
    pub start: Point,
    /// Cached end (input-port) anchor, draft-aware during gestures.
    pub end: Point,
    /// In the selected set.
    pub selected: bool,
    /// Cross-highlighted and not selected.
    pub highlighted: bool,
    /// Newly visible.
    pub entering: bool,
}

/// The published render snapshot.
///
/// Confirmed-visible entries come first in id order, then newly-visible
/// entries in the order they entered. Entities with no visible presence are
/// absent entirely — an edge with both endpoints out of view never appears.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Renderable nodes.
    pub nodes: Vec<NodeView>,
    /// Renderable edges.
    pub edges: Vec<EdgeView>,
    /// The newly-visible node sequence, in entry order.
    pub entering_nodes: Vec<NodeId>,
    /// Hovered node, if any.
    pub hovered: Option<NodeId>,
    /// Source port of an in-flight connection gesture.
    pub active_port: Option<PortRef>,
    /// Candidate destination port of an in-flight connection gesture.
    pub target_port: Option<PortRef>,
}

/// The spatial-indexed graph state engine.
///
/// Owns the [`GraphStore`] and every piece of per-frame state derived from
/// it. Hosts feed it pointer/viewport commands in screen coordinates and
/// render from [`Engine::frame`]; geometry crosses into world space through
/// the engine's own camera.
#[derive(Clone)]
pub struct Engine<P: Policy = SequentialIds> {
    store: GraphStore<P>,
    camera: Camera,
    /// Screen-space viewport rect, as the host reports it.
    view: Rect,
    culler: ViewportCuller,
    selection: SelectionState,
    phase: Phase,
    draft: DraftLayout,
    history: History<GraphState>,
    min_node_size: Size,
}

impl<P: Policy> core::fmt::Debug for Engine<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store)
            .field("view", &self.view)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<P: Policy> Engine<P> {
    /// Create an engine over an empty document.
    pub fn new(config: EngineConfig, policy: P) -> Self {
        let store = GraphStore::with_min_cell(config.bound, config.min_cell, policy);
        let history = History::new(store.snapshot());
        Self {
            store,
            camera: Camera::new(),
            view: Rect::ZERO,
            culler: ViewportCuller::new(config.cull_margin, config.confirm_delay_ms),
            selection: SelectionState::new(),
            phase: Phase::Idle,
            draft: DraftLayout::new(),
            history,
            min_node_size: config.min_node_size,
        }
    }

    /// Create an engine over an existing document.
    ///
    /// The document is validated up front; a malformed one fails construction
    /// with a [`DocumentError`] and no partial state. Loaded entities start
    /// visible, the way freshly added ones do; the first confirm pass
    /// replaces that with the exact viewport query.
    pub fn from_document(
        config: EngineConfig,
        policy: P,
        doc: Document,
    ) -> Result<Self, DocumentError> {
        let store =
            GraphStore::from_document_with_min_cell(config.bound, config.min_cell, policy, doc)?;
        let mut culler = ViewportCuller::new(config.cull_margin, config.confirm_delay_ms);
        for &id in store.document().nodes.keys() {
            culler.mark_node_visible(id);
        }
        for &id in store.document().edges.keys() {
            culler.mark_edge_visible(id);
        }
        let history = History::new(store.snapshot());
        Ok(Self {
            store,
            camera: Camera::new(),
            view: Rect::ZERO,
            culler,
            selection: SelectionState::new(),
            phase: Phase::Idle,
            draft: DraftLayout::new(),
            history,
            min_node_size: config.min_node_size,
        })
    }

    /// The underlying store (read-only; mutate through commands).
    pub fn store(&self) -> &GraphStore<P> {
        &self.store
    }

    /// The camera (read-only; mutate through viewport commands).
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Selection and highlight state.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Visibility state.
    pub fn culler(&self) -> &ViewportCuller {
        &self.culler
    }

    /// The interaction state machine's current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The draft layout override (empty outside gestures).
    pub fn draft(&self) -> &DraftLayout {
        &self.draft
    }

    /// `true` when an undo target exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// `true` when a redo target exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Viewport -------------------------------------------------------

    /// Set the screen-space viewport rect.
    pub fn set_view_rect(&mut self, rect: Rect, now_ms: u64) {
        self.view = rect;
        self.sync_culler(now_ms);
    }

    /// Set the camera offset outright.
    pub fn set_offset(&mut self, offset: Vec2, now_ms: u64) {
        self.camera.set_offset(offset);
        self.sync_culler(now_ms);
    }

    /// Set the camera scale outright.
    pub fn set_scale(&mut self, scale: f64, now_ms: u64) {
        self.camera.set_scale(scale);
        self.sync_culler(now_ms);
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2, now_ms: u64) {
        self.camera.pan_by(delta);
        self.sync_culler(now_ms);
    }

    /// Zoom by `factor` around a screen-space anchor.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64, now_ms: u64) {
        self.camera.zoom_about(anchor, factor);
        self.sync_culler(now_ms);
    }

    /// Pump the debounced confirm pass. Returns `true` when one ran.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        self.culler.tick(&self.store, now_ms)
    }

    fn sync_culler(&mut self, now_ms: u64) {
        if self.view.width() <= 0.0 || self.view.height() <= 0.0 {
            return;
        }
        let world = self.camera.screen_to_world_rect(self.view);
        self.culler.set_view(&self.store, world, now_ms);
    }

    // --- Selection ------------------------------------------------------

    /// Add a node to the selection.
    pub fn select_node(&mut self, id: NodeId) {
        self.selection.select_node(&self.store, id);
    }

    /// Remove a node from the selection.
    pub fn deselect_node(&mut self, id: NodeId) {
        self.selection.deselect_node(&self.store, id);
    }

    /// Toggle a node's selection membership.
    pub fn toggle_node(&mut self, id: NodeId) {
        self.selection.toggle_node(&self.store, id);
    }

    /// Replace the node selection with a batch.
    pub fn replace_node_selection(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection.replace_nodes(&self.store, ids);
    }

    /// Add an edge to the selection.
    pub fn select_edge(&mut self, id: EdgeId) {
        self.selection.select_edge(&self.store, id);
    }

    /// Remove an edge from the selection.
    pub fn deselect_edge(&mut self, id: EdgeId) {
        self.selection.deselect_edge(&self.store, id);
    }

    /// Toggle an edge's selection membership.
    pub fn toggle_edge(&mut self, id: EdgeId) {
        self.selection.toggle_edge(&self.store, id);
    }

    /// Replace the edge selection with a batch.
    pub fn replace_edge_selection(&mut self, ids: impl IntoIterator<Item = EdgeId>) {
        self.selection.replace_edges(&self.store, ids);
    }

    /// Clear all selection and highlight state.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Set or clear the hovered node.
    pub fn hover(&mut self, id: Option<NodeId>) {
        self.selection.hover(&self.store, id);
    }

    /// Begin or end a connection gesture from a port.
    pub fn set_active_port(&mut self, port: Option<PortRef>) {
        self.selection.set_active_port(port);
    }

    /// Update the candidate destination of a connection gesture.
    pub fn set_target_port(&mut self, port: Option<PortRef>) {
        self.selection.set_target_port(port);
    }

    /// Box selection over a screen-space drag rect; re-run per drag frame.
    pub fn box_select(&mut self, screen_rect: Rect) {
        self.selection
            .box_select(&self.store, &self.camera, screen_rect);
    }

    // --- Move / resize --------------------------------------------------

    /// Begin moving the selected nodes from a screen-space pointer anchor.
    ///
    /// Hosts call this on pointer-down over a selected node (selecting it
    /// first when needed). Returns `false` when a gesture is already in
    /// progress or nothing is selected.
    pub fn start_move(&mut self, anchor: Point) -> bool {
        if !self.phase.is_idle() {
            return false;
        }
        let origin: HashMap<NodeId, Rect> = self
            .selection
            .nodes()
            .iter()
            .filter_map(|&id| self.store.node(id).map(|n| (id, n.rect)))
            .collect();
        if origin.is_empty() {
            return false;
        }
        self.phase = Phase::Moving {
            anchor: self.camera.screen_to_world_point(anchor),
            origin,
        };
        true
    }

    /// Update an in-progress move with the current pointer position.
    ///
    /// Writes `origin + cumulative offset` into the draft override and
    /// refreshes edge-anchor previews; canonical geometry stays untouched.
    pub fn update_move(&mut self, pointer: Point) {
        let Phase::Moving { anchor, origin } = &self.phase else {
            return;
        };
        let offset = self.camera.screen_to_world_point(pointer) - *anchor;
        let moved: Vec<(NodeId, Rect)> = origin
            .iter()
            .map(|(&id, &rect)| (id, moved_rect(rect, offset)))
            .collect();
        self.apply_draft(moved);
    }

    /// Finish a move: commit the draft into canonical geometry (and
    /// history), or discard it.
    pub fn stop_move(&mut self, commit: bool) {
        match core::mem::take(&mut self.phase) {
            Phase::Moving { origin, .. } => self.finish_rect_gesture(origin, commit),
            other => self.phase = other,
        }
    }

    /// Begin resizing the selected nodes by `handle` from a screen anchor.
    ///
    /// Returns `false` when a gesture is already in progress, the handle is
    /// empty, or nothing is selected.
    pub fn start_resize(&mut self, handle: ResizeHandle, anchor: Point) -> bool {
        if !self.phase.is_idle() || handle.is_empty() {
            return false;
        }
        let origin: HashMap<NodeId, Rect> = self
            .selection
            .nodes()
            .iter()
            .filter_map(|&id| self.store.node(id).map(|n| (id, n.rect)))
            .collect();
        if origin.is_empty() {
            return false;
        }
        self.phase = Phase::Resizing {
            handle,
            anchor: self.camera.screen_to_world_point(anchor),
            origin,
        };
        true
    }

    /// Update an in-progress resize with the current pointer position.
    pub fn update_resize(&mut self, pointer: Point) {
        let Phase::Resizing {
            handle,
            anchor,
            origin,
        } = &self.phase
        else {
            return;
        };
        let offset = self.camera.screen_to_world_point(pointer) - *anchor;
        let min = self.min_node_size;
        let handle = *handle;
        let resized: Vec<(NodeId, Rect)> = origin
            .iter()
            .map(|(&id, &rect)| (id, resized_rect(rect, handle, offset, min)))
            .collect();
        self.apply_draft(resized);
    }

    /// Finish a resize: commit or discard, like [`Engine::stop_move`].
    pub fn stop_resize(&mut self, commit: bool) {
        match core::mem::take(&mut self.phase) {
            Phase::Resizing { origin, .. } => self.finish_rect_gesture(origin, commit),
            other => self.phase = other,
        }
    }

    fn apply_draft(&mut self, rects: Vec<(NodeId, Rect)>) {
        for &(id, rect) in &rects {
            self.draft.set(id, rect);
        }
        for (id, _) in rects {
            self.store.refresh_edge_anchors(id, Some(&self.draft));
        }
    }

    fn finish_rect_gesture(&mut self, origin: HashMap<NodeId, Rect>, commit: bool) {
        if commit && !self.draft.is_empty() {
            for (&id, &orig) in &origin {
                let rect = self.draft.rect_of(id).unwrap_or(orig);
                self.store.commit_rect(id, rect);
            }
            self.draft.clear();
            self.commit_history();
        } else {
            // Cancel (or a commit with no updates): the override is discarded
            // unmodified and previews return to canonical geometry.
            self.draft.clear();
            for &id in origin.keys() {
                self.store.refresh_edge_anchors(id, None);
            }
        }
    }

    // --- Structure ------------------------------------------------------

    /// Add a node (caller-supplied or generated id); commits history and
    /// marks it visible.
    pub fn add_node(&mut self, id: Option<NodeId>, node: Node) -> Result<NodeId, NodeRejection> {
        let id = self.store.add_node(id, node)?;
        self.culler.mark_node_visible(id);
        self.commit_history();
        Ok(id)
    }

    /// Delete a node (cascading over its edges); commits history. Unknown
    /// ids are a no-op returning `false`.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let incident: Vec<EdgeId> = self.store.edges_of(id).collect();
        if !self.store.delete_node(id) {
            return false;
        }
        self.selection.forget_node(id);
        self.culler.forget_node(id);
        for edge in incident {
            self.selection.forget_edge(edge);
            self.culler.forget_edge(edge);
        }
        self.selection.recompute(&self.store);
        self.commit_history();
        true
    }

    /// Connect two ports (either argument order); commits history on
    /// success. The new edge is visible right away when an endpoint is.
    pub fn add_edge(&mut self, a: PortRef, b: PortRef) -> Result<EdgeId, EdgeRejection> {
        let id = self.store.add_edge(a, b)?;
        let endpoint_seen = self.store.edge(id).is_some_and(|edge| {
            self.culler.sees_node(edge.start.node) || self.culler.sees_node(edge.end.node)
        });
        if endpoint_seen {
            self.culler.mark_edge_visible(id);
        }
        // A selected endpoint cross-highlights the new edge immediately.
        self.selection.recompute(&self.store);
        self.commit_history();
        Ok(id)
    }

    /// Delete an edge; commits history. Unknown ids are a no-op returning
    /// `false`.
    pub fn delete_edge(&mut self, id: EdgeId) -> bool {
        if !self.store.delete_edge(id) {
            return false;
        }
        self.selection.forget_edge(id);
        self.culler.forget_edge(id);
        self.selection.recompute(&self.store);
        self.commit_history();
        true
    }

    // --- Draft placement ------------------------------------------------

    /// Begin placing `template` as a draft node under [`NodeId::DRAFT`].
    ///
    /// The synthetic node enters the store immediately so it renders and
    /// previews like any node, but nothing is committed to history until
    /// [`Engine::stop_placement`] confirms it. Rejected when a gesture is
    /// already in progress.
    pub fn start_placement(&mut self, template: Node) -> Result<NodeId, NodeRejection> {
        if !self.phase.is_idle() {
            return Err(NodeRejection::Rejected);
        }
        let id = self.store.add_node(Some(NodeId::DRAFT), template)?;
        self.culler.mark_node_visible(id);
        self.phase = Phase::Placing { temp: id };
        Ok(id)
    }

    /// Move the draft node so its center tracks the pointer.
    pub fn update_placement(&mut self, pointer: Point) {
        let Phase::Placing { temp } = &self.phase else {
            return;
        };
        let temp = *temp;
        let Some(node) = self.store.node(temp) else {
            return;
        };
        let size = node.rect.size();
        let center = self.camera.screen_to_world_point(pointer);
        self.draft.set(temp, Rect::from_center_size(center, size));
        self.store.refresh_edge_anchors(temp, Some(&self.draft));
    }

    /// Finish a placement.
    ///
    /// On confirm the draft node is re-inserted at its final rect under a
    /// generated permanent id (one history commit) and the temporary node is
    /// deleted; on cancel it is simply deleted. Returns the permanent id on
    /// confirm.
    pub fn stop_placement(&mut self, commit: bool) -> Option<NodeId> {
        match core::mem::take(&mut self.phase) {
            Phase::Placing { temp } => {
                let final_rect = self.draft.rect_of(temp);
                self.draft.clear();
                let template = self.store.node(temp).cloned();
                let incident: Vec<EdgeId> = self.store.edges_of(temp).collect();
                self.store.delete_node(temp);
                self.culler.forget_node(temp);
                self.selection.forget_node(temp);
                for edge in incident {
                    self.selection.forget_edge(edge);
                    self.culler.forget_edge(edge);
                }
                self.selection.recompute(&self.store);
                if !commit {
                    return None;
                }
                let mut node = template?;
                if let Some(rect) = final_rect {
                    node.rect = rect;
                }
                match self.store.add_node(None, node) {
                    Ok(id) => {
                        self.culler.mark_node_visible(id);
                        self.commit_history();
                        Some(id)
                    }
                    Err(_) => None,
                }
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    // --- History --------------------------------------------------------

    /// Step back one committed mutation. Returns `false` on an empty past.
    pub fn undo(&mut self) -> bool {
        let Some(state) = self.history.undo() else {
            return false;
        };
        let state = state.clone();
        self.store.restore(state);
        self.after_history_jump();
        true
    }

    /// Step forward one undone mutation. Returns `false` on an empty future.
    pub fn redo(&mut self) -> bool {
        let Some(state) = self.history.redo() else {
            return false;
        };
        let state = state.clone();
        self.store.restore(state);
        self.after_history_jump();
        true
    }

    fn after_history_jump(&mut self) {
        // The whole graph state was swapped underneath the transient layers:
        // abandon any gesture and drop references to ids that no longer
        // exist.
        self.phase = Phase::Idle;
        self.draft.clear();
        self.selection.prune(&self.store);
        self.culler.prune(&self.store);
    }

    fn commit_history(&mut self) {
        self.history.commit(self.store.snapshot());
    }

    // --- Published output -----------------------------------------------

    /// Build the render snapshot for the current state.
    pub fn frame(&self) -> Frame {
        let mut node_ids: Vec<NodeId> = self.culler.visible_nodes().iter().copied().collect();
        node_ids.sort_unstable();
        for &id in self.culler.entering_nodes() {
            if !self.culler.visible_nodes().contains(&id) {
                node_ids.push(id);
            }
        }
        let nodes: Vec<NodeView> = node_ids
            .iter()
            .filter_map(|&id| {
                let node = self.store.node(id)?;
                let selected = self.selection.nodes().contains(&id);
                Some(NodeView {
                    id,
                    rect: self.draft.rect_of(id).unwrap_or(node.rect),
                    selected,
                    highlighted: !selected && self.selection.highlighted_nodes().contains(&id),
                    hovered: self.selection.hovered() == Some(id),
                    entering: !self.culler.visible_nodes().contains(&id),
                })
            })
            .collect();

        let mut edge_ids: Vec<EdgeId> = self.culler.visible_edges().iter().copied().collect();
        edge_ids.sort_unstable();
        let mut entering_edge_ids: Vec<EdgeId> =
            self.culler.entering_edges().iter().copied().collect();
        entering_edge_ids.sort_unstable();
        for id in entering_edge_ids {
            if !self.culler.visible_edges().contains(&id) {
                edge_ids.push(id);
            }
        }
        let edges: Vec<EdgeView> = edge_ids
            .iter()
            .filter_map(|&id| {
                let anchors = self.store.anchors(id)?;
                let selected = self.selection.edges().contains(&id);
                Some(EdgeView {
                    id,
                    start: anchors.start,
                    end: anchors.end,
                    selected,
                    highlighted: !selected && self.selection.highlighted_edges().contains(&id),
                    entering: !self.culler.visible_edges().contains(&id),
                })
            })
            .collect();

        Frame {
            nodes,
            edges,
            entering_nodes: self.culler.entering_nodes().to_vec(),
            hovered: self.selection.hovered(),
            active_port: self.selection.active_port(),
            target_port: self.selection.target_port(),
        }
    }
}
