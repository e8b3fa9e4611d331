// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transient move/resize/placement state and the draft rect arithmetic.
//!
//! While a gesture is in progress the canonical document is never touched:
//! every update rewrites the [`DraftLayout`](trellis_graph::DraftLayout)
//! override from the gesture's *anchor* and the nodes' *original* rects, so
//! a cancel simply discards the override and a confirm commits it. Offsets
//! are always cumulative from the anchor — there is no incremental drift.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Size, Vec2};
use trellis_graph::NodeId;

bitflags::bitflags! {
    /// Which edges of a node a resize handle drags.
    ///
    /// Compass handles are combinations: a corner drags two edges, a side
    /// midpoint drags one. `LEFT`/`RIGHT` and `TOP`/`BOTTOM` are mutually
    /// exclusive within a handle; the horizontal and vertical components act
    /// independently.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ResizeHandle: u8 {
        /// Drags the left edge.
        const LEFT   = 0b0000_0001;
        /// Drags the right edge.
        const RIGHT  = 0b0000_0010;
        /// Drags the top edge.
        const TOP    = 0b0000_0100;
        /// Drags the bottom edge.
        const BOTTOM = 0b0000_1000;
    }
}

/// The interaction state machine.
///
/// `origin` maps each affected node to its rect at gesture start; it is the
/// sole geometry source while the gesture runs.
#[derive(Clone, Debug, Default)]
pub enum Phase {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the selected nodes.
    Moving {
        /// World-space pointer position at gesture start.
        anchor: Point,
        /// Original rect per moved node.
        origin: HashMap<NodeId, Rect>,
    },
    /// Dragging a resize handle of the selected nodes.
    Resizing {
        /// The dragged handle.
        handle: ResizeHandle,
        /// World-space pointer position at gesture start.
        anchor: Point,
        /// Original rect per resized node.
        origin: HashMap<NodeId, Rect>,
    },
    /// Previewing a palette node before it is committed.
    Placing {
        /// The reserved temporary id the preview node lives under.
        temp: NodeId,
    },
}

impl Phase {
    /// `true` when no gesture is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The nodes affected by the current gesture.
    pub fn affected(&self) -> Vec<NodeId> {
        match self {
            Self::Idle => Vec::new(),
            Self::Moving { origin, .. } | Self::Resizing { origin, .. } => {
                origin.keys().copied().collect()
            }
            Self::Placing { temp } => [*temp].into(),
        }
    }
}

/// A moved rect: the original translated by the cumulative offset.
#[must_use]
pub fn moved_rect(origin: Rect, offset: Vec2) -> Rect {
    origin + offset
}

/// A resized rect under per-axis minimum-size clamping.
///
/// Dragging the left or top edge clamps the edge's inward motion so the size
/// never falls below the minimum — position is what gets limited. Dragging
/// the right or bottom edge clamps only the resulting size's lower bound and
/// never moves the rect.
#[must_use]
pub fn resized_rect(origin: Rect, handle: ResizeHandle, offset: Vec2, min: Size) -> Rect {
    let mut rect = origin;
    if handle.contains(ResizeHandle::LEFT) {
        rect.x0 = (origin.x0 + offset.x).min(origin.x1 - min.width);
    } else if handle.contains(ResizeHandle::RIGHT) {
        rect.x1 = (origin.x1 + offset.x).max(origin.x0 + min.width);
    }
    if handle.contains(ResizeHandle::TOP) {
        rect.y0 = (origin.y0 + offset.y).min(origin.y1 - min.height);
    } else if handle.contains(ResizeHandle::BOTTOM) {
        rect.y1 = (origin.y1 + offset.y).max(origin.y0 + min.height);
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Rect = Rect::new(100.0, 100.0, 200.0, 160.0);
    const MIN: Size = Size::new(40.0, 30.0);

    #[test]
    fn move_translates_without_resizing() {
        let moved = moved_rect(ORIGIN, Vec2::new(25.0, -15.0));
        assert_eq!(moved, Rect::new(125.0, 85.0, 225.0, 145.0));
        assert_eq!(moved.size(), ORIGIN.size());
    }

    #[test]
    fn right_edge_grows_freely_and_clamps_size_only() {
        let grown = resized_rect(ORIGIN, ResizeHandle::RIGHT, Vec2::new(50.0, 0.0), MIN);
        assert_eq!(grown, Rect::new(100.0, 100.0, 250.0, 160.0));
        // Shrinking past the minimum clamps width but not position.
        let shrunk = resized_rect(ORIGIN, ResizeHandle::RIGHT, Vec2::new(-90.0, 0.0), MIN);
        assert_eq!(shrunk, Rect::new(100.0, 100.0, 140.0, 160.0));
    }

    #[test]
    fn left_edge_clamps_position_at_minimum_width() {
        // Moving the left edge right past the limit stops at width = min.
        let shrunk = resized_rect(ORIGIN, ResizeHandle::LEFT, Vec2::new(90.0, 0.0), MIN);
        assert_eq!(shrunk, Rect::new(160.0, 100.0, 200.0, 160.0));
        // Moving it left grows freely.
        let grown = resized_rect(ORIGIN, ResizeHandle::LEFT, Vec2::new(-30.0, 0.0), MIN);
        assert_eq!(grown, Rect::new(70.0, 100.0, 200.0, 160.0));
    }

    #[test]
    fn corner_handles_act_per_axis() {
        let handle = ResizeHandle::LEFT | ResizeHandle::TOP;
        let rect = resized_rect(ORIGIN, handle, Vec2::new(500.0, 500.0), MIN);
        // Both axes clamp independently at their own minima.
        assert_eq!(rect.width(), MIN.width);
        assert_eq!(rect.height(), MIN.height);
        assert_eq!(rect.x1, ORIGIN.x1);
        assert_eq!(rect.y1, ORIGIN.y1);
    }

    #[test]
    fn side_midpoint_leaves_other_axis_alone() {
        let rect = resized_rect(ORIGIN, ResizeHandle::BOTTOM, Vec2::new(999.0, 20.0), MIN);
        assert_eq!(rect.x0, ORIGIN.x0);
        assert_eq!(rect.x1, ORIGIN.x1);
        assert_eq!(rect.y1, 180.0);
    }

    #[test]
    fn phase_reports_affected_nodes() {
        let mut origin = HashMap::new();
        origin.insert(NodeId::new(1), ORIGIN);
        let phase = Phase::Moving {
            anchor: Point::new(0.0, 0.0),
            origin,
        };
        assert_eq!(phase.affected(), [NodeId::new(1)]);
        assert!(Phase::Idle.affected().is_empty());
        assert!(Phase::Idle.is_idle());
    }
}
