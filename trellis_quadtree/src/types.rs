// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expansion directions, quadrant addressing, and rect predicates.

use kurbo::{Point, Rect};

/// Direction in which [`QuadTree::expand`](crate::QuadTree::expand) doubles
/// the root bound. Each expansion doubles one axis; the old root is
/// reparented into the half away from the direction of growth.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Grow toward smaller x (the right edge stays anchored).
    Left,
    /// Grow toward larger x (the left edge stays anchored).
    Right,
    /// Grow toward smaller y (the bottom edge stays anchored).
    Up,
    /// Grow toward larger y (the top edge stays anchored).
    Down,
}

/// Child slot within a cell: left/right × top/bottom about the center.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Quadrant {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Quadrant {
    pub(crate) const fn slot(self) -> usize {
        self as usize
    }

    /// Quadrant owning `at` within a cell of the given bound, by comparing
    /// against the center. Ties resolve toward the right/bottom, matching the
    /// half-open ownership used for descent.
    pub(crate) fn for_point(bound: Rect, at: Point) -> Self {
        let c = bound.center();
        match (at.x < c.x, at.y < c.y) {
            (true, true) => Self::TopLeft,
            (false, true) => Self::TopRight,
            (true, false) => Self::BottomLeft,
            (false, false) => Self::BottomRight,
        }
    }

    /// The half-size sub-rectangle this quadrant occupies within `bound`.
    pub(crate) fn sub_rect(self, bound: Rect) -> Rect {
        let c = bound.center();
        match self {
            Self::TopLeft => Rect::new(bound.x0, bound.y0, c.x, c.y),
            Self::TopRight => Rect::new(c.x, bound.y0, bound.x1, c.y),
            Self::BottomLeft => Rect::new(bound.x0, c.y, c.x, bound.y1),
            Self::BottomRight => Rect::new(c.x, c.y, bound.x1, bound.y1),
        }
    }
}

/// Closed-interval overlap: rects sharing only an edge or corner still touch.
#[inline]
pub(crate) fn rects_touch(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// All four edges of `inner` lie inside `outer` (closed on every edge).
#[inline]
pub(crate) fn rect_inside(inner: Rect, outer: Rect) -> bool {
    outer.x0 <= inner.x0 && inner.x1 <= outer.x1 && outer.y0 <= inner.y0 && inner.y1 <= outer.y1
}

/// Half-open ownership: a point on the max edge belongs to the neighbor.
/// Descent uses this so every in-bound point has exactly one owning cell.
#[inline]
pub(crate) fn owns(bound: Rect, at: Point) -> bool {
    bound.x0 <= at.x && at.x < bound.x1 && bound.y0 <= at.y && at.y < bound.y1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_count_as_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_touch(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(rects_touch(a, Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!rects_touch(a, Rect::new(10.1, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn containment_is_closed() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_inside(outer, outer));
        assert!(rect_inside(Rect::new(2.0, 2.0, 8.0, 8.0), outer));
        assert!(!rect_inside(Rect::new(2.0, 2.0, 10.1, 8.0), outer));
    }

    #[test]
    fn ownership_is_half_open() {
        let b = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(owns(b, Point::new(0.0, 0.0)));
        assert!(!owns(b, Point::new(10.0, 5.0)));
        assert!(!owns(b, Point::new(5.0, 10.0)));
    }

    #[test]
    fn quadrants_tile_the_bound() {
        let b = Rect::new(0.0, 0.0, 8.0, 8.0);
        let quads = [
            Quadrant::TopLeft,
            Quadrant::TopRight,
            Quadrant::BottomLeft,
            Quadrant::BottomRight,
        ];
        for q in quads {
            let sub = q.sub_rect(b);
            assert!(rect_inside(sub, b), "sub-rect escapes its parent bound");
            let center = sub.center();
            assert_eq!(Quadrant::for_point(b, center), q, "center routes home");
        }
    }
}
