// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The quadtree: outward expansion, path insertion/removal, pruned queries.

use alloc::boxed::Box;
use alloc::vec::Vec;
use kurbo::{Point, Rect};

use crate::types::{Direction, Quadrant, owns, rect_inside, rects_touch};

/// Minimum cell size used by [`QuadTree::new`].
///
/// Deliberately coarse: diagrams smaller than this never subdivide, so they
/// index at root resolution and queries degrade to a plain list scan, which
/// is the right trade until element counts grow.
pub const DEFAULT_MIN_CELL: f64 = 60.0;

#[derive(Clone)]
struct Cell<K> {
    bound: Rect,
    /// Every item inserted at or below this cell, in insertion order.
    items: Vec<K>,
    children: [Option<Box<Cell<K>>>; 4],
}

impl<K> Cell<K> {
    fn new(bound: Rect) -> Self {
        Self {
            bound,
            items: Vec::new(),
            children: [None, None, None, None],
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }

    /// A cell subdivides only while its bound exceeds the minimum cell size
    /// in both axes. Former roots reparented by expansion can sit below this
    /// floor and still carry children.
    fn subdividable(&self, min_cell: f64) -> bool {
        self.bound.width() > min_cell && self.bound.height() > min_cell
    }

    /// Child slot that descent takes for `at`.
    ///
    /// A reparented former root spans two quadrant regions of its parent, so
    /// an existing child that owns the point takes precedence over the slot
    /// computed from the center. Ownership is half-open and children never
    /// overlap, which keeps insert and remove paths identical across
    /// interleaved expansions.
    fn route(&self, at: Point) -> Quadrant {
        for (slot, child) in self.children.iter().enumerate() {
            if let Some(c) = child
                && owns(c.bound, at)
            {
                return match slot {
                    0 => Quadrant::TopLeft,
                    1 => Quadrant::TopRight,
                    2 => Quadrant::BottomLeft,
                    _ => Quadrant::BottomRight,
                };
            }
        }
        Quadrant::for_point(self.bound, at)
    }
}

/// An expandable quadtree mapping world-space rectangles to `Copy` item ids.
///
/// See the [crate docs](crate) for the access pattern this is built for.
#[derive(Clone)]
pub struct QuadTree<K> {
    root: Cell<K>,
    min_cell: f64,
}

impl<K> core::fmt::Debug for QuadTree<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bound", &self.root.bound)
            .field("min_cell", &self.min_cell)
            .field("items", &self.root.items.len())
            .finish_non_exhaustive()
    }
}

impl<K: Copy + PartialEq> QuadTree<K> {
    /// Create an empty tree over `bound` at the coarse [`DEFAULT_MIN_CELL`]
    /// resolution.
    #[must_use]
    pub fn new(bound: Rect) -> Self {
        Self::with_min_cell(bound, DEFAULT_MIN_CELL)
    }

    /// Create an empty tree over `bound` that subdivides down to `min_cell`.
    #[must_use]
    pub fn with_min_cell(bound: Rect, min_cell: f64) -> Self {
        debug_assert!(
            bound.width() > 0.0 && bound.height() > 0.0,
            "root bound must have positive area"
        );
        debug_assert!(min_cell > 0.0, "minimum cell size must be positive");
        Self {
            root: Cell::new(bound),
            min_cell,
        }
    }

    /// Current root bound. Grows as out-of-bound rectangles are inserted.
    #[must_use]
    pub fn bound(&self) -> Rect {
        self.root.bound
    }

    /// Configured minimum cell size.
    #[must_use]
    pub fn min_cell(&self) -> f64 {
        self.min_cell
    }

    /// Number of live items (the root's list holds every item).
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.items.len()
    }

    /// `true` when no items are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.items.is_empty()
    }

    /// Double the root extent along one axis.
    ///
    /// The old root becomes a child of the new root, occupying the half away
    /// from the growth direction. The new root copies the old root's item
    /// list: every item is still at-or-below it.
    pub fn expand(&mut self, direction: Direction) {
        let b = self.root.bound;
        let (bound, slot) = match direction {
            Direction::Right => (
                Rect::new(b.x0, b.y0, b.x0 + b.width() * 2.0, b.y1),
                Quadrant::TopLeft,
            ),
            Direction::Left => (
                Rect::new(b.x1 - b.width() * 2.0, b.y0, b.x1, b.y1),
                Quadrant::TopRight,
            ),
            Direction::Down => (
                Rect::new(b.x0, b.y0, b.x1, b.y0 + b.height() * 2.0),
                Quadrant::TopLeft,
            ),
            Direction::Up => (
                Rect::new(b.x0, b.y1 - b.height() * 2.0, b.x1, b.y1),
                Quadrant::BottomLeft,
            ),
        };
        let old = core::mem::replace(&mut self.root, Cell::new(bound));
        self.root.items = old.items.clone();
        self.root.children[slot.slot()] = Some(Box::new(old));
    }

    /// Index `item` under `rect`.
    ///
    /// Expands the root first when `rect` overflows it (per axis, the
    /// smallest number of doublings `k` with `extent·2^k > delta`), then
    /// descends by the rect's origin point, appending `item` to every visited
    /// cell down to the resolution floor.
    pub fn insert(&mut self, rect: Rect, item: K) {
        self.grow_to_cover(rect);
        let at = rect.origin();
        let min_cell = self.min_cell;
        let mut cell = &mut self.root;
        loop {
            cell.items.push(item);
            if !cell.subdividable(min_cell) {
                return;
            }
            let slot = cell.route(at);
            let bound = slot.sub_rect(cell.bound);
            cell = cell.children[slot.slot()].get_or_insert_with(|| Box::new(Cell::new(bound)));
        }
    }

    /// Remove `item` along the descent path of `at`.
    ///
    /// `at` must be the origin point of the rect `item` was inserted under.
    /// The walk follows existing children all the way down — not just to the
    /// resolution floor — because expansion copies a former root's list into
    /// the new root, so copies of an item can sit below the floor. Unknown
    /// items are a no-op. Emptied cells are kept (pruning is not worth the
    /// bookkeeping at diagram scale).
    pub fn remove(&mut self, at: Point, item: K) {
        let mut cell = &mut self.root;
        loop {
            if let Some(pos) = cell.items.iter().position(|k| *k == item) {
                cell.items.remove(pos);
            }
            let slot = cell.route(at);
            match cell.children[slot.slot()].as_deref_mut() {
                Some(child) => cell = child,
                None => return,
            }
        }
    }

    /// Items whose cells the query window touches, pruned.
    ///
    /// A cell contributes its whole list without descending when it is fully
    /// contained in `window`, sits at the resolution floor, or has no
    /// children; a partially intersecting interior cell recurses; a disjoint
    /// cell contributes nothing. Touching edges count as intersecting.
    /// Containment is tested against each visited cell's actual bound. Floor
    /// and leaf contributions over-approximate at coarse resolutions, so
    /// callers needing exactness re-check against canonical geometry.
    #[must_use]
    pub fn covered(&self, window: Rect) -> Vec<K> {
        let mut out = Vec::new();
        Self::gather(&self.root, window, self.min_cell, &mut out);
        out
    }

    fn gather(cell: &Cell<K>, window: Rect, min_cell: f64, out: &mut Vec<K>) {
        if !rects_touch(cell.bound, window) {
            return;
        }
        if rect_inside(cell.bound, window) || !cell.subdividable(min_cell) || cell.is_leaf() {
            out.extend_from_slice(&cell.items);
            return;
        }
        for child in cell.children.iter().flatten() {
            Self::gather(child, window, min_cell, out);
        }
    }

    /// Grow the root until `rect` is covered, one axis doubling at a time.
    fn grow_to_cover(&mut self, rect: Rect) {
        let b = self.root.bound;
        if rect.x1 >= b.x1 {
            for _ in 0..doublings(b.width(), rect.x1 - b.x0) {
                self.expand(Direction::Right);
            }
        }
        let b = self.root.bound;
        if rect.x0 < b.x0 {
            for _ in 0..doublings(b.width(), b.x1 - rect.x0) {
                self.expand(Direction::Left);
            }
        }
        let b = self.root.bound;
        if rect.y1 >= b.y1 {
            for _ in 0..doublings(b.height(), rect.y1 - b.y0) {
                self.expand(Direction::Down);
            }
        }
        let b = self.root.bound;
        if rect.y0 < b.y0 {
            for _ in 0..doublings(b.height(), b.y1 - rect.y0) {
                self.expand(Direction::Up);
            }
        }
    }
}

/// Smallest `k` with `extent·2^k > delta`.
fn doublings(extent: f64, delta: f64) -> u32 {
    debug_assert!(extent > 0.0, "cannot expand a degenerate extent");
    let mut k = 0;
    let mut grown = extent;
    while grown <= delta {
        grown *= 2.0;
        k += 1;
    }
    k
}
