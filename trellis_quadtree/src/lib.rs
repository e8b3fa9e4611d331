// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=trellis_quadtree --heading-base-level=0

//! Trellis Quadtree: an expandable quadtree for diagram-scale range queries.
//!
//! The tree partitions a rectangular root bound into four quadrants about its
//! center, recursively, down to a configurable minimum cell size. It is built
//! for the access pattern of an interactive canvas:
//!
//! - Items enter with a world-space rectangle ([`QuadTree::insert`]); the root
//!   bound grows outward by axis doublings when a rectangle falls outside it,
//!   so the indexed region follows the content instead of being fixed up front.
//! - Range queries ([`QuadTree::covered`]) prune aggressively: a cell fully
//!   inside the query window contributes its whole item list without
//!   descending, which keeps per-frame viewport and lasso queries proportional
//!   to the window's footprint rather than to the total item count.
//! - Every cell stores the items inserted at or below it. This redundancy is
//!   what makes the containment prune a constant-time step, at the cost of one
//!   id copy per tree level per item.
//!
//! The tree is a *coarse* filter. At the default minimum cell size (60.0) a
//! small diagram never subdivides at all, so queries over-approximate and
//! callers are expected to re-check precise intersection against canonical
//! geometry. Pass a smaller minimum cell size to [`QuadTree::with_min_cell`]
//! when finer resolution is worth the extra depth.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Rect;
//! use trellis_quadtree::QuadTree;
//!
//! let mut tree: QuadTree<u32> = QuadTree::with_min_cell(Rect::new(0.0, 0.0, 10.0, 10.0), 1.0);
//!
//! // Inserting a rect that overflows the bound doubles the root outward
//! // until it fits: (0,0,10,10) grows to (0,0,40,40).
//! tree.insert(Rect::new(1.0, 1.0, 21.0, 21.0), 7);
//! assert_eq!(tree.bound(), Rect::new(0.0, 0.0, 40.0, 40.0));
//!
//! // Range queries return the ids whose cells the window touches.
//! assert_eq!(tree.covered(Rect::new(0.0, 0.0, 2.0, 2.0)), vec![7]);
//! assert!(tree.covered(Rect::new(30.0, 30.0, 40.0, 40.0)).is_empty());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod tree;
mod types;

pub use tree::{DEFAULT_MIN_CELL, QuadTree};
pub use types::Direction;
