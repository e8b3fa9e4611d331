// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=trellis_engine --heading-base-level=0

//! Trellis Engine: per-frame state machinery for a node-link diagram editor.
//!
//! The engine sits between a host (pointer/keyboard wiring, rendering) and a
//! [`trellis_graph::GraphStore`], and keeps the derived per-frame state
//! consistent under continuous mutation:
//!
//! - [`ViewportCuller`]: two-phase visibility — an immediate pass publishes
//!   an ordered newly-visible sequence as the view moves, a debounced
//!   confirm pass replaces the visible set with the query over a
//!   margin-expanded viewport.
//! - [`SelectionState`]: selection, hover, and cross-highlighting between
//!   adjacent nodes and edges; box selection runs the quadtree as a coarse
//!   filter and re-checks precise intersection per candidate.
//! - [`Phase`] + [`trellis_graph::DraftLayout`]: move/resize/placement
//!   gestures accumulate into a draft override; confirm commits canonical
//!   geometry and re-keys the spatial index, cancel discards the override
//!   bit-exactly.
//! - [`History`]: undo/redo over deep snapshots of the full graph state,
//!   committed only by confirmed structural mutations.
//! - [`Camera`]: the uniform scale+offset transform that carries
//!   screen-space gestures into world space.
//!
//! Everything is synchronous and single-threaded; the one deferred effect
//! (the confirm pass) is driven by host-supplied millisecond timestamps
//! through [`Engine::tick`], so there is no ambient clock to stub in tests.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use trellis_engine::{Engine, EngineConfig};
//! use trellis_graph::{Node, SequentialIds};
//!
//! let mut engine = Engine::new(EngineConfig::default(), SequentialIds::new());
//! engine.set_view_rect(Rect::new(0.0, 0.0, 800.0, 600.0), 0);
//!
//! let id = engine
//!     .add_node(None, Node::new(Rect::new(40.0, 40.0, 160.0, 100.0), "start"))
//!     .unwrap();
//!
//! // Select and drag it 50 units right.
//! engine.select_node(id);
//! engine.start_move(Point::new(100.0, 70.0));
//! engine.update_move(Point::new(150.0, 70.0));
//! engine.stop_move(true);
//! assert_eq!(
//!     engine.store().node(id).unwrap().rect,
//!     Rect::new(90.0, 40.0, 210.0, 100.0),
//! );
//!
//! // Undo restores the committed geometry exactly.
//! assert!(engine.undo());
//! assert_eq!(
//!     engine.store().node(id).unwrap().rect,
//!     Rect::new(40.0, 40.0, 160.0, 100.0),
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod camera;
mod culler;
mod engine;
mod history;
mod interact;
mod selection;

pub use camera::Camera;
pub use culler::ViewportCuller;
pub use engine::{EdgeView, Engine, EngineConfig, Frame, NodeView};
pub use history::History;
pub use interact::{Phase, ResizeHandle, moved_rect, resized_rect};
pub use selection::SelectionState;
