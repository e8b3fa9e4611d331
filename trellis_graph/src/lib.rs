// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=trellis_graph --heading-base-level=0

//! Trellis Graph: the canonical document of a node-link diagram and its
//! derived index web.
//!
//! A diagram is a flat, id-keyed [`Document`] of titled, positioned
//! [`Node`]s with ordered input/output [`Port`]s, connected by directed
//! [`Edge`]s (output → input). [`GraphStore`] owns the document together with
//! every structure derived from it:
//!
//! - port-index maps (name → ordinal, per node and side),
//! - node ↔ edge and port ↔ edge adjacency,
//! - a materialized edge-anchor cache ([`EdgeAnchors`]),
//! - a [`trellis_quadtree::QuadTree`] keyed by canonical node rects.
//!
//! Every operation updates all of them before returning, so readers never
//! observe a half-updated web. Deleting a node cascades over its incident
//! edges first; operations on ids that no longer exist are quiet no-ops
//! (UI-driven removal races harmlessly); and the acceptance policy can
//! reject additions as ordinary [`Err`] values.
//!
//! Id generation and acceptance are pluggable through [`Policy`], passed at
//! construction. The default [`SequentialIds`] applies [`default_edge_rules`]:
//! no self-edges, matching port type tags, at most one incoming edge per
//! input port.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Rect;
//! use trellis_graph::{GraphStore, Node, PortRef, PortSide, SequentialIds};
//!
//! let mut store = GraphStore::new(Rect::new(0.0, 0.0, 600.0, 600.0), SequentialIds::new());
//! let a = store
//!     .add_node(None, Node::new(Rect::new(0.0, 0.0, 120.0, 60.0), "load").with_output("out", "rows"))
//!     .unwrap();
//! let b = store
//!     .add_node(None, Node::new(Rect::new(0.0, 150.0, 120.0, 210.0), "filter").with_input("in", "rows"))
//!     .unwrap();
//!
//! let edge = store
//!     .add_edge(
//!         PortRef::new(a, PortSide::Output, 0),
//!         PortRef::new(b, PortSide::Input, 0),
//!     )
//!     .unwrap();
//!
//! // Anchors are cached from canonical geometry.
//! let anchors = store.anchors(edge).unwrap();
//! assert_eq!(anchors.start.y, 60.0);
//! assert_eq!(anchors.end.y, 150.0);
//!
//! // Deleting a node cascades to its edges.
//! store.delete_node(a);
//! assert!(store.edge(edge).is_none());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod policy;
mod store;
mod types;

pub use policy::{
    EdgeCandidate, EdgeRejection, NodeRejection, Policy, SequentialIds, default_edge_rules,
};
pub use store::{EdgeAnchors, GraphState, GraphStore};
pub use types::{
    Document, DocumentError, DraftLayout, Edge, EdgeId, Endpoint, Node, NodeId, Port, PortRef,
    PortSide,
};
