//! # Trackway Route
//!
//! Connectivity graph construction over per-pin nodes and the
//! constrained shortest-path finder. The graph is a disposable
//! snapshot of the placement held by `trackway-core`; build it fresh
//! before each batch of queries.

pub mod graph;
pub mod finder;

pub use finder::{find_path, find_path_with_deadline, PathResult, Traversal};
pub use graph::{ConnectivityGraph, Edge, EdgeKind, Node};
