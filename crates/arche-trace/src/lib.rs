//! Trace graph for Arche.
//!
//! Trace properties on objects form a directed, typed graph that is
//! independent of containment. This crate keeps a forward and a reverse
//! index over those edges and answers the traceability questions built on
//! top of them: direct dependency checks, filtered neighbour lookups,
//! transitive impact analysis, and dependency matrices.
//!
//! # Key Types
//!
//! - [`TraceGraph`] -- the dual index with traversal algorithms
//! - [`TraceEdge`] -- a fully qualified `source --type--> target` edge
//! - [`ImpactReport`] -- closure of a seed set with depths and paths
//! - [`DependencyMatrix`] -- direct dependencies between two object lists
//!
//! Edges may dangle: a target that no longer resolves is still indexed and
//! reported by [`TraceGraph::dangling_edges`], but [`TraceGraph::live`]
//! queries never return it. Cycles are allowed and every
//! traversal terminates.

pub mod edge;
pub mod error;
pub mod graph;
pub mod impact;
pub mod live;

pub use edge::{EdgeRef, TraceEdge};
pub use error::{TraceError, TraceResult};
pub use graph::{DetachedEdges, TraceGraph};
pub use impact::{DependencyMatrix, ImpactEntry, ImpactReport};
pub use live::LiveTraces;
