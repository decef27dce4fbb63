//! The trace graph and its traversal algorithms.
//!
//! [`TraceGraph`] indexes every trace edge twice: a forward index keyed by
//! source and a reverse index keyed by target. The reverse index exists for
//! "who points at me" queries and for finding the edges affected by a
//! deletion.
//!
//! # Invariants
//!
//! - Both indices hold exactly the same set of edges.
//! - An edge `(source, type, target)` appears at most once.
//! - Targets may be absent from the object store (dangling edges). They are
//!   indexed like any other edge and simply resolve to nothing.
//! - Cycles are allowed; traversals keep a visited set and always terminate.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use arche_store::{ObjectSource, ObjectStore};
use arche_types::{ObjectId, TraceFilter, TraceType};

use crate::edge::{EdgeRef, TraceEdge};
use crate::error::{TraceError, TraceResult};
use crate::impact::{DependencyMatrix, ImpactEntry, ImpactReport};

/// Directed, typed edges between object identities, independent of the
/// containment tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceGraph {
    /// Forward index: source -> [(type, target)], insertion ordered.
    forward: HashMap<ObjectId, Vec<EdgeRef>>,
    /// Reverse index: target -> [(type, source)], insertion ordered.
    reverse: HashMap<ObjectId, Vec<EdgeRef>>,
    /// Total number of edges.
    edge_count: usize,
}

/// Edges detached from a removed object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetachedEdges {
    /// Edges that started at the removed object; dropped from the index.
    pub outgoing: Vec<TraceEdge>,
    /// Edges that point at the removed object; still indexed (dangling)
    /// unless the caller purges them.
    pub incoming: Vec<TraceEdge>,
}

impl TraceGraph {
    /// Create an empty trace graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from the trace properties of every object in `store`.
    pub fn rebuild(store: &ObjectStore) -> Self {
        let mut graph = Self::new();
        for id in store.document_order() {
            let Some(obj) = store.try_get(&id) else {
                continue;
            };
            for (trace_type, link) in obj.trace_links() {
                graph.add_trace(obj.id, trace_type, link.target);
            }
        }
        debug!(edges = graph.edge_count, "rebuilt trace index");
        graph
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Add `source --trace_type--> target` to both indices.
    ///
    /// The target does not need to exist. Returns `false` if the edge was
    /// already present.
    pub fn add_trace(&mut self, source: ObjectId, trace_type: TraceType, target: ObjectId) -> bool {
        let out = self.forward.entry(source).or_default();
        if out
            .iter()
            .any(|e| e.peer == target && e.trace_type == trace_type)
        {
            return false;
        }
        out.push(EdgeRef::new(trace_type.clone(), target));
        self.reverse
            .entry(target)
            .or_default()
            .push(EdgeRef::new(trace_type, source));
        self.edge_count += 1;
        true
    }

    /// Remove `source --trace_type--> target` from both indices. Returns
    /// `true` if the edge existed.
    pub fn remove_trace(&mut self, source: &ObjectId, trace_type: &TraceType, target: &ObjectId) -> bool {
        let removed = remove_ref(&mut self.forward, source, trace_type, target);
        if removed {
            remove_ref(&mut self.reverse, target, trace_type, source);
            self.edge_count -= 1;
        }
        removed
    }

    /// Returns `true` if the exact edge is indexed.
    pub fn contains(&self, source: &ObjectId, trace_type: &TraceType, target: &ObjectId) -> bool {
        self.forward
            .get(source)
            .is_some_and(|out| out.iter().any(|e| &e.peer == target && &e.trace_type == trace_type))
    }

    /// Drop every edge leaving `id` and report the edges pointing at it.
    ///
    /// Incoming edges stay indexed: after a deletion they dangle until the
    /// caller removes them with [`purge_incoming`](Self::purge_incoming).
    pub fn remove_object(&mut self, id: &ObjectId) -> DetachedEdges {
        let outgoing: Vec<TraceEdge> = self.edges_from(id);
        for edge in &outgoing {
            self.remove_trace(&edge.source, &edge.trace_type, &edge.target);
        }
        DetachedEdges {
            outgoing,
            incoming: self.edges_to(id),
        }
    }

    /// Remove every edge pointing at `id`. Returns the removed edges.
    pub fn purge_incoming(&mut self, id: &ObjectId) -> Vec<TraceEdge> {
        let incoming = self.edges_to(id);
        for edge in &incoming {
            self.remove_trace(&edge.source, &edge.trace_type, &edge.target);
        }
        incoming
    }

    // ---------------------------------------------------------------
    // Direct lookups
    // ---------------------------------------------------------------

    /// Targets of `source`, filtered by type, de-duplicated, in insertion
    /// order.
    pub fn targets_of(&self, source: &ObjectId, filter: &TraceFilter) -> Vec<ObjectId> {
        peers(self.forward.get(source), filter)
    }

    /// Sources pointing at `target`, filtered by type, de-duplicated, in
    /// insertion order.
    pub fn sources_of(&self, target: &ObjectId, filter: &TraceFilter) -> Vec<ObjectId> {
        peers(self.reverse.get(target), filter)
    }

    /// Fully qualified edges leaving `source`.
    pub fn edges_from(&self, source: &ObjectId) -> Vec<TraceEdge> {
        self.forward
            .get(source)
            .map(|out| {
                out.iter()
                    .map(|e| TraceEdge::new(*source, e.trace_type.clone(), e.peer))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fully qualified edges pointing at `target`.
    pub fn edges_to(&self, target: &ObjectId) -> Vec<TraceEdge> {
        self.reverse
            .get(target)
            .map(|inc| {
                inc.iter()
                    .map(|e| TraceEdge::new(e.peer, e.trace_type.clone(), *target))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `true` if any edge passing `filter` leads directly from `a`
    /// to `b`.
    pub fn has_dependency(&self, a: &ObjectId, b: &ObjectId, filter: &TraceFilter) -> bool {
        self.forward
            .get(a)
            .is_some_and(|out| out.iter().any(|e| &e.peer == b && filter.matches(&e.trace_type)))
    }

    /// All edges, grouped by source (sources sorted), each group in
    /// insertion order.
    pub fn edges(&self) -> Vec<TraceEdge> {
        let mut sources: Vec<&ObjectId> = self.forward.keys().collect();
        sources.sort();
        sources
            .into_iter()
            .flat_map(|s| self.edges_from(s))
            .collect()
    }

    /// Every trace type currently in use.
    pub fn trace_types(&self) -> BTreeSet<TraceType> {
        self.forward
            .values()
            .flatten()
            .map(|e| e.trace_type.clone())
            .collect()
    }

    // ---------------------------------------------------------------
    // Impact analysis
    // ---------------------------------------------------------------

    /// Transitive closure of `seeds` over forward edges passing `allowed`.
    ///
    /// Seeds are excluded from the result, already visited nodes are never
    /// expanded again, and the result is in discovery (BFS) order. A filter
    /// that matches nothing yields an empty result.
    pub fn impact_closure(&self, seeds: &[ObjectId], allowed: &TraceFilter) -> Vec<ObjectId> {
        self.impact_report(seeds, allowed).ids()
    }

    /// Impact analysis with per-object depth and discovering edge.
    pub fn impact_report(&self, seeds: &[ObjectId], allowed: &TraceFilter) -> ImpactReport {
        self.walk(seeds, allowed, |_| true)
    }

    /// Breadth-first walk over forward edges. Peers rejected by `reach`
    /// are neither reported nor expanded.
    pub(crate) fn walk(
        &self,
        seeds: &[ObjectId],
        allowed: &TraceFilter,
        reach: impl Fn(&ObjectId) -> bool,
    ) -> ImpactReport {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut queue: VecDeque<(ObjectId, usize)> = VecDeque::new();
        let mut seed_list = Vec::new();

        for seed in seeds {
            if visited.insert(*seed) {
                seed_list.push(*seed);
                queue.push_back((*seed, 0));
            }
        }

        let mut report = ImpactReport::new(seed_list);
        if allowed.matches_nothing() {
            return report;
        }

        while let Some((current, depth)) = queue.pop_front() {
            let Some(out) = self.forward.get(&current) else {
                continue;
            };
            for edge in out {
                if !allowed.matches(&edge.trace_type) {
                    continue;
                }
                if !visited.contains(&edge.peer) && reach(&edge.peer) {
                    visited.insert(edge.peer);
                    let next_depth = depth + 1;
                    report.affected.push(ImpactEntry {
                        id: edge.peer,
                        depth: next_depth,
                        via: TraceEdge::new(current, edge.trace_type.clone(), edge.peer),
                    });
                    report.cascade_depth = report.cascade_depth.max(next_depth);
                    queue.push_back((edge.peer, next_depth));
                }
            }
        }

        debug!(
            seeds = report.seeds.len(),
            affected = report.affected.len(),
            depth = report.cascade_depth,
            "computed impact"
        );
        report
    }

    /// Direct-dependency matrix between `rows` and `columns`.
    pub fn dependency_matrix(
        &self,
        rows: &[ObjectId],
        columns: &[ObjectId],
        filter: &TraceFilter,
    ) -> DependencyMatrix {
        let cells = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| self.has_dependency(r, c, filter))
                    .collect()
            })
            .collect();
        DependencyMatrix {
            rows: rows.to_vec(),
            columns: columns.to_vec(),
            cells,
        }
    }

    // ---------------------------------------------------------------
    // Consistency
    // ---------------------------------------------------------------

    /// Edges whose target does not resolve in `source`.
    pub fn dangling_edges(&self, objects: &impl ObjectSource) -> Vec<TraceEdge> {
        self.edges()
            .into_iter()
            .filter(|e| !objects.contains_object(&e.target))
            .collect()
    }

    /// Check that every edge starts at a live object and that the index
    /// matches the trace properties stored in `store`.
    pub fn validate_against(&self, store: &ObjectStore) -> TraceResult<()> {
        // Empty lists are dropped on removal, so every key has edges.
        if let Some(source) = self.forward.keys().find(|s| !store.contains(s)) {
            return Err(TraceError::MissingSource(*source));
        }

        let expected = Self::rebuild(store);
        for edge in expected.edges() {
            if !self.contains(&edge.source, &edge.trace_type, &edge.target) {
                return Err(TraceError::IndexMismatch {
                    source_id: edge.source,
                    trace_type: edge.trace_type,
                    target: edge.target,
                    reason: "stored on the object but not indexed",
                });
            }
        }
        for edge in self.edges() {
            if !expected.contains(&edge.source, &edge.trace_type, &edge.target) {
                return Err(TraceError::IndexMismatch {
                    source_id: edge.source,
                    trace_type: edge.trace_type,
                    target: edge.target,
                    reason: "indexed but not stored on the object",
                });
            }
        }

        let dangling = self.dangling_edges(store);
        if !dangling.is_empty() {
            warn!(count = dangling.len(), "trace graph has dangling edges");
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Serialization helpers
    // ---------------------------------------------------------------

    /// Serialize the index to bincode bytes.
    pub fn to_bytes(&self) -> TraceResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| TraceError::Serialization(e.to_string()))
    }

    /// Deserialize an index from bincode bytes.
    pub fn from_bytes(data: &[u8]) -> TraceResult<Self> {
        bincode::deserialize(data).map_err(|e| TraceError::Serialization(e.to_string()))
    }
}

fn remove_ref(
    index: &mut HashMap<ObjectId, Vec<EdgeRef>>,
    key: &ObjectId,
    trace_type: &TraceType,
    peer: &ObjectId,
) -> bool {
    let Some(list) = index.get_mut(key) else {
        return false;
    };
    let Some(pos) = list
        .iter()
        .position(|e| &e.peer == peer && &e.trace_type == trace_type)
    else {
        return false;
    };
    list.remove(pos);
    if list.is_empty() {
        index.remove(key);
    }
    true
}

fn peers(list: Option<&Vec<EdgeRef>>, filter: &TraceFilter) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    list.into_iter()
        .flatten()
        .filter(|e| filter.matches(&e.trace_type))
        .filter(|e| seen.insert(e.peer))
        .map(|e| e.peer)
        .collect()
}
