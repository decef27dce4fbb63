//! Store-aware view over a [`TraceGraph`].
//!
//! The graph itself indexes dangling edges so that consistency checks and
//! round trips see them. Queries that answer "what does this depend on" or
//! "what is affected" must only return objects that exist, so they go
//! through [`LiveTraces`], which drops every id the object source cannot
//! resolve.

use arche_store::ObjectSource;
use arche_types::{ObjectId, TraceFilter};

use crate::graph::TraceGraph;
use crate::impact::{DependencyMatrix, ImpactReport};

/// A [`TraceGraph`] paired with the objects its edges point into.
pub struct LiveTraces<'a, S: ObjectSource> {
    graph: &'a TraceGraph,
    objects: &'a S,
}

impl TraceGraph {
    /// View this graph through `objects`, hiding dangling targets.
    pub fn live<'a, S: ObjectSource>(&'a self, objects: &'a S) -> LiveTraces<'a, S> {
        LiveTraces {
            graph: self,
            objects,
        }
    }
}

impl<'a, S: ObjectSource> LiveTraces<'a, S> {
    pub fn graph(&self) -> &'a TraceGraph {
        self.graph
    }

    fn resolves(&self, id: &ObjectId) -> bool {
        self.objects.contains_object(id)
    }

    /// Existing targets of `source`; empty if `source` itself is gone.
    pub fn targets_of(&self, source: &ObjectId, filter: &TraceFilter) -> Vec<ObjectId> {
        if !self.resolves(source) {
            return Vec::new();
        }
        let mut out = self.graph.targets_of(source, filter);
        out.retain(|id| self.resolves(id));
        out
    }

    /// Existing sources pointing at `target`; empty if `target` is gone.
    pub fn sources_of(&self, target: &ObjectId, filter: &TraceFilter) -> Vec<ObjectId> {
        if !self.resolves(target) {
            return Vec::new();
        }
        let mut out = self.graph.sources_of(target, filter);
        out.retain(|id| self.resolves(id));
        out
    }

    /// Direct dependency from `a` to `b`, both of which must exist.
    pub fn has_dependency(&self, a: &ObjectId, b: &ObjectId, filter: &TraceFilter) -> bool {
        self.resolves(a) && self.resolves(b) && self.graph.has_dependency(a, b, filter)
    }

    /// Impact closure restricted to existing objects.
    pub fn impact_closure(&self, seeds: &[ObjectId], allowed: &TraceFilter) -> Vec<ObjectId> {
        self.impact_report(seeds, allowed).ids()
    }

    pub fn impact_report(&self, seeds: &[ObjectId], allowed: &TraceFilter) -> ImpactReport {
        self.graph.walk(seeds, allowed, |id| self.resolves(id))
    }

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use arche_store::{DocumentMeta, Object, ObjectStore};
    use arche_types::{PropertyValue, TraceLink};

    /// `a --depends-on--> b --depends-on--> c`, with `c` then deleted.
    fn chain_with_deleted_tail() -> (ObjectStore, TraceGraph, [ObjectId; 3]) {
        let mut store = ObjectStore::new("p");
        let doc = Object::document(DocumentMeta::named("d"));
        let doc_id = doc.id;
        store.put(doc).unwrap();
        let c = Object::new(doc_id);
        let c_id = c.id;
        store.put(c).unwrap();
        let b = Object::new(doc_id)
            .with_property("depends-on", PropertyValue::Trace(vec![TraceLink::new(c_id)]))
            .unwrap();
        let b_id = b.id;
        store.put(b).unwrap();
        let a = Object::new(doc_id)
            .with_property("depends-on", PropertyValue::Trace(vec![TraceLink::new(b_id)]))
            .unwrap();
        let a_id = a.id;
        store.put(a).unwrap();

        let mut graph = TraceGraph::rebuild(&store);
        store.remove(&c_id).unwrap();
        graph.remove_object(&c_id);
        (store, graph, [a_id, b_id, c_id])
    }

    #[test]
    fn deleted_targets_are_not_results() {
        let (store, graph, [a, b, c]) = chain_with_deleted_tail();
        let live = graph.live(&store);
        let any = TraceFilter::Any;

        assert_eq!(graph.targets_of(&b, &any), vec![c]);
        assert!(live.targets_of(&b, &any).is_empty());
        assert!(!live.has_dependency(&b, &c, &any));
        assert!(live.has_dependency(&a, &b, &any));
        assert_eq!(live.impact_closure(&[a], &any), vec![b]);
        assert!(live.impact_closure(&[b], &any).is_empty());
        assert_eq!(live.sources_of(&b, &any), vec![a]);
        assert_eq!(graph.sources_of(&c, &any), vec![b]);
        assert!(live.sources_of(&c, &any).is_empty());
    }

    #[test]
    fn live_report_depth_ignores_dangling_hops() {
        let (store, graph, [a, _, _]) = chain_with_deleted_tail();
        let report = graph.live(&store).impact_report(&[a], &TraceFilter::Any);
        assert_eq!(report.cascade_depth, 1);
        assert_eq!(graph.impact_report(&[a], &TraceFilter::Any).cascade_depth, 2);
    }

    #[test]
    fn matrix_has_no_cells_for_deleted_columns() {
        let (store, graph, [_, b, c]) = chain_with_deleted_tail();
        let m = graph.live(&store).dependency_matrix(&[b], &[c], &TraceFilter::Any);
        assert_eq!(m.cells, vec![vec![false]]);
        assert!(graph.has_dependency(&b, &c, &TraceFilter::Any));
    }
}
