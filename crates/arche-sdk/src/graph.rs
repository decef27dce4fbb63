//! The object store and its trace index, edited together.
//!
//! [`Graph`] is the unit guarded by the workspace lock. Every mutation goes
//! through it so the trace index always matches the trace properties stored
//! on the objects.

use tracing::{debug, info};

use arche_bridge::RenderContext;
use arche_clone::{CloneOutcome, ClonePlan};
use arche_store::{DocumentMeta, Object, ObjectStore};
use arche_trace::{DependencyMatrix, ImpactReport, TraceEdge, TraceGraph};
use arche_types::{ClassTag, ObjectId, PropertyValue, TraceFilter, TraceLink, TraceType};

use crate::config::DanglingPolicy;
use crate::error::SdkResult;

/// What a deletion removed and what it left behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    /// Removed identifiers, root first, in pre-order.
    pub removed: Vec<ObjectId>,
    /// Edges from surviving objects that now point at nothing.
    pub dangling: Vec<TraceEdge>,
    /// Edges from surviving objects that were removed with the subtree.
    pub purged: Vec<TraceEdge>,
}

/// Result of a consistency check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub objects: usize,
    pub edges: usize,
    pub dangling: Vec<TraceEdge>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
    }
}

/// Object store plus trace index.
#[derive(Clone, Debug)]
pub struct Graph {
    store: ObjectStore,
    traces: TraceGraph,
}

impl Graph {
    /// Wrap a store, indexing the traces it already carries.
    pub fn new(store: ObjectStore) -> Self {
        let traces = TraceGraph::rebuild(&store);
        Self { store, traces }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn traces(&self) -> &TraceGraph {
        &self.traces
    }

    /// Mutable store access for persistence. Must not change trace
    /// properties.
    pub(crate) fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    // ---------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------

    /// Add a document root at `position` (appended when `None`).
    pub fn add_document(
        &mut self,
        meta: DocumentMeta,
        position: Option<usize>,
    ) -> SdkResult<ObjectId> {
        let doc = Object::document(meta);
        let id = doc.id;
        self.store.insert(doc, position)?;
        Ok(id)
    }

    /// Register a new object and index any traces it already carries.
    pub fn add_object(&mut self, object: Object, position: Option<usize>) -> SdkResult<ObjectId> {
        let id = object.id;
        self.store.insert(object, position)?;
        self.reindex(&id);
        Ok(id)
    }

    /// Set a property. Trace properties are reindexed.
    pub fn set_property(
        &mut self,
        id: &ObjectId,
        name: &str,
        value: PropertyValue,
    ) -> SdkResult<Option<PropertyValue>> {
        let touches_traces = matches!(value, PropertyValue::Trace(_));
        let previous = self.store.set_property(id, name, value)?;
        if touches_traces || matches!(previous, Some(PropertyValue::Trace(_))) {
            self.reindex(id);
        }
        Ok(previous)
    }

    pub fn remove_property(&mut self, id: &ObjectId, name: &str) -> SdkResult<Option<PropertyValue>> {
        let removed = self.store.remove_property(id, name)?;
        if matches!(removed, Some(PropertyValue::Trace(_))) {
            self.reindex(id);
        }
        Ok(removed)
    }

    pub fn set_classes(&mut self, id: &ObjectId, classes: Vec<ClassTag>) -> SdkResult<()> {
        self.store.set_classes(id, classes)?;
        Ok(())
    }

    /// Add `source --trace_type--> link.target`. The source must exist; the
    /// target may not. Returns `false` if the edge was already there.
    pub fn add_trace(
        &mut self,
        source: &ObjectId,
        trace_type: TraceType,
        link: TraceLink,
    ) -> SdkResult<bool> {
        let target = link.target;
        let added = self.store.add_trace_link(source, &trace_type, link)?;
        if added {
            self.traces.add_trace(*source, trace_type, target);
        }
        Ok(added)
    }

    pub fn remove_trace(
        &mut self,
        source: &ObjectId,
        trace_type: &TraceType,
        target: &ObjectId,
    ) -> SdkResult<bool> {
        let removed = self.store.remove_trace_link(source, trace_type, target)?;
        if removed {
            self.traces.remove_trace(source, trace_type, target);
        }
        Ok(removed)
    }

    /// Delete `id` and its subtree.
    ///
    /// Edges leaving the subtree go with it. Edges pointing into it are kept
    /// dangling or purged from their sources, depending on `policy`.
    pub fn remove_object(&mut self, id: &ObjectId, policy: DanglingPolicy) -> SdkResult<Removal> {
        let removed = self.store.remove(id)?;
        for rid in &removed {
            self.traces.remove_object(rid);
        }
        let incoming: Vec<TraceEdge> = removed
            .iter()
            .flat_map(|rid| self.traces.edges_to(rid))
            .collect();

        let mut removal = Removal {
            removed,
            ..Removal::default()
        };
        match policy {
            DanglingPolicy::Keep => removal.dangling = incoming,
            DanglingPolicy::Cascade => {
                for rid in &removal.removed {
                    self.traces.purge_incoming(rid);
                    self.store.remove_links_to(rid);
                }
                removal.purged = incoming;
            }
        }
        info!(
            object = %id.short_id(),
            removed = removal.removed.len(),
            dangling = removal.dangling.len(),
            purged = removal.purged.len(),
            "removed object"
        );
        Ok(removal)
    }

    pub fn reparent(
        &mut self,
        id: &ObjectId,
        new_parent: &ObjectId,
        position: Option<usize>,
    ) -> SdkResult<()> {
        self.store.reparent(id, new_parent, position)?;
        Ok(())
    }

    /// Commit a clone plan and index the traces of the copies.
    pub fn commit_clone(&mut self, plan: ClonePlan) -> SdkResult<CloneOutcome> {
        let outcome = plan.commit(&mut self.store)?;
        for edge in &outcome.traces {
            self.traces
                .add_trace(edge.source, edge.trace_type.clone(), edge.target);
        }
        debug!(edges = outcome.traces.len(), "indexed cloned traces");
        Ok(outcome)
    }

    fn reindex(&mut self, id: &ObjectId) {
        self.traces.remove_object(id);
        if let Some(obj) = self.store.try_get(id) {
            for (trace_type, link) in obj.trace_links() {
                self.traces.add_trace(*id, trace_type, link.target);
            }
        }
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Impact of `seeds`. Deleted trace targets are not reported.
    pub fn impact(&self, seeds: &[ObjectId], filter: &TraceFilter) -> ImpactReport {
        self.traces.live(&self.store).impact_report(seeds, filter)
    }

    /// Matrix of direct dependencies between objects of two class sets.
    pub fn matrix(
        &self,
        row_classes: &[ClassTag],
        column_classes: &[ClassTag],
        filter: &TraceFilter,
    ) -> DependencyMatrix {
        let rows = self.store.objects_with_classes(row_classes);
        let columns = self.store.objects_with_classes(column_classes);
        self.traces
            .live(&self.store)
            .dependency_matrix(&rows, &columns, filter)
    }

    /// Validate containment and the trace index, and list dangling edges.
    pub fn check(&self) -> SdkResult<CheckReport> {
        self.store.validate()?;
        self.traces.validate_against(&self.store)?;
        Ok(CheckReport {
            objects: self.store.len(),
            edges: self.traces.len(),
            dangling: self.traces.dangling_edges(&self.store),
        })
    }

    /// A render context over this graph, without assets.
    pub fn render_context(&self) -> RenderContext<'_> {
        RenderContext::new(&self.store, &self.traces)
    }
}
