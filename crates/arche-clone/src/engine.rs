//! Two-phase deep copy of object subtrees.
//!
//! Cloning is split into a read-only planning phase and a commit phase:
//!
//! 1. [`CloneEngine::plan`] walks each source root in pre-order, allocates a
//!    fresh identifier for every node, and builds the copies. Trace links
//!    whose target was cloned in the same invocation are rewritten through
//!    the [`IdRemap`]; every other target (external or dangling) is kept.
//! 2. [`ClonePlan::commit`] checks the destination and inserts the copies.
//!    If an insertion fails, everything inserted so far is removed again and
//!    the destination's dirty set is restored.
//!
//! Planning only needs shared borrows, so the source and the destination
//! may be the same store.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use arche_store::{DocumentMeta, Object, ObjectKind, ObjectSource, ObjectStore};
use arche_trace::TraceEdge;
use arche_types::{ObjectId, PropertyValue};

use crate::alloc::{IdAllocator, UuidAllocator};
use crate::error::{CloneError, CloneResult};
use crate::remap::IdRemap;
use crate::request::{CloneOptions, CloneRequest, CloneRoot, Placement};

/// A root of a planned clone.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedRoot {
    pub source: ObjectId,
    pub id: ObjectId,
    pub placement: Placement,
}

/// Copies ready to be inserted into a destination store.
#[derive(Clone, Debug)]
pub struct ClonePlan {
    pub(crate) roots: Vec<PlannedRoot>,
    /// Copies in insertion order (each root's subtree in pre-order), with
    /// empty child lists. Children are re-linked by insertion.
    pub(crate) objects: Vec<Object>,
    pub(crate) remap: IdRemap,
}

/// What a committed clone produced.
#[derive(Clone, Debug)]
pub struct CloneOutcome {
    /// New root identifiers, in request order.
    pub roots: Vec<ObjectId>,
    /// The invocation's old -> new table.
    pub remap: IdRemap,
    /// Trace edges carried by the copies, to be added to the trace index.
    pub traces: Vec<TraceEdge>,
}

/// Deep-copies subtrees with fresh identifiers.
#[derive(Debug)]
pub struct CloneEngine<A = UuidAllocator> {
    allocator: A,
    options: CloneOptions,
}

impl CloneEngine<UuidAllocator> {
    /// An engine allocating UUID v7 identifiers.
    pub fn new(options: CloneOptions) -> Self {
        Self::with_allocator(UuidAllocator, options)
    }
}

impl Default for CloneEngine<UuidAllocator> {
    fn default() -> Self {
        Self::new(CloneOptions::default())
    }
}

impl<A: IdAllocator> CloneEngine<A> {
    pub fn with_allocator(allocator: A, options: CloneOptions) -> Self {
        Self { allocator, options }
    }

    pub fn options(&self) -> &CloneOptions {
        &self.options
    }

    /// Plan a clone of `request` from `source` into `dest`.
    ///
    /// Neither graph is modified. `dest` is only consulted so that new
    /// identifiers do not collide with objects already there.
    pub fn plan(
        &mut self,
        source: &impl ObjectSource,
        dest: &impl ObjectSource,
        request: &CloneRequest,
    ) -> CloneResult<ClonePlan> {
        if request.roots.is_empty() {
            return Err(CloneError::failed("nothing to clone"));
        }

        // Collect every subtree first so overlapping roots are caught before
        // any identifier is allocated.
        let mut subtrees: Vec<Vec<ObjectId>> = Vec::with_capacity(request.roots.len());
        let mut covered: HashSet<ObjectId> = HashSet::new();
        for root in &request.roots {
            if !source.contains_object(&root.source) {
                return Err(CloneError::SourceNotFound(root.source));
            }
            let ids = source.subtree_ids(&root.source);
            for id in &ids {
                if !covered.insert(*id) {
                    return Err(CloneError::failed(format!(
                        "source roots overlap at {id}"
                    )));
                }
            }
            subtrees.push(ids);
        }

        let mut remap = IdRemap::new();
        for old in subtrees.iter().flatten() {
            let new = self.fresh_id(source, dest, &remap)?;
            remap.insert(*old, new);
        }

        let mut roots = Vec::with_capacity(request.roots.len());
        let mut objects = Vec::with_capacity(remap.len());
        for (root, ids) in request.roots.iter().zip(&subtrees) {
            let parent_of = parent_links(source, ids);
            for old in ids {
                let Some(original) = source.object(old) else {
                    continue;
                };
                let copy = if old == &root.source {
                    copy_root(original, root, &remap)?
                } else {
                    let parent = parent_of.get(old).map(|p| remap.resolve(p));
                    copy_nested(original, parent, &remap)
                };
                debug!(from = %old.short_id(), to = %copy.id.short_id(), "planned copy");
                objects.push(copy);
            }
            roots.push(PlannedRoot {
                source: root.source,
                id: remap.resolve(&root.source),
                placement: root.placement.clone(),
            });
        }

        Ok(ClonePlan {
            roots,
            objects,
            remap,
        })
    }

    /// Plan and commit a clone from `source` into `dest`.
    pub fn clone_into(
        &mut self,
        source: &impl ObjectSource,
        dest: &mut ObjectStore,
        request: &CloneRequest,
    ) -> CloneResult<CloneOutcome> {
        let plan = self.plan(source, &*dest, request)?;
        plan.commit(dest)
    }

    /// Plan and commit a clone whose source and destination are `store`.
    pub fn clone_within(
        &mut self,
        store: &mut ObjectStore,
        request: &CloneRequest,
    ) -> CloneResult<CloneOutcome> {
        let plan = self.plan(&*store, &*store, request)?;
        plan.commit(store)
    }

    fn fresh_id(
        &mut self,
        source: &impl ObjectSource,
        dest: &impl ObjectSource,
        remap: &IdRemap,
    ) -> CloneResult<ObjectId> {
        for _ in 0..self.options.max_id_attempts {
            let candidate = self.allocator.allocate();
            if !dest.contains_object(&candidate)
                && !source.contains_object(&candidate)
                && !remap.is_allocated(&candidate)
            {
                return Ok(candidate);
            }
            debug!(candidate = %candidate.short_id(), "identifier collision, retrying");
        }
        Err(CloneError::failed(format!(
            "no fresh identifier after {} attempts",
            self.options.max_id_attempts
        )))
    }
}

impl ClonePlan {
    pub fn roots(&self) -> &[PlannedRoot] {
        &self.roots
    }

    /// Planned copies in insertion order.
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn remap(&self) -> &IdRemap {
        &self.remap
    }

    /// Number of objects the plan creates.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Insert the planned copies into `dest`, all or nothing.
    pub fn commit(self, dest: &mut ObjectStore) -> CloneResult<CloneOutcome> {
        for root in &self.roots {
            if let Placement::Under { parent, .. } = &root.placement {
                if !dest.contains(parent) {
                    return Err(CloneError::failed(format!(
                        "destination parent {parent} not found"
                    )));
                }
            }
        }
        if let Some(taken) = self.objects.iter().find(|o| dest.contains(&o.id)) {
            return Err(CloneError::failed(format!(
                "identifier {} is already in use",
                taken.id
            )));
        }

        let traces: Vec<TraceEdge> = self
            .objects
            .iter()
            .flat_map(|o| {
                o.trace_links()
                    .into_iter()
                    .map(|(t, link)| TraceEdge::new(o.id, t, link.target))
            })
            .collect();
        let positions: HashMap<ObjectId, Option<usize>> = self
            .roots
            .iter()
            .map(|r| {
                let position = match r.placement {
                    Placement::Under { position, .. } | Placement::Document { position } => {
                        position
                    }
                };
                (r.id, position)
            })
            .collect();

        let dirty_before = dest.dirty().clone();
        let count = self.objects.len();
        let mut inserted_roots = Vec::new();
        for object in self.objects {
            let id = object.id;
            let position = positions.get(&id).copied().flatten();
            if let Err(err) = dest.insert(object, position) {
                for root in inserted_roots.iter().rev() {
                    // Only fails if the root is already gone.
                    let _ = dest.remove(root);
                }
                dest.restore_dirty(dirty_before);
                return Err(CloneError::failed(format!(
                    "inserting {id} failed: {err}"
                )));
            }
            if positions.contains_key(&id) {
                inserted_roots.push(id);
            }
        }

        let roots: Vec<ObjectId> = self.roots.iter().map(|r| r.id).collect();
        info!(roots = roots.len(), objects = count, traces = traces.len(), "clone committed");
        Ok(CloneOutcome {
            roots,
            remap: self.remap,
            traces,
        })
    }
}

/// Map each node of `ids` to the node whose child list reached it.
fn parent_links(source: &impl ObjectSource, ids: &[ObjectId]) -> HashMap<ObjectId, ObjectId> {
    let members: HashSet<&ObjectId> = ids.iter().collect();
    let mut parent_of = HashMap::new();
    for id in ids {
        let Some(obj) = source.object(id) else {
            continue;
        };
        for child in &obj.children {
            if members.contains(child) {
                parent_of.entry(*child).or_insert(*id);
            }
        }
    }
    parent_of
}

fn copy_node(original: &Object, parent: Option<ObjectId>, remap: &IdRemap) -> Object {
    let mut copy = original.clone();
    copy.id = remap.resolve(&original.id);
    copy.parent = parent;
    copy.children.clear();
    for (_, value) in copy.properties.iter_mut() {
        if let PropertyValue::Trace(links) = value {
            for link in links.iter_mut() {
                link.target = remap.resolve(&link.target);
            }
        }
    }
    copy
}

/// Copy placed below another object. Documents only exist at the top of a
/// tree, so a document source becomes an object titled after it.
fn copy_nested(original: &Object, parent: Option<ObjectId>, remap: &IdRemap) -> Object {
    let mut copy = copy_node(original, parent, remap);
    if let ObjectKind::Document(meta) = &copy.kind {
        let name = meta.name.clone();
        copy.kind = ObjectKind::Object;
        if !copy.properties.contains("title") {
            // "title" is a text property, never a trace; insert cannot fail.
            let _ = copy.properties.insert("title", PropertyValue::Text(name));
        }
    }
    copy
}

fn copy_root(original: &Object, root: &CloneRoot, remap: &IdRemap) -> CloneResult<Object> {
    let mut copy = match &root.placement {
        Placement::Under { parent, .. } => copy_nested(original, Some(*parent), remap),
        Placement::Document { .. } => {
            let mut copy = copy_node(original, None, remap);
            if let ObjectKind::Object = copy.kind {
                copy.kind = ObjectKind::Document(DocumentMeta::named(original.label()));
            }
            copy
        }
    };
    if let Some(name) = &root.rename {
        match &mut copy.kind {
            ObjectKind::Document(meta) => meta.name = name.clone(),
            ObjectKind::Object => {
                copy.properties
                    .insert("title", PropertyValue::Text(name.clone()))?;
            }
        }
    }
    Ok(copy)
}
