//! The canonical in-memory arena of a project.
//!
//! [`ObjectStore`] keeps every object of a project in a [`HashMap`] keyed by
//! identifier, which gives O(1) lookup for trace resolution. Containment is
//! stored on the objects themselves (`parent` + ordered `children`), and the
//! project keeps the ordered list of document roots.
//!
//! # Invariants
//!
//! - Identifiers are unique; `put` never replaces an object.
//! - Document roots have no parent and are listed in the project exactly once.
//! - Every other object has exactly one parent that lists it exactly once.
//! - Containment is acyclic; `reparent` refuses to create a cycle.
//!
//! The store does not know about the trace index. Removing an object leaves
//! trace edges that point at it in place; the caller decides whether they
//! dangle or get purged.

use std::collections::HashMap;

use tracing::debug;

use arche_types::{ClassTag, ObjectId, PropertyValue, TraceLink, TraceType};

use crate::dirty::DirtySet;
use crate::error::{StoreError, StoreResult};
use crate::object::{DocumentMeta, Object, ObjectKind, Project};
use crate::traits::ObjectSource;

/// Authoritative lookup and mutation of a project's object graph.
#[derive(Clone, Debug)]
pub struct ObjectStore {
    project: Project,
    objects: HashMap<ObjectId, Object>,
    dirty: DirtySet,
}

impl ObjectStore {
    /// Create a store for a new, empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: Project::new(name),
            objects: HashMap::new(),
            dirty: DirtySet {
                project: true,
                ..DirtySet::default()
            },
        }
    }

    /// Rebuild a store from persisted parts and validate its structure.
    ///
    /// Objects must already carry consistent `parent`/`children` links. The
    /// resulting store starts clean (nothing to flush).
    pub fn from_parts(
        project: Project,
        objects: impl IntoIterator<Item = Object>,
    ) -> StoreResult<Self> {
        let mut map = HashMap::new();
        for obj in objects {
            if map.contains_key(&obj.id) {
                return Err(StoreError::DuplicateIdentifier(obj.id));
            }
            map.insert(obj.id, obj);
        }
        let store = Self {
            project,
            objects: map,
            dirty: DirtySet::default(),
        };
        store.validate()?;
        Ok(store)
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// Look up an object. Fails with [`StoreError::ObjectNotFound`] for
    /// unknown or stale identifiers.
    pub fn get(&self, id: &ObjectId) -> StoreResult<&Object> {
        self.objects.get(id).ok_or(StoreError::ObjectNotFound(*id))
    }

    /// Look up an object, mapping a miss to `None`.
    pub fn try_get(&self, id: &ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of registered objects (documents included).
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All identifiers, sorted.
    pub fn ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Iterate all objects in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Document roots in project order.
    pub fn documents(&self) -> &[ObjectId] {
        &self.project.documents
    }

    pub fn rename_project(&mut self, name: impl Into<String>) {
        self.project.name = name.into();
        self.dirty.project = true;
    }

    // ---------------------------------------------------------------
    // Containment navigation
    // ---------------------------------------------------------------

    /// Ordered children of `id`.
    pub fn children(&self, id: &ObjectId) -> StoreResult<&[ObjectId]> {
        Ok(&self.get(id)?.children)
    }

    /// Parent of `id`; `None` for document roots.
    pub fn parent(&self, id: &ObjectId) -> StoreResult<Option<ObjectId>> {
        Ok(self.get(id)?.parent)
    }

    /// Pre-order identifiers of the subtree rooted at `id` (root first).
    pub fn subtree(&self, id: &ObjectId) -> StoreResult<Vec<ObjectId>> {
        self.get(id)?;
        Ok(self.subtree_ids(id))
    }

    /// The document root that owns `id` (a document owns itself).
    pub fn document_of(&self, id: &ObjectId) -> StoreResult<ObjectId> {
        let mut current = self.get(id)?;
        // Bounded walk: a validated store is acyclic, but never spin forever.
        for _ in 0..=self.objects.len() {
            match current.parent {
                None => return Ok(current.id),
                Some(parent) => current = self.get(&parent)?,
            }
        }
        Err(StoreError::InvalidStructure {
            id: *id,
            reason: "parent chain does not terminate".into(),
        })
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: &ObjectId, node: &ObjectId) -> bool {
        let mut current = self.objects.get(node).and_then(|o| o.parent);
        let mut steps = 0;
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.objects.len() {
                return false;
            }
            current = self.objects.get(&id).and_then(|o| o.parent);
        }
        false
    }

    /// All objects in document order: documents in project order, each
    /// walked in pre-order.
    pub fn document_order(&self) -> Vec<ObjectId> {
        self.project
            .documents
            .iter()
            .flat_map(|doc| self.subtree_ids(doc))
            .collect()
    }

    /// Objects carrying at least one of `classes`, in document order.
    pub fn objects_with_classes(&self, classes: &[ClassTag]) -> Vec<ObjectId> {
        if classes.is_empty() {
            return Vec::new();
        }
        self.document_order()
            .into_iter()
            .filter(|id| {
                self.objects
                    .get(id)
                    .is_some_and(|obj| obj.has_any_class(classes))
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Register a newly created or cloned object, appending it to its
    /// parent's children (or to the project's documents).
    pub fn put(&mut self, object: Object) -> StoreResult<()> {
        self.insert(object, None)
    }

    /// Register an object at `position` among its siblings. Positions past
    /// the end append.
    pub fn insert(&mut self, object: Object, position: Option<usize>) -> StoreResult<()> {
        let id = object.id;
        if self.objects.contains_key(&id) {
            return Err(StoreError::DuplicateIdentifier(id));
        }
        if !object.children.is_empty() {
            return Err(StoreError::InvalidStructure {
                id,
                reason: "objects are registered without children; add children afterwards".into(),
            });
        }

        match (&object.kind, object.parent) {
            (ObjectKind::Document(_), Some(_)) => {
                return Err(StoreError::InvalidStructure {
                    id,
                    reason: "document roots have no parent".into(),
                });
            }
            (ObjectKind::Object, None) => {
                return Err(StoreError::InvalidStructure {
                    id,
                    reason: "objects must be placed under a parent".into(),
                });
            }
            (ObjectKind::Document(_), None) => {
                insert_at(&mut self.project.documents, id, position);
                self.dirty.project = true;
            }
            (ObjectKind::Object, Some(parent_id)) => {
                let parent = self
                    .objects
                    .get_mut(&parent_id)
                    .ok_or(StoreError::ObjectNotFound(parent_id))?;
                insert_at(&mut parent.children, id, position);
                self.mark(parent_id);
            }
        }

        debug!(object = %id.short_id(), kind = %object.kind, "registered object");
        self.objects.insert(id, object);
        self.mark(id);
        Ok(())
    }

    /// Remove `id` and its whole subtree, detaching it from its parent.
    ///
    /// Returns the removed identifiers in pre-order. Trace edges are not
    /// touched here.
    pub fn remove(&mut self, id: &ObjectId) -> StoreResult<Vec<ObjectId>> {
        let parent = self.get(id)?.parent;
        let document = self.document_of(id).ok();
        let removed = self.subtree_ids(id);

        match parent {
            Some(parent_id) => {
                if let Some(p) = self.objects.get_mut(&parent_id) {
                    p.children.retain(|c| c != id);
                }
                self.mark(parent_id);
            }
            None => {
                self.project.documents.retain(|d| d != id);
                self.dirty.project = true;
            }
        }

        for rid in &removed {
            self.objects.remove(rid);
            self.dirty.forget(*rid, document);
        }
        debug!(object = %id.short_id(), count = removed.len(), "removed subtree");
        Ok(removed)
    }

    /// Move `id` under `new_parent` at `position` (append when `None`).
    ///
    /// Document roots cannot be moved, and an object cannot be moved into
    /// its own subtree.
    pub fn reparent(
        &mut self,
        id: &ObjectId,
        new_parent: &ObjectId,
        position: Option<usize>,
    ) -> StoreResult<()> {
        let obj = self.get(id)?;
        if obj.is_document() {
            return Err(StoreError::InvalidStructure {
                id: *id,
                reason: "document roots cannot be moved".into(),
            });
        }
        let old_parent = obj.parent;
        self.get(new_parent)?;
        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(StoreError::ContainmentCycle {
                object: *id,
                parent: *new_parent,
            });
        }

        if let Some(old) = old_parent {
            if let Some(p) = self.objects.get_mut(&old) {
                p.children.retain(|c| c != id);
            }
            self.mark(old);
        }
        if let Some(p) = self.objects.get_mut(new_parent) {
            insert_at(&mut p.children, *id, position);
        }
        if let Some(o) = self.objects.get_mut(id) {
            o.parent = Some(*new_parent);
        }
        self.mark(*new_parent);
        self.mark(*id);
        Ok(())
    }

    /// Set (insert or replace) a property. Returns the previous value.
    pub fn set_property(
        &mut self,
        id: &ObjectId,
        name: impl Into<String>,
        value: PropertyValue,
    ) -> StoreResult<Option<PropertyValue>> {
        let obj = self.get_mut(id)?;
        let previous = obj.properties.insert(name, value)?;
        self.mark(*id);
        Ok(previous)
    }

    /// Remove a property. Returns the removed value, if any.
    pub fn remove_property(
        &mut self,
        id: &ObjectId,
        name: &str,
    ) -> StoreResult<Option<PropertyValue>> {
        let removed = self.get_mut(id)?.properties.remove(name);
        if removed.is_some() {
            self.mark(*id);
        }
        Ok(removed)
    }

    /// Replace the class tags of an object (duplicates are dropped).
    pub fn set_classes(&mut self, id: &ObjectId, classes: Vec<ClassTag>) -> StoreResult<()> {
        let obj = self.get_mut(id)?;
        obj.classes.clear();
        for tag in classes {
            obj.add_class(tag);
        }
        self.mark(*id);
        Ok(())
    }

    /// Replace the metadata of a document root.
    pub fn set_document_meta(&mut self, id: &ObjectId, meta: DocumentMeta) -> StoreResult<()> {
        let obj = self.get_mut(id)?;
        match &mut obj.kind {
            ObjectKind::Document(current) => *current = meta,
            ObjectKind::Object => {
                return Err(StoreError::InvalidStructure {
                    id: *id,
                    reason: "only document roots carry document metadata".into(),
                });
            }
        }
        self.mark(*id);
        Ok(())
    }

    /// Append a trace link to `source`'s trace property `trace_type`.
    /// Returns `false` if the link was already present.
    pub fn add_trace_link(
        &mut self,
        source: &ObjectId,
        trace_type: &TraceType,
        link: TraceLink,
    ) -> StoreResult<bool> {
        let added = self.get_mut(source)?.properties.push_trace(trace_type, link)?;
        if added {
            self.mark(*source);
        }
        Ok(added)
    }

    /// Remove the link `source --trace_type--> target`. Returns `true` if it
    /// existed.
    pub fn remove_trace_link(
        &mut self,
        source: &ObjectId,
        trace_type: &TraceType,
        target: &ObjectId,
    ) -> StoreResult<bool> {
        let removed = self
            .get_mut(source)?
            .properties
            .remove_trace(trace_type, target);
        if removed {
            self.mark(*source);
        }
        Ok(removed)
    }

    /// Remove every trace link pointing at `target` from every object.
    ///
    /// Returns the `(source, trace type)` pairs that were edited.
    pub fn remove_links_to(&mut self, target: &ObjectId) -> Vec<(ObjectId, TraceType)> {
        let mut edited = Vec::new();
        for obj in self.objects.values_mut() {
            let types: Vec<TraceType> = obj
                .properties
                .traces()
                .filter(|(_, links)| links.iter().any(|l| &l.target == target))
                .map(|(t, _)| t)
                .collect();
            for t in types {
                obj.properties.remove_trace(&t, target);
                edited.push((obj.id, t));
            }
        }
        for (source, _) in &edited {
            self.mark(*source);
        }
        edited
    }

    // ---------------------------------------------------------------
    // Dirty tracking
    // ---------------------------------------------------------------

    /// Changes not yet flushed to disk.
    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Take the pending changes, leaving the store clean.
    pub fn take_dirty(&mut self) -> DirtySet {
        std::mem::take(&mut self.dirty)
    }

    /// Reset pending changes to an earlier snapshot after a rollback.
    pub fn restore_dirty(&mut self, dirty: DirtySet) {
        self.dirty = dirty;
    }

    /// Mark every object dirty, e.g. before writing to a new location.
    pub fn mark_all_dirty(&mut self) {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        for id in ids {
            self.mark(id);
        }
        self.dirty.project = true;
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Check containment invariants: parent/children symmetry, document
    /// listing, and acyclicity (every object reachable from a document).
    pub fn validate(&self) -> StoreResult<()> {
        for doc in &self.project.documents {
            let obj = self.get(doc)?;
            if !obj.is_document() || obj.parent.is_some() {
                return Err(invalid(*doc, "listed as a document but is not a document root"));
            }
            if self.project.documents.iter().filter(|d| *d == doc).count() != 1 {
                return Err(invalid(*doc, "listed more than once in the project"));
            }
        }

        for obj in self.objects.values() {
            match (&obj.kind, obj.parent) {
                (ObjectKind::Document(_), Some(_)) => {
                    return Err(invalid(obj.id, "document root has a parent"));
                }
                (ObjectKind::Document(_), None) => {
                    if !self.project.documents.contains(&obj.id) {
                        return Err(invalid(obj.id, "document is not listed in the project"));
                    }
                }
                (ObjectKind::Object, None) => {
                    return Err(invalid(obj.id, "object has no parent"));
                }
                (ObjectKind::Object, Some(parent_id)) => {
                    let parent = self.objects.get(&parent_id).ok_or_else(|| {
                        invalid(obj.id, &format!("parent {parent_id} does not exist"))
                    })?;
                    if parent.children.iter().filter(|c| **c == obj.id).count() != 1 {
                        return Err(invalid(
                            obj.id,
                            "parent does not list this object exactly once",
                        ));
                    }
                }
            }
            for child in &obj.children {
                let child_obj = self.objects.get(child).ok_or_else(|| {
                    invalid(obj.id, &format!("child {child} does not exist"))
                })?;
                if child_obj.parent != Some(obj.id) {
                    return Err(invalid(*child, "child does not point back at its parent"));
                }
            }
        }

        let reachable = self.document_order();
        if reachable.len() != self.objects.len() {
            let reached: std::collections::HashSet<&ObjectId> = reachable.iter().collect();
            let stray = self
                .objects
                .keys()
                .find(|id| !reached.contains(id))
                .copied()
                .unwrap_or_else(ObjectId::new);
            return Err(invalid(stray, "not reachable from any document (cycle)"));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Internal helpers
    // ---------------------------------------------------------------

    fn get_mut(&mut self, id: &ObjectId) -> StoreResult<&mut Object> {
        self.objects
            .get_mut(id)
            .ok_or(StoreError::ObjectNotFound(*id))
    }

    fn mark(&mut self, id: ObjectId) {
        let document = self.document_of(&id).ok();
        self.dirty.touch(id, document);
    }
}

impl ObjectSource for ObjectStore {
    fn object(&self, id: &ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }
}

fn insert_at(list: &mut Vec<ObjectId>, id: ObjectId, position: Option<usize>) {
    match position {
        Some(pos) if pos < list.len() => list.insert(pos, id),
        _ => list.push(id),
    }
}

fn invalid(id: ObjectId, reason: &str) -> StoreError {
    StoreError::InvalidStructure {
        id,
        reason: reason.to_string(),
    }
}
