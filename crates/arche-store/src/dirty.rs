use std::collections::BTreeSet;

use arche_types::ObjectId;

/// Objects and documents changed since the last flush.
///
/// Every mutating store operation records the touched objects and the
/// document that owns them. Removed objects are tracked separately so a
/// flush can delete their files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtySet {
    /// Objects whose persisted form is stale.
    pub objects: BTreeSet<ObjectId>,
    /// Documents owning at least one stale or removed object.
    pub documents: BTreeSet<ObjectId>,
    /// Objects removed from the store.
    pub removed: BTreeSet<ObjectId>,
    /// The project manifest (name, document list) is stale.
    pub project: bool,
}

impl DirtySet {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.removed.is_empty() && !self.project
    }

    pub(crate) fn touch(&mut self, id: ObjectId, document: Option<ObjectId>) {
        self.objects.insert(id);
        if let Some(doc) = document {
            self.documents.insert(doc);
        }
    }

    pub(crate) fn forget(&mut self, id: ObjectId, document: Option<ObjectId>) {
        self.objects.remove(&id);
        self.removed.insert(id);
        if let Some(doc) = document {
            self.documents.insert(doc);
        }
    }
}
