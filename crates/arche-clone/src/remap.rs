use std::collections::{HashMap, HashSet};

use arche_types::ObjectId;

/// Old -> new identifier table for a single clone invocation.
///
/// Built while planning and handed back with the outcome. A table is never
/// shared between invocations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdRemap {
    map: HashMap<ObjectId, ObjectId>,
    /// Source ids in allocation (pre-order) order.
    order: Vec<ObjectId>,
    allocated: HashSet<ObjectId>,
}

impl IdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `old -> new`. Returns `false` if `old` was already mapped.
    pub(crate) fn insert(&mut self, old: ObjectId, new: ObjectId) -> bool {
        if self.map.contains_key(&old) {
            return false;
        }
        self.map.insert(old, new);
        self.order.push(old);
        self.allocated.insert(new);
        true
    }

    /// New identifier for `old`, if it was cloned in this invocation.
    pub fn get(&self, old: &ObjectId) -> Option<ObjectId> {
        self.map.get(old).copied()
    }

    /// Remap `id` if it was cloned, otherwise return it unchanged.
    pub fn resolve(&self, id: &ObjectId) -> ObjectId {
        self.get(id).unwrap_or(*id)
    }

    /// Returns `true` if `id` was cloned in this invocation.
    pub fn contains_source(&self, id: &ObjectId) -> bool {
        self.map.contains_key(id)
    }

    /// Returns `true` if `id` was handed out as a new identifier.
    pub fn is_allocated(&self, id: &ObjectId) -> bool {
        self.allocated.contains(id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// `(old, new)` pairs in allocation order.
    pub fn pairs(&self) -> impl Iterator<Item = (ObjectId, ObjectId)> + '_ {
        self.order.iter().map(|old| (*old, self.map[old]))
    }
}
