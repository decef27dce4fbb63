use std::collections::HashSet;

use arche_types::ObjectId;

use crate::object::Object;

/// Read-only access to a set of objects.
///
/// Implemented by the live [`ObjectStore`](crate::ObjectStore) and used by
/// components that only read a graph: the clone engine reads archetype
/// libraries and live projects through it, and never needs mutation.
pub trait ObjectSource {
    /// Look up an object. `None` for unknown ids.
    fn object(&self, id: &ObjectId) -> Option<&Object>;

    /// Returns `true` if `id` is registered.
    fn contains_object(&self, id: &ObjectId) -> bool {
        self.object(id).is_some()
    }

    /// Pre-order identifiers of the subtree rooted at `root` (root first).
    ///
    /// Children that do not resolve, or that were already visited, are
    /// skipped. Returns an empty vec if the
    /// root itself is unknown.
    fn subtree_ids(&self, root: &ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(obj) = self.object(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(obj.children.iter().rev().copied());
        }
        out
    }
}
