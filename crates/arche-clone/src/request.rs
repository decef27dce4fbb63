use serde::{Deserialize, Serialize};

use arche_types::ObjectId;

/// Tunables for the clone engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOptions {
    /// Candidates drawn per node before giving up with `CloneFailed`.
    pub max_id_attempts: u32,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self { max_id_attempts: 16 }
    }
}

/// Where a cloned root lands in the destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Placement {
    /// As a child of an existing object. `position` among the siblings,
    /// appended when `None`.
    Under {
        parent: ObjectId,
        position: Option<usize>,
    },
    /// As a new document root of the project.
    Document { position: Option<usize> },
}

impl Placement {
    pub fn under(parent: ObjectId) -> Self {
        Self::Under {
            parent,
            position: None,
        }
    }

    pub fn document() -> Self {
        Self::Document { position: None }
    }
}

/// One subtree to clone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneRoot {
    pub source: ObjectId,
    pub placement: Placement,
    /// Name for the copy: the document name for document roots, the
    /// `title` property otherwise.
    pub rename: Option<String>,
}

impl CloneRoot {
    pub fn new(source: ObjectId, placement: Placement) -> Self {
        Self {
            source,
            placement,
            rename: None,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }
}

/// All roots cloned in a single invocation. Roots share one remap table,
/// so traces between them are rewritten too.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneRequest {
    pub roots: Vec<CloneRoot>,
}

impl CloneRequest {
    /// A request for a single root.
    pub fn single(source: ObjectId, placement: Placement) -> Self {
        Self {
            roots: vec![CloneRoot::new(source, placement)],
        }
    }

    pub fn with_root(mut self, root: CloneRoot) -> Self {
        self.roots.push(root);
        self
    }
}
