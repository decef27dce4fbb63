use std::path::PathBuf;

use arche_persist::PersistError;
use arche_types::{ArchetypeId, ObjectId, TypeError};

/// Errors from reading the archetype library.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("archetype not found: {0}")]
    ArchetypeNotFound(ArchetypeId),

    #[error("invalid catalog {path}: {reason}")]
    InvalidCatalog { path: PathBuf, reason: String },

    /// A catalog entry points at a root that its source does not contain.
    #[error("archetype {id} refers to missing root {root}")]
    MissingRoot { id: ArchetypeId, root: ObjectId },

    /// The root's shape does not fit the declared archetype kind.
    #[error("archetype {id} is declared as {expected} but {reason}")]
    KindMismatch {
        id: ArchetypeId,
        expected: &'static str,
        reason: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;
