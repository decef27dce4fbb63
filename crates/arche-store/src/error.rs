use arche_types::{ObjectId, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object is not registered. Expected when resolving
    /// dangling trace targets; callers usually map this to an empty result.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object with this identifier is already registered.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(ObjectId),

    /// Moving `object` under `parent` would make it its own ancestor.
    #[error("containment cycle: {object} cannot be placed under {parent}")]
    ContainmentCycle { object: ObjectId, parent: ObjectId },

    /// The object violates a containment rule (wrong kind, missing parent,
    /// inconsistent child lists).
    #[error("invalid structure for {id}: {reason}")]
    InvalidStructure { id: ObjectId, reason: String },

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
