use arche_types::{ObjectId, TypeError};

/// Errors from planning or committing a clone.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    /// A requested source root does not exist in the source graph.
    #[error("clone source not found: {0}")]
    SourceNotFound(ObjectId),

    /// The clone could not be completed. The destination is unchanged.
    #[error("clone failed: {reason}")]
    CloneFailed { reason: String },

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl CloneError {
    pub(crate) fn failed(reason: impl Into<String>) -> Self {
        Self::CloneFailed {
            reason: reason.into(),
        }
    }
}

/// Result alias for clone operations.
pub type CloneResult<T> = Result<T, CloneError>;
