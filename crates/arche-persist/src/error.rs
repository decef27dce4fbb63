use std::path::PathBuf;

use arche_store::StoreError;
use arche_types::{ObjectId, TypeError};

/// Errors from reading or writing project directories.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error in {path}: {reason}")]
    Serialization { path: PathBuf, reason: String },

    /// The directory has no project manifest.
    #[error("not a project directory: {0}")]
    NotAProject(PathBuf),

    /// `create` was pointed at a directory that already holds a project.
    #[error("project already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("unsupported project format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    /// An object file's name disagrees with the identifier inside it.
    #[error("object file {path} contains object {id}")]
    MisnamedObject { path: PathBuf, id: ObjectId },

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;
