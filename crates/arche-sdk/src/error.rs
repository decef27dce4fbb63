use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("no archetype library configured")]
    NoLibrary,

    #[error("workspace lock poisoned")]
    LockPoisoned,

    #[error("type error: {0}")]
    Type(#[from] arche_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] arche_store::StoreError),

    #[error("trace error: {0}")]
    Trace(#[from] arche_trace::TraceError),

    #[error("clone error: {0}")]
    Clone(#[from] arche_clone::CloneError),

    #[error("persistence error: {0}")]
    Persist(#[from] arche_persist::PersistError),

    #[error("library error: {0}")]
    Library(#[from] arche_library::LibraryError),

    #[error("bridge error: {0}")]
    Bridge(#[from] arche_bridge::BridgeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
