use arche_persist::PersistError;

/// Errors returned to the templating layer.
///
/// Lookups of missing objects are not errors; they produce empty values.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("unknown query: {0}")]
    UnknownQuery(String),

    #[error("bad arguments for {query}: {reason}")]
    BadArguments { query: &'static str, reason: String },

    #[error("asset error: {0}")]
    Asset(#[from] PersistError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for bridge queries.
pub type BridgeResult<T> = Result<T, BridgeError>;
