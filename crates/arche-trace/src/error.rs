//! Error types for the trace graph.

use arche_types::{ObjectId, TraceType};

/// Errors that can occur during trace graph operations.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// An indexed edge starts at an object that does not exist.
    #[error("trace source not found: {0}")]
    MissingSource(ObjectId),

    /// The index disagrees with the trace properties stored on objects.
    #[error("trace index out of sync for {source_id} --{trace_type}--> {target}: {reason}")]
    IndexMismatch {
        source_id: ObjectId,
        trace_type: TraceType,
        target: ObjectId,
        reason: &'static str,
    },

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for trace graph results.
pub type TraceResult<T> = Result<T, TraceError>;
