//! Edge types of the trace graph.
//!
//! A [`TraceEdge`] is a fully qualified directed edge. Inside the indices the
//! graph stores the lighter [`EdgeRef`], which only names the trace type and
//! the object on the other end.

use serde::{Deserialize, Serialize};

use arche_types::{ObjectId, TraceType};

/// A directed, typed edge between two object identities.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceEdge {
    pub source: ObjectId,
    pub trace_type: TraceType,
    pub target: ObjectId,
}

impl TraceEdge {
    pub fn new(source: ObjectId, trace_type: TraceType, target: ObjectId) -> Self {
        Self {
            source,
            trace_type,
            target,
        }
    }

    /// Short human-readable form, e.g. `0190a1b2 --depends-on--> 0190a1c4`.
    pub fn summary(&self) -> String {
        format!(
            "{} --{}--> {}",
            self.source.short_id(),
            self.trace_type,
            self.target.short_id()
        )
    }
}

impl std::fmt::Display for TraceEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} --{}--> {}", self.source, self.trace_type, self.target)
    }
}

/// One entry of a forward or reverse index: the trace type and the object on
/// the far end (the target for forward entries, the source for reverse ones).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    pub trace_type: TraceType,
    pub peer: ObjectId,
}

impl EdgeRef {
    pub fn new(trace_type: TraceType, peer: ObjectId) -> Self {
        Self { trace_type, peer }
    }
}
