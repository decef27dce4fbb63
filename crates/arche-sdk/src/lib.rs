//! Editing sessions for Arche.
//!
//! Ties the object store, trace graph, clone engine, archetype library,
//! persistence, and rendering bridge into one [`Workspace`] per project
//! directory. This is the entry point for applications embedding Arche.
//!
//! # Quick Start
//!
//! ```rust
//! use arche_sdk::{TraceFilter, Workspace, WorkspaceConfig};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let ws = Workspace::create(dir.path().join("demo"), "demo", WorkspaceConfig::default()).unwrap();
//! let doc = ws.add_document("Requirements").unwrap();
//! let a = ws.add_object(&doc, Vec::new()).unwrap();
//! let b = ws.add_object(&doc, Vec::new()).unwrap();
//! ws.add_trace(&a, "depends-on", &b, None).unwrap();
//!
//! let impact = ws.impact(&[a], &TraceFilter::Any).unwrap();
//! assert_eq!(impact.ids(), vec![b]);
//! ws.flush().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod workspace;

pub use config::{DanglingPolicy, WorkspaceConfig, CONFIG_FILE};
pub use error::{SdkError, SdkResult};
pub use graph::{CheckReport, Graph, Removal};
pub use workspace::Workspace;

// Re-export key types
pub use arche_bridge::{QueryArgs, QueryValue, RenderContext};
pub use arche_clone::{CloneOutcome, Placement};
pub use arche_library::{Archetype, ArchetypeKind};
pub use arche_persist::FlushReport;
pub use arche_store::{DocumentMeta, Object, ObjectKind};
pub use arche_trace::{DependencyMatrix, ImpactReport, TraceEdge};
pub use arche_types::{
    ArchetypeId, ClassTag, ObjectId, PropertyValue, TraceFilter, TraceLink, TraceType,
};
