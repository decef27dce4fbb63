//! Rendering bridge for Arche.
//!
//! Document templates are rendered outside this workspace. They reach the
//! object graph only through a fixed set of named, read-only queries
//! collected in [`QueryRegistry`]. A [`RenderContext`] borrows the store and
//! trace index immutably, so no query can change the graph it reads.
//!
//! # Quick Start
//!
//! ```rust
//! use arche_bridge::{QueryArgs, QueryRegistry, QueryValue, RenderContext};
//! use arche_store::{DocumentMeta, Object, ObjectStore};
//! use arche_trace::TraceGraph;
//!
//! let mut store = ObjectStore::new("demo");
//! let doc = Object::document(DocumentMeta::named("SRS"));
//! let doc_id = doc.id;
//! store.put(doc).unwrap();
//! let traces = TraceGraph::rebuild(&store);
//!
//! let ctx = RenderContext::new(&store, &traces).rendering(doc_id);
//! let registry = QueryRegistry::standard();
//! let value = registry
//!     .call(&ctx, "current_document", &QueryArgs::new())
//!     .unwrap();
//! assert_eq!(value, QueryValue::Id(doc_id));
//! ```

pub mod context;
pub mod error;
pub mod queries;
pub mod registry;
pub mod value;

pub use context::RenderContext;
pub use error::{BridgeError, BridgeResult};
pub use registry::{QueryDef, QueryFn, QueryRegistry};
pub use value::{
    AssetPayload, MatrixView, ObjectSummary, ObjectView, QueryArg, QueryArgs, QueryValue,
};
