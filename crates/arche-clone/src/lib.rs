//! Archetype clone engine for Arche.
//!
//! Instantiates new objects, documents, or whole projects by deep-copying
//! template subtrees. Every copy gets a fresh identifier, and trace links
//! between copied nodes are rewritten to point at the copies. Links that
//! leave the cloned set are kept as they are.
//!
//! # Quick Start
//!
//! ```rust
//! use arche_clone::{CloneEngine, CloneOptions, CloneRequest, Placement};
//! use arche_store::{DocumentMeta, Object, ObjectStore};
//!
//! let mut library = ObjectStore::new("library");
//! let templates = Object::document(DocumentMeta::named("Templates"));
//! let templates_id = templates.id;
//! library.put(templates).unwrap();
//! let template = Object::new(templates_id);
//! let template_id = template.id;
//! library.put(template).unwrap();
//!
//! let mut project = ObjectStore::new("project");
//! let srs = Object::document(DocumentMeta::named("SRS"));
//! let srs_id = srs.id;
//! project.put(srs).unwrap();
//!
//! let mut engine = CloneEngine::new(CloneOptions::default());
//! let request = CloneRequest::single(template_id, Placement::under(srs_id));
//! let outcome = engine.clone_into(&library, &mut project, &request).unwrap();
//! assert_eq!(project.children(&srs_id).unwrap(), &outcome.roots[..]);
//! assert!(library.contains(&template_id));
//! ```

pub mod alloc;
pub mod engine;
pub mod error;
pub mod remap;
pub mod request;

pub use alloc::{IdAllocator, SequenceAllocator, UuidAllocator};
pub use engine::{CloneEngine, CloneOutcome, ClonePlan, PlannedRoot};
pub use error::{CloneError, CloneResult};
pub use remap::IdRemap;
pub use request::{CloneOptions, CloneRequest, CloneRoot, Placement};
