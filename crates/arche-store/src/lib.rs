//! Object store for Arche.
//!
//! This crate owns the canonical in-memory graph of a project: the project
//! record, its ordered document roots, and every object below them. Objects
//! are kept in an arena keyed by [`ObjectId`](arche_types::ObjectId) so that
//! trace targets resolve in O(1), and containment is stored as explicit
//! `parent`/`children` links on each object.
//!
//! # Types
//!
//! - [`Object`] -- a node with class tags, ordered properties, and children
//! - [`ObjectKind`] -- plain object or document root (with [`DocumentMeta`])
//! - [`Project`] -- the unit of persistence, owning the document list
//! - [`ObjectStore`] -- lookup, mutation, and dirty tracking
//! - [`ObjectSource`] -- read-only access shared by live stores and libraries
//!
//! # Design Rules
//!
//! 1. Identifiers are never reused or rewritten; `put` rejects duplicates.
//! 2. Containment is a forest with one tree per document.
//! 3. Reads never perform I/O and never mark anything dirty.
//! 4. Trace edges live in object properties; their global index is kept by
//!    the trace graph, not here.

pub mod dirty;
pub mod error;
pub mod object;
pub mod store;
pub mod traits;

pub use dirty::DirtySet;
pub use error::{StoreError, StoreResult};
pub use object::{DocumentMeta, Object, ObjectKind, Project};
pub use store::ObjectStore;
pub use traits::ObjectSource;
