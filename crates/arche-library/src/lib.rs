//! Archetype library for Arche.
//!
//! Archetypes are immutable templates for objects, documents, and whole
//! projects. They live in a library directory grouped into profiles, each
//! with a `catalog.toml` and one or more source projects stored in the
//! regular project format. The library is read-only at run time; cloning an
//! archetype copies from the loaded source graph and never writes back.

pub mod catalog;
pub mod error;
pub mod library;
pub mod profile;

pub use catalog::{ArchetypeKind, Catalog, CatalogEntry, CATALOG_FILE};
pub use error::{LibraryError, LibraryResult};
pub use library::Library;
pub use profile::{Archetype, Profile, Template};
