//! On-disk project format for Arche.
//!
//! A project is a directory holding a manifest, one JSON file per object,
//! and a shared asset folder:
//!
//! ```text
//! <project>/project.json          format version, id, name, document ids
//! <project>/objects/<uuid>.json   one file per object (documents included)
//! <project>/assets/...            files referenced by file properties
//! ```
//!
//! All writes go through a temporary file that is atomically moved into
//! place. Writing is explicit: [`ProjectDir::flush`] persists exactly the
//! objects recorded in the store's dirty set.

pub mod assets;
pub mod error;
mod io;
pub mod layout;
pub mod manifest;
pub mod project;

pub use assets::{AssetInfo, AssetStore};
pub use error::{PersistError, PersistResult};
pub use layout::{PersistOptions, ProjectLayout, MANIFEST_FILE, OBJECTS_DIR};
pub use manifest::{ProjectManifest, FORMAT_VERSION};
pub use project::{FlushReport, LoadedProject, ProjectDir};
