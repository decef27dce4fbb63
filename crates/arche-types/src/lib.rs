//! Foundation types for Arche.
//!
//! This crate provides the identity, tagging, and property types used by the
//! object graph and traceability engine. Every other Arche crate depends on
//! `arche-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Stable, globally unique object identifier (UUID v7)
//! - [`ProjectId`] -- Identifier of the project that owns a set of documents
//! - [`ArchetypeId`] -- Library address of a template (`profile/name`)
//! - [`ClassTag`] -- Tag selecting behaviors and templates for an object
//! - [`TraceType`] -- Validated name of a trace relationship
//! - [`TraceFilter`] -- Type filter used by trace lookups and impact analysis
//! - [`PropertyValue`] -- Typed value stored under a property name
//! - [`Properties`] -- Insertion-ordered, name-unique property map

pub mod class;
pub mod error;
pub mod id;
pub mod property;
pub mod trace;

pub use class::ClassTag;
pub use error::TypeError;
pub use id::{ArchetypeId, ObjectId, ProjectId};
pub use property::{AssetPath, EnumValue, Properties, PropertyValue};
pub use trace::{TraceFilter, TraceLink, TraceType};
