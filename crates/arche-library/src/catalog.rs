//! Profile catalogs (`catalog.toml`).
//!
//! ```toml
//! [[archetype]]
//! name = "requirement"
//! kind = "object"
//! source = "templates"
//! root = "0190a1b2-..."
//! description = "A single requirement with rationale"
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use arche_types::ObjectId;

use crate::error::{LibraryError, LibraryResult};

/// File name of a profile catalog.
pub const CATALOG_FILE: &str = "catalog.toml";

/// What an archetype instantiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchetypeKind {
    /// A subtree placed under an existing object.
    Object,
    /// A new document root.
    Document,
    /// Every document of the source project.
    Project,
}

impl ArchetypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Document => "document",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for ArchetypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `[[archetype]]` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: ArchetypeKind,
    /// Directory (relative to the profile) holding the source project.
    pub source: String,
    /// Root object; omitted for project archetypes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Parsed `catalog.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "archetype")]
    pub archetypes: Vec<CatalogEntry>,
}

impl Catalog {
    /// Read and check a catalog file.
    pub fn read(path: &Path) -> LibraryResult<Self> {
        let text = fs::read_to_string(path)?;
        let catalog: Catalog = toml::from_str(&text).map_err(|e| LibraryError::InvalidCatalog {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        catalog.check(path)?;
        Ok(catalog)
    }

    /// Write the catalog as TOML.
    pub fn write(&self, path: &Path) -> LibraryResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| LibraryError::InvalidCatalog {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, text)?;
        Ok(())
    }

    fn check(&self, path: &Path) -> LibraryResult<()> {
        let invalid = |reason: String| LibraryError::InvalidCatalog {
            path: path.to_path_buf(),
            reason,
        };
        let mut names = HashSet::new();
        for entry in &self.archetypes {
            if !names.insert(entry.name.as_str()) {
                return Err(invalid(format!("duplicate archetype `{}`", entry.name)));
            }
            if !is_source_name(&entry.source) {
                return Err(invalid(format!(
                    "bad source `{}` for `{}`: expected a directory name inside the profile",
                    entry.source, entry.name
                )));
            }
            match (entry.kind, entry.root) {
                (ArchetypeKind::Project, Some(_)) => {
                    return Err(invalid(format!("project archetype `{}` takes no root", entry.name)));
                }
                (ArchetypeKind::Object | ArchetypeKind::Document, None) => {
                    return Err(invalid(format!("archetype `{}` needs a root", entry.name)));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// A source is one plain directory name below the profile directory.
fn is_source_name(source: &str) -> bool {
    if source.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(source).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[archetype]]
name = "requirement"
kind = "object"
source = "templates"
root = "00000000-0000-0000-0000-000000000002"
description = "A requirement"

[[archetype]]
name = "starter"
kind = "project"
source = "starter"
"#;

    #[test]
    fn parses_archetype_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        fs::write(&path, SAMPLE).unwrap();
        let catalog = Catalog::read(&path).unwrap();
        assert_eq!(catalog.archetypes.len(), 2);
        assert_eq!(catalog.archetypes[0].root, Some(ObjectId::from_u128(2)));
        assert_eq!(catalog.archetypes[1].kind, ArchetypeKind::Project);
        assert!(catalog.archetypes[1].description.is_empty());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        let catalog = Catalog {
            archetypes: vec![CatalogEntry {
                name: "doc".into(),
                kind: ArchetypeKind::Document,
                source: "templates".into(),
                root: Some(ObjectId::from_u128(1)),
                description: String::new(),
            }],
        };
        catalog.write(&path).unwrap();
        assert_eq!(Catalog::read(&path).unwrap(), catalog);
    }

    #[test]
    fn rejects_duplicates_and_missing_roots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_FILE);

        let dup = format!("{SAMPLE}\n[[archetype]]\nname = \"starter\"\nkind = \"project\"\nsource = \"x\"\n");
        fs::write(&path, dup).unwrap();
        assert!(matches!(Catalog::read(&path), Err(LibraryError::InvalidCatalog { .. })));

        fs::write(&path, "[[archetype]]\nname = \"a\"\nkind = \"object\"\nsource = \"t\"\n").unwrap();
        assert!(Catalog::read(&path).is_err());

        fs::write(&path, "[[archetype]]\nname = \"a\"\nkind = \"widget\"\nsource = \"t\"\n").unwrap();
        assert!(Catalog::read(&path).is_err());
    }

    #[test]
    fn sources_must_stay_inside_the_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        for source in ["..", "../outside", "/etc", "nested/dir", "a\\\\b", ".", ""] {
            let text = format!(
                "[[archetype]]\nname = \"starter\"\nkind = \"project\"\nsource = \"{source}\"\n"
            );
            fs::write(&path, text).unwrap();
            assert!(
                matches!(Catalog::read(&path), Err(LibraryError::InvalidCatalog { .. })),
                "accepted source {source:?}"
            );
        }
        assert!(is_source_name("templates"));
        assert!(is_source_name("v1.2"));
    }
}
