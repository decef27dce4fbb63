use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use arche_persist::{PersistOptions, ProjectDir};
use arche_store::{ObjectSource, ObjectStore};
use arche_types::{ArchetypeId, ObjectId};

use crate::catalog::{ArchetypeKind, Catalog, CATALOG_FILE};
use crate::error::{LibraryError, LibraryResult};

/// A catalog entry resolved against its profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archetype {
    pub id: ArchetypeId,
    pub kind: ArchetypeKind,
    pub source: String,
    pub root: Option<ObjectId>,
    pub description: String,
}

/// Everything needed to clone one archetype: where to read from and which
/// subtrees to copy.
#[derive(Debug)]
pub struct Template<'a> {
    pub archetype: &'a Archetype,
    /// Read-only source graph. Cloning never writes to it.
    pub source: &'a ObjectStore,
    /// Roots to clone: the archetype root, or every document of a project
    /// archetype in order.
    pub roots: Vec<ObjectId>,
}

/// A named, read-only group of archetypes with their source projects
/// loaded.
#[derive(Debug)]
pub struct Profile {
    name: String,
    path: PathBuf,
    archetypes: Vec<Archetype>,
    sources: HashMap<String, ObjectStore>,
}

impl Profile {
    /// Load `<dir>/catalog.toml` and every source project it names.
    pub(crate) fn load(name: &str, dir: &Path, options: &PersistOptions) -> LibraryResult<Self> {
        let catalog = Catalog::read(&dir.join(CATALOG_FILE))?;
        let mut sources: HashMap<String, ObjectStore> = HashMap::new();
        let mut archetypes = Vec::with_capacity(catalog.archetypes.len());

        for entry in catalog.archetypes {
            if !sources.contains_key(&entry.source) {
                let loaded = ProjectDir::open(dir.join(&entry.source), options)?.load()?;
                if !loaded.orphans.is_empty() {
                    warn!(
                        profile = name,
                        source = %entry.source,
                        orphans = loaded.orphans.len(),
                        "archetype source has orphan files"
                    );
                }
                sources.insert(entry.source.clone(), loaded.store);
            }
            let archetype = Archetype {
                id: ArchetypeId::new(name, entry.name.as_str())?,
                kind: entry.kind,
                source: entry.source,
                root: entry.root,
                description: entry.description,
            };
            if let Some(source) = sources.get(&archetype.source) {
                check_shape(&archetype, source)?;
            }
            archetypes.push(archetype);
        }

        debug!(profile = name, archetypes = archetypes.len(), "loaded profile");
        Ok(Self {
            name: name.to_string(),
            path: dir.to_path_buf(),
            archetypes,
            sources,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archetypes in catalog order.
    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Look up an archetype by name.
    pub fn get(&self, name: &str) -> LibraryResult<&Archetype> {
        self.archetypes
            .iter()
            .find(|a| a.id.name() == name)
            .ok_or_else(|| match ArchetypeId::new(self.name.as_str(), name) {
                Ok(id) => LibraryError::ArchetypeNotFound(id),
                Err(e) => LibraryError::Type(e),
            })
    }

    /// Resolve an archetype into a cloneable template.
    pub fn template(&self, name: &str) -> LibraryResult<Template<'_>> {
        let archetype = self.get(name)?;
        let source = self
            .sources
            .get(&archetype.source)
            .ok_or_else(|| LibraryError::ArchetypeNotFound(archetype.id.clone()))?;
        let roots = match archetype.root {
            Some(root) => vec![root],
            None => source.documents().to_vec(),
        };
        Ok(Template {
            archetype,
            source,
            roots,
        })
    }
}

fn check_shape(archetype: &Archetype, source: &ObjectStore) -> LibraryResult<()> {
    let mismatch = |reason| LibraryError::KindMismatch {
        id: archetype.id.clone(),
        expected: archetype.kind.as_str(),
        reason,
    };
    match (archetype.kind, archetype.root) {
        (ArchetypeKind::Project, _) => {
            if source.documents().is_empty() {
                return Err(mismatch("its source has no documents"));
            }
        }
        (kind, Some(root)) => {
            let obj = source.object(&root).ok_or_else(|| LibraryError::MissingRoot {
                id: archetype.id.clone(),
                root,
            })?;
            if kind == ArchetypeKind::Document && !obj.is_document() {
                return Err(mismatch("its root is not a document"));
            }
        }
        // Rejected when the catalog is read.
        (_, None) => {}
    }
    Ok(())
}
