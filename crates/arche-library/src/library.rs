//! The archetype library directory.
//!
//! ```text
//! <library>/<profile>/catalog.toml
//! <library>/<profile>/<source>/project.json
//! <library>/<profile>/<source>/objects/...
//! ```
//!
//! The library is only ever read. Profiles are loaded on demand and handed
//! out by value; callers keep them as long as they need.

use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use arche_persist::{PersistOptions, ProjectDir};
use arche_store::ObjectStore;
use arche_types::ArchetypeId;

use crate::catalog::{Catalog, CatalogEntry, CATALOG_FILE};
use crate::error::{LibraryError, LibraryResult};
use crate::profile::{Archetype, Profile};

/// Handle on an archetype library root.
#[derive(Clone, Debug)]
pub struct Library {
    root: PathBuf,
    options: PersistOptions,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>, options: PersistOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all profiles (directories holding a catalog), sorted.
    pub fn profiles(&self) -> LibraryResult<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LibraryError::Io(e.into()))?;
            if entry.file_type().is_dir() && entry.path().join(CATALOG_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// Load a profile and its source projects.
    pub fn profile(&self, name: &str) -> LibraryResult<Profile> {
        let dir = self.root.join(name);
        if !dir.join(CATALOG_FILE).is_file() {
            return Err(LibraryError::ProfileNotFound(name.to_string()));
        }
        let profile = Profile::load(name, &dir, &self.options)?;
        info!(profile = name, archetypes = profile.archetypes().len(), "opened profile");
        Ok(profile)
    }

    /// Load the profile that owns `id`, checking that the archetype exists.
    pub fn profile_for(&self, id: &ArchetypeId) -> LibraryResult<Profile> {
        let profile = self.profile(id.profile())?;
        profile.get(id.name())?;
        Ok(profile)
    }

    /// Every archetype of every profile.
    pub fn archetypes(&self) -> LibraryResult<Vec<Archetype>> {
        let mut all = Vec::new();
        for name in self.profiles()? {
            all.extend(self.profile(&name)?.archetypes().iter().cloned());
        }
        Ok(all)
    }

    /// Add a source project and catalog entries to a profile, creating the
    /// profile if needed. Used to author libraries, never while cloning.
    pub fn publish(
        &self,
        profile: &str,
        source: &str,
        store: &mut ObjectStore,
        entries: Vec<CatalogEntry>,
    ) -> LibraryResult<()> {
        let dir = self.root.join(profile);
        let catalog_path = dir.join(CATALOG_FILE);
        let mut catalog = if catalog_path.is_file() {
            Catalog::read(&catalog_path)?
        } else {
            Catalog::default()
        };

        let source_dir = dir.join(source);
        let project = match ProjectDir::open(&source_dir, &self.options) {
            Ok(existing) => existing,
            Err(_) => ProjectDir::create(&source_dir, &self.options)?,
        };
        project.save_all(store)?;

        catalog
            .archetypes
            .retain(|e| !entries.iter().any(|n| n.name == e.name));
        catalog.archetypes.extend(entries);
        catalog.write(&catalog_path)?;
        // Re-read so a bad entry is reported now rather than on first use.
        Catalog::read(&catalog_path)?;
        info!(profile, source, "published archetypes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ArchetypeKind;
    use arche_store::{DocumentMeta, Object, ObjectSource};
    use arche_types::{ObjectId, PropertyValue};

    struct Fixture {
        _tmp: tempfile::TempDir,
        library: Library,
        doc: ObjectId,
        item: ObjectId,
    }

    /// Profile `standard` with an object, a document and a project archetype.
    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let library = Library::new(tmp.path().join("lib"), PersistOptions::default());

        let mut store = ObjectStore::new("templates");
        let doc = Object::document(DocumentMeta::named("SRS"));
        let doc_id = doc.id;
        store.put(doc).unwrap();
        let item = Object::new(doc_id)
            .with_property("title", PropertyValue::Text("Requirement".into()))
            .unwrap();
        let item_id = item.id;
        store.put(item).unwrap();

        let entries = vec![
            CatalogEntry {
                name: "requirement".into(),
                kind: ArchetypeKind::Object,
                source: "templates".into(),
                root: Some(item_id),
                description: "One requirement".into(),
            },
            CatalogEntry {
                name: "srs".into(),
                kind: ArchetypeKind::Document,
                source: "templates".into(),
                root: Some(doc_id),
                description: String::new(),
            },
            CatalogEntry {
                name: "starter".into(),
                kind: ArchetypeKind::Project,
                source: "templates".into(),
                root: None,
                description: String::new(),
            },
        ];
        library
            .publish("standard", "templates", &mut store, entries)
            .unwrap();
        Fixture {
            _tmp: tmp,
            library,
            doc: doc_id,
            item: item_id,
        }
    }

    #[test]
    fn lists_profiles_and_archetypes() {
        let fx = fixture();
        assert_eq!(fx.library.profiles().unwrap(), vec!["standard".to_string()]);
        let all = fx.library.archetypes().unwrap();
        let names: Vec<String> = all.iter().map(|a| a.id.to_string()).collect();
        assert_eq!(
            names,
            vec!["standard/requirement", "standard/srs", "standard/starter"]
        );
    }

    #[test]
    fn template_resolves_roots() {
        let fx = fixture();
        let profile = fx.library.profile("standard").unwrap();
        let object = profile.template("requirement").unwrap();
        assert_eq!(object.roots, vec![fx.item]);
        assert!(object.source.contains_object(&fx.item));

        let project = profile.template("starter").unwrap();
        assert_eq!(project.roots, vec![fx.doc]);
    }

    #[test]
    fn unknown_names_are_reported() {
        let fx = fixture();
        assert!(matches!(
            fx.library.profile("nope"),
            Err(LibraryError::ProfileNotFound(_))
        ));
        let id: ArchetypeId = "standard/missing".parse().unwrap();
        assert!(matches!(
            fx.library.profile_for(&id),
            Err(LibraryError::ArchetypeNotFound(_))
        ));
    }

    #[test]
    fn document_archetype_must_point_at_a_document() {
        let fx = fixture();
        let mut store = ObjectStore::new("more");
        let doc = Object::document(DocumentMeta::named("D"));
        let doc_id = doc.id;
        store.put(doc).unwrap();
        let obj = Object::new(doc_id);
        let obj_id = obj.id;
        store.put(obj).unwrap();
        fx.library
            .publish(
                "broken",
                "more",
                &mut store,
                vec![CatalogEntry {
                    name: "bad".into(),
                    kind: ArchetypeKind::Document,
                    source: "more".into(),
                    root: Some(obj_id),
                    description: String::new(),
                }],
            )
            .unwrap();
        assert!(matches!(
            fx.library.profile("broken"),
            Err(LibraryError::KindMismatch { .. })
        ));
    }

    #[test]
    fn missing_root_is_reported() {
        let fx = fixture();
        let mut store = ObjectStore::new("empty");
        store.put(Object::document(DocumentMeta::named("D"))).unwrap();
        fx.library
            .publish(
                "ghost",
                "empty",
                &mut store,
                vec![CatalogEntry {
                    name: "gone".into(),
                    kind: ArchetypeKind::Object,
                    source: "empty".into(),
                    root: Some(ObjectId::from_u128(77)),
                    description: String::new(),
                }],
            )
            .unwrap();
        assert!(matches!(
            fx.library.profile("ghost"),
            Err(LibraryError::MissingRoot { .. })
        ));
    }

    #[test]
    fn missing_library_has_no_profiles() {
        let library = Library::new("/no/such/library", PersistOptions::default());
        assert!(library.profiles().unwrap().is_empty());
    }
}
