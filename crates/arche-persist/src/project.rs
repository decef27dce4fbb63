//! Reading and writing project directories.
//!
//! Every object is stored in its own JSON file under `objects/`, so an edit
//! rewrites only the files of the objects it touched. Writes are driven by
//! the store's [`DirtySet`](arche_store::DirtySet): [`ProjectDir::flush`]
//! writes stale objects, deletes the files of removed ones, rewrites the
//! manifest if needed, and only then clears the dirty set.
//!
//! Loading tolerates stray files: object files that are not reachable from
//! any document are reported as orphans and skipped.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use arche_store::{Object, ObjectSource, ObjectStore};
use arche_types::ObjectId;

use crate::assets::AssetStore;
use crate::error::{PersistError, PersistResult};
use crate::io::{read_json, remove_if_exists, write_json};
use crate::layout::{PersistOptions, ProjectLayout};
use crate::manifest::ProjectManifest;

/// What a flush wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    pub deleted: usize,
    pub manifest: bool,
}

impl FlushReport {
    /// Returns `true` if nothing had to be written.
    pub fn is_noop(&self) -> bool {
        self.written == 0 && self.deleted == 0 && !self.manifest
    }
}

/// A loaded project plus anything suspicious found on disk.
#[derive(Debug)]
pub struct LoadedProject {
    pub store: ObjectStore,
    /// Object files not reachable from any document.
    pub orphans: Vec<PathBuf>,
}

/// Handle on a project directory.
#[derive(Clone, Debug)]
pub struct ProjectDir {
    layout: ProjectLayout,
}

impl ProjectDir {
    /// Create the directory structure for a new project at `root`.
    ///
    /// Fails with [`PersistError::AlreadyExists`] if a manifest is already
    /// there. The manifest itself is written by the first flush.
    pub fn create(root: impl Into<PathBuf>, options: &PersistOptions) -> PersistResult<Self> {
        let layout = ProjectLayout::new(root, options);
        if layout.manifest_path().exists() {
            return Err(PersistError::AlreadyExists(layout.root().to_path_buf()));
        }
        fs::create_dir_all(layout.objects_dir())?;
        fs::create_dir_all(layout.assets_dir())?;
        Ok(Self { layout })
    }

    /// Open an existing project directory.
    pub fn open(root: impl Into<PathBuf>, options: &PersistOptions) -> PersistResult<Self> {
        let layout = ProjectLayout::new(root, options);
        if !layout.manifest_path().is_file() {
            return Err(PersistError::NotAProject(layout.root().to_path_buf()));
        }
        Ok(Self { layout })
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// The project's shared asset folder.
    pub fn assets(&self) -> AssetStore {
        AssetStore::new(self.layout.assets_dir())
    }

    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    /// Read the manifest and every object file, and rebuild the store.
    ///
    /// The store starts clean. Its containment is validated; trace targets
    /// are not, so dangling traces survive a round trip unchanged.
    pub fn load(&self) -> PersistResult<LoadedProject> {
        let manifest: ProjectManifest = read_json(&self.layout.manifest_path())?;
        let project = manifest.into_project()?;

        let mut files: HashMap<ObjectId, (PathBuf, Object)> = HashMap::new();
        let mut orphans = Vec::new();
        for path in self.object_files()? {
            let Some(expected) = ProjectLayout::object_id_of(&path) else {
                warn!(path = %path.display(), "ignoring non-object file");
                orphans.push(path);
                continue;
            };
            let object: Object = read_json(&path)?;
            if object.id != expected {
                return Err(PersistError::MisnamedObject {
                    path,
                    id: object.id,
                });
            }
            files.insert(object.id, (path, object));
        }

        let reachable = reachable_from(&project.documents, &files);
        let mut objects = Vec::with_capacity(reachable.len());
        for (id, (path, object)) in files {
            if reachable.contains(&id) {
                objects.push(object);
            } else {
                warn!(object = %id.short_id(), path = %path.display(), "orphan object file");
                orphans.push(path);
            }
        }
        orphans.sort();

        let store = ObjectStore::from_parts(project, objects)?;
        info!(
            project = %store.project().name,
            objects = store.len(),
            orphans = orphans.len(),
            "loaded project"
        );
        Ok(LoadedProject { store, orphans })
    }

    // ---------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------

    /// Write pending changes and clear the store's dirty set.
    ///
    /// If a write fails the dirty set is left untouched, so a later flush
    /// retries everything.
    pub fn flush(&self, store: &mut ObjectStore) -> PersistResult<FlushReport> {
        let report = self.write_dirty(store)?;
        store.take_dirty();
        if !report.is_noop() {
            info!(
                written = report.written,
                deleted = report.deleted,
                manifest = report.manifest,
                "flushed project"
            );
        }
        Ok(report)
    }

    /// Write every object and the manifest, and delete object files that do
    /// not belong to the store. Used for "save as" and repairs.
    pub fn save_all(&self, store: &mut ObjectStore) -> PersistResult<FlushReport> {
        store.mark_all_dirty();
        let mut report = self.write_dirty(store)?;
        for path in self.object_files()? {
            let stale = ProjectLayout::object_id_of(&path).map_or(true, |id| !store.contains(&id));
            if stale && remove_if_exists(&path)? {
                report.deleted += 1;
            }
        }
        store.take_dirty();
        Ok(report)
    }

    fn write_dirty(&self, store: &ObjectStore) -> PersistResult<FlushReport> {
        let dirty = store.dirty();
        let mut report = FlushReport::default();

        for id in &dirty.objects {
            // Objects touched and then removed are in `removed` as well.
            let Some(object) = store.try_get(id) else {
                continue;
            };
            write_json(&self.layout.object_path(id), object)?;
            debug!(object = %id.short_id(), "wrote object");
            report.written += 1;
        }
        for id in &dirty.removed {
            if store.contains_object(id) {
                continue;
            }
            if remove_if_exists(&self.layout.object_path(id))? {
                report.deleted += 1;
            }
        }
        if dirty.project {
            write_json(
                &self.layout.manifest_path(),
                &ProjectManifest::from_project(store.project()),
            )?;
            report.manifest = true;
        }
        Ok(report)
    }

    /// Files directly inside `objects/`, sorted.
    fn object_files(&self) -> PersistResult<Vec<PathBuf>> {
        let dir = self.layout.objects_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| PersistError::Io(e.into()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Ids reachable from `documents` through the child lists in `files`.
fn reachable_from(
    documents: &[ObjectId],
    files: &HashMap<ObjectId, (PathBuf, Object)>,
) -> HashSet<ObjectId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<ObjectId> = documents.to_vec();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some((_, object)) = files.get(&id) {
            stack.extend(object.children.iter().copied());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use arche_store::DocumentMeta;
    use arche_trace::TraceGraph;
    use arche_types::{ClassTag, PropertyValue, TraceFilter, TraceLink, TraceType};

    fn tt(s: &str) -> TraceType {
        TraceType::new(s).unwrap()
    }

    /// Document with `a` and `b`; `a --depends-on--> b` and a dangling
    /// `a --verifies--> 404`.
    fn sample() -> (ObjectStore, ObjectId, ObjectId, ObjectId) {
        let mut store = ObjectStore::new("Avionics");
        let doc = Object::document(DocumentMeta::named("SRS"));
        let doc_id = doc.id;
        store.put(doc).unwrap();
        let b = Object::new(doc_id)
            .with_class(ClassTag::new("requirement").unwrap())
            .with_property("title", PropertyValue::Text("Braking".into()))
            .unwrap();
        let b_id = b.id;
        store.put(b).unwrap();
        let a = Object::new(doc_id)
            .with_class(ClassTag::new("requirement").unwrap())
            .with_property("title", PropertyValue::Text("ABS".into()))
            .unwrap();
        let a_id = a.id;
        store.put(a).unwrap();
        store
            .add_trace_link(&a_id, &tt("depends-on"), TraceLink::labeled(b_id, "needs"))
            .unwrap();
        store
            .add_trace_link(&a_id, &tt("verifies"), TraceLink::new(ObjectId::from_u128(404)))
            .unwrap();
        (store, doc_id, a_id, b_id)
    }

    fn new_dir() -> (tempfile::TempDir, ProjectDir) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ProjectDir::create(tmp.path().join("proj"), &PersistOptions::default()).unwrap();
        (tmp, dir)
    }

    #[test]
    fn save_then_load_reproduces_the_graph() {
        let (_tmp, dir) = new_dir();
        let (mut store, doc, a, b) = sample();
        let report = dir.flush(&mut store).unwrap();
        assert_eq!(report.written, 3);
        assert!(report.manifest);
        assert!(!store.is_dirty());

        let loaded = ProjectDir::open(dir.root(), &PersistOptions::default())
            .unwrap()
            .load()
            .unwrap();
        assert!(loaded.orphans.is_empty());
        let restored = loaded.store;
        assert_eq!(restored.ids(), store.ids());
        assert_eq!(restored.project(), store.project());
        assert_eq!(restored.children(&doc).unwrap(), &[b, a]);
        assert_eq!(restored.get(&a).unwrap(), store.get(&a).unwrap());

        let graph = TraceGraph::rebuild(&restored);
        assert_eq!(graph.edges(), TraceGraph::rebuild(&store).edges());
        assert_eq!(
            graph.targets_of(&a, &TraceFilter::only(tt("verifies"))),
            vec![ObjectId::from_u128(404)]
        );
        assert_eq!(graph.dangling_edges(&restored).len(), 1);
    }

    #[test]
    fn flush_writes_only_dirty_objects() {
        let (_tmp, dir) = new_dir();
        let (mut store, _, a, _) = sample();
        dir.flush(&mut store).unwrap();

        store
            .set_property(&a, "status", PropertyValue::Text("draft".into()))
            .unwrap();
        let report = dir.flush(&mut store).unwrap();
        assert_eq!(report.written, 1);
        assert!(!report.manifest);
        assert!(dir.flush(&mut store).unwrap().is_noop());
    }

    #[test]
    fn flush_deletes_removed_objects() {
        let (_tmp, dir) = new_dir();
        let (mut store, _, a, b) = sample();
        dir.flush(&mut store).unwrap();

        store.remove(&b).unwrap();
        let report = dir.flush(&mut store).unwrap();
        assert_eq!(report.deleted, 1);
        assert!(!dir.layout().object_path(&b).exists());

        let restored = dir.load().unwrap().store;
        assert!(!restored.contains(&b));
        // The trace to the deleted object now dangles but is still stored.
        let graph = TraceGraph::rebuild(&restored);
        assert!(graph.has_dependency(&a, &b, &TraceFilter::Any));
        assert_eq!(graph.dangling_edges(&restored).len(), 2);
    }

    #[test]
    fn orphan_files_are_reported_and_skipped() {
        let (_tmp, dir) = new_dir();
        let (mut store, doc, _, _) = sample();
        dir.flush(&mut store).unwrap();

        let stray = Object::new(doc);
        write_json(&dir.layout().object_path(&stray.id), &stray).unwrap();
        fs::write(dir.layout().objects_dir().join("notes.txt"), b"hi").unwrap();

        let loaded = dir.load().unwrap();
        assert_eq!(loaded.orphans.len(), 2);
        assert_eq!(loaded.store.len(), 3);
    }

    #[test]
    fn save_all_removes_stale_files() {
        let (_tmp, dir) = new_dir();
        let (mut store, doc, _, _) = sample();
        let stray = Object::new(doc);
        write_json(&dir.layout().object_path(&stray.id), &stray).unwrap();

        let report = dir.save_all(&mut store).unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(report.deleted, 1);
        assert!(dir.load().unwrap().orphans.is_empty());
    }

    #[test]
    fn misnamed_object_file_is_an_error() {
        let (_tmp, dir) = new_dir();
        let (mut store, _, a, b) = sample();
        dir.flush(&mut store).unwrap();
        fs::copy(dir.layout().object_path(&a), dir.layout().object_path(&b)).unwrap();
        assert!(matches!(
            dir.load(),
            Err(PersistError::MisnamedObject { .. })
        ));
    }

    #[test]
    fn create_refuses_existing_project() {
        let (_tmp, dir) = new_dir();
        let (mut store, _, _, _) = sample();
        dir.flush(&mut store).unwrap();
        assert!(matches!(
            ProjectDir::create(dir.root(), &PersistOptions::default()),
            Err(PersistError::AlreadyExists(_))
        ));
    }

    #[test]
    fn open_requires_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProjectDir::open(tmp.path(), &PersistOptions::default()),
            Err(PersistError::NotAProject(_))
        ));
    }

    #[test]
    fn assets_live_under_the_project() {
        let (_tmp, dir) = new_dir();
        let assets = dir.assets();
        assert!(assets.root().starts_with(dir.root()));
        assert!(assets.root().is_dir());
    }
}
