//! An editing session over one project directory.
//!
//! A [`Workspace`] owns the project graph behind a single `RwLock`: one
//! writer at a time, any number of readers. Every mutating call holds the
//! write guard for its whole duration, so readers never observe a clone or
//! a deletion half done. Rendering holds a read guard.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use arche_bridge::{QueryArgs, QueryRegistry, QueryValue, RenderContext};
use arche_clone::{CloneEngine, CloneOutcome, CloneRequest, CloneRoot, Placement};
use arche_library::Library;
use arche_persist::{AssetStore, FlushReport, ProjectDir};
use arche_store::{DocumentMeta, Object, ObjectStore};
use arche_trace::{DependencyMatrix, ImpactReport};
use arche_types::{ArchetypeId, ClassTag, ObjectId, PropertyValue, TraceFilter, TraceLink, TraceType};

use crate::config::{WorkspaceConfig, CONFIG_FILE};
use crate::error::{SdkError, SdkResult};
use crate::graph::{CheckReport, Graph, Removal};

/// A project opened for editing.
pub struct Workspace {
    dir: ProjectDir,
    assets: AssetStore,
    config: WorkspaceConfig,
    graph: RwLock<Graph>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.dir.root())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Create a new project at `root` and write its manifest and
    /// configuration.
    pub fn create(
        root: impl AsRef<Path>,
        name: &str,
        config: WorkspaceConfig,
    ) -> SdkResult<Self> {
        let root = root.as_ref();
        let dir = ProjectDir::create(root, &config.persist_options())?;
        config.save(&root.join(CONFIG_FILE))?;
        let mut store = ObjectStore::new(name);
        dir.flush(&mut store)?;
        info!(project = name, root = %root.display(), "created workspace");
        Ok(Self::assemble(dir, config, store))
    }

    /// Open the project at `root`, reading `arche.toml` if present.
    pub fn open(root: impl AsRef<Path>) -> SdkResult<Self> {
        let root = root.as_ref();
        let config = WorkspaceConfig::load_or_default(root)?;
        let dir = ProjectDir::open(root, &config.persist_options())?;
        let loaded = dir.load()?;
        if !loaded.orphans.is_empty() {
            warn!(
                orphans = loaded.orphans.len(),
                "project directory holds unreachable object files"
            );
        }
        Ok(Self::assemble(dir, config, loaded.store))
    }

    fn assemble(dir: ProjectDir, config: WorkspaceConfig, store: ObjectStore) -> Self {
        Self {
            assets: dir.assets(),
            dir,
            config,
            graph: RwLock::new(Graph::new(store)),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.root()
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// The configured archetype library.
    pub fn library(&self) -> SdkResult<Library> {
        let root = self
            .config
            .library_path(self.dir.root())
            .ok_or(SdkError::NoLibrary)?;
        Ok(Library::new(root, self.config.persist_options()))
    }

    // ---------------------------------------------------------------
    // Locking
    // ---------------------------------------------------------------

    fn read_guard(&self) -> SdkResult<RwLockReadGuard<'_, Graph>> {
        self.graph.read().map_err(|_| SdkError::LockPoisoned)
    }

    fn write_guard(&self) -> SdkResult<RwLockWriteGuard<'_, Graph>> {
        self.graph.write().map_err(|_| SdkError::LockPoisoned)
    }

    /// Run `f` under a read guard.
    pub fn read<R>(&self, f: impl FnOnce(&Graph) -> R) -> SdkResult<R> {
        let graph = self.read_guard()?;
        Ok(f(&graph))
    }

    /// Run `f` under the write guard. Several edits done in one call are
    /// seen by readers all at once.
    pub fn write<R>(&self, f: impl FnOnce(&mut Graph) -> SdkResult<R>) -> SdkResult<R> {
        let mut graph = self.write_guard()?;
        f(&mut graph)
    }

    // ---------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------

    pub fn add_document(&self, name: &str) -> SdkResult<ObjectId> {
        self.write(|g| g.add_document(DocumentMeta::named(name), None))
    }

    /// Add a blank object with `classes` as the last child of `parent`.
    pub fn add_object(&self, parent: &ObjectId, classes: Vec<ClassTag>) -> SdkResult<ObjectId> {
        let mut object = Object::new(*parent);
        for tag in classes {
            object.add_class(tag);
        }
        self.write(|g| g.add_object(object, None))
    }

    pub fn set_property(
        &self,
        id: &ObjectId,
        name: &str,
        value: PropertyValue,
    ) -> SdkResult<Option<PropertyValue>> {
        self.write(|g| g.set_property(id, name, value))
    }

    pub fn remove_property(&self, id: &ObjectId, name: &str) -> SdkResult<Option<PropertyValue>> {
        self.write(|g| g.remove_property(id, name))
    }

    /// Add a trace from `source` to `target`. Fails with an invalid trace
    /// type error for empty or whitespace-containing type names.
    pub fn add_trace(
        &self,
        source: &ObjectId,
        trace_type: &str,
        target: &ObjectId,
        label: Option<String>,
    ) -> SdkResult<bool> {
        let trace_type = TraceType::new(trace_type)?;
        let link = match label {
            Some(label) => TraceLink::labeled(*target, label),
            None => TraceLink::new(*target),
        };
        self.write(|g| g.add_trace(source, trace_type, link))
    }

    pub fn remove_trace(
        &self,
        source: &ObjectId,
        trace_type: &str,
        target: &ObjectId,
    ) -> SdkResult<bool> {
        let trace_type = TraceType::new(trace_type)?;
        self.write(|g| g.remove_trace(source, &trace_type, target))
    }

    /// Delete an object and its subtree, handling inbound traces per the
    /// configured dangling policy.
    pub fn remove_object(&self, id: &ObjectId) -> SdkResult<Removal> {
        let policy = self.config.dangling_policy;
        self.write(|g| g.remove_object(id, policy))
    }

    pub fn reparent(
        &self,
        id: &ObjectId,
        new_parent: &ObjectId,
        position: Option<usize>,
    ) -> SdkResult<()> {
        self.write(|g| g.reparent(id, new_parent, position))
    }

    // ---------------------------------------------------------------
    // Cloning
    // ---------------------------------------------------------------

    /// Parse `profile/name`, or `name` in the default profile.
    pub fn resolve_archetype(&self, name: &str) -> SdkResult<ArchetypeId> {
        if name.contains('/') {
            Ok(name.parse()?)
        } else {
            Ok(ArchetypeId::new(self.config.default_profile.as_str(), name)?)
        }
    }

    /// Instantiate an archetype from the library.
    ///
    /// Object and document archetypes clone one root. Project archetypes
    /// clone every document of their source, placed one after another
    /// starting at `placement`; `rename` then applies to none of them.
    pub fn clone_archetype(
        &self,
        id: &ArchetypeId,
        placement: Placement,
        rename: Option<String>,
    ) -> SdkResult<CloneOutcome> {
        let profile = self.library()?.profile_for(id)?;
        let template = profile.template(id.name())?;
        let rename = if template.roots.len() == 1 { rename } else { None };
        let request = spread(&template.roots, &placement, rename);

        let mut engine = CloneEngine::new(self.config.clone_options());
        let outcome = self.write(|g| {
            let plan = engine.plan(template.source, g.store(), &request)?;
            g.commit_clone(plan)
        })?;
        info!(archetype = %id, roots = outcome.roots.len(), objects = outcome.remap.len(), "instantiated archetype");
        Ok(outcome)
    }

    /// Deep-copy an object or document of this project.
    pub fn clone_object(
        &self,
        source: &ObjectId,
        placement: Placement,
        rename: Option<String>,
    ) -> SdkResult<CloneOutcome> {
        let mut root = CloneRoot::new(*source, placement);
        if let Some(name) = rename {
            root = root.renamed(name);
        }
        let request = CloneRequest { roots: vec![root] };
        let mut engine = CloneEngine::new(self.config.clone_options());
        self.write(|g| {
            let plan = engine.plan(g.store(), g.store(), &request)?;
            g.commit_clone(plan)
        })
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// A copy of one object.
    pub fn object(&self, id: &ObjectId) -> SdkResult<Object> {
        let graph = self.read_guard()?;
        Ok(graph.store().get(id)?.clone())
    }

    pub fn objects_with_classes(&self, classes: &[ClassTag]) -> SdkResult<Vec<ObjectId>> {
        self.read(|g| g.store().objects_with_classes(classes))
    }

    pub fn impact(&self, seeds: &[ObjectId], filter: &TraceFilter) -> SdkResult<ImpactReport> {
        self.read(|g| g.impact(seeds, filter))
    }

    pub fn matrix(
        &self,
        row_classes: &[ClassTag],
        column_classes: &[ClassTag],
        filter: &TraceFilter,
    ) -> SdkResult<DependencyMatrix> {
        self.read(|g| g.matrix(row_classes, column_classes, filter))
    }

    pub fn check(&self) -> SdkResult<CheckReport> {
        self.read_guard()?.check()
    }

    /// Run `f` with a render context over the current graph and the
    /// project's assets. The graph cannot change until `f` returns.
    pub fn render<R>(
        &self,
        document: Option<ObjectId>,
        f: impl FnOnce(&RenderContext<'_>) -> R,
    ) -> SdkResult<R> {
        let graph = self.read_guard()?;
        let mut ctx = graph.render_context().with_assets(&self.assets);
        if let Some(doc) = document {
            ctx = ctx.rendering(doc);
        }
        Ok(f(&ctx))
    }

    /// Call one bridge query by name.
    pub fn query(
        &self,
        document: Option<ObjectId>,
        name: &str,
        args: &QueryArgs,
    ) -> SdkResult<QueryValue> {
        let registry = QueryRegistry::standard();
        self.render(document, |ctx| registry.call(ctx, name, args))?
            .map_err(SdkError::from)
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    pub fn is_dirty(&self) -> SdkResult<bool> {
        self.read(|g| g.store().is_dirty())
    }

    /// Write pending changes to disk.
    ///
    /// Holds the write guard throughout, so no edit can land between
    /// writing the dirty objects and clearing the dirty set.
    pub fn flush(&self) -> SdkResult<FlushReport> {
        let mut graph = self.write_guard()?;
        Ok(self.dir.flush(graph.store_mut())?)
    }
}

/// One clone root per template root, with positions counting up from the
/// requested one.
fn spread(roots: &[ObjectId], placement: &Placement, rename: Option<String>) -> CloneRequest {
    let mut request = CloneRequest { roots: Vec::new() };
    for (offset, source) in roots.iter().enumerate() {
        let placement = match placement {
            Placement::Under { parent, position } => Placement::Under {
                parent: *parent,
                position: position.map(|p| p + offset),
            },
            Placement::Document { position } => Placement::Document {
                position: position.map(|p| p + offset),
            },
        };
        let mut root = CloneRoot::new(*source, placement);
        if let Some(name) = &rename {
            root = root.renamed(name.clone());
        }
        request.roots.push(root);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use arche_library::{ArchetypeKind, CatalogEntry};
    use arche_types::AssetPath;

    use crate::config::DanglingPolicy;

    fn class(s: &str) -> ClassTag {
        ClassTag::new(s).unwrap()
    }

    fn workspace(dir: &Path, config: WorkspaceConfig) -> Workspace {
        Workspace::create(dir.join("project"), "demo", config).unwrap()
    }

    #[test]
    fn create_then_open() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(tmp.path(), WorkspaceConfig::default());
        assert!(!ws.is_dirty().unwrap());
        assert!(tmp.path().join("project").join(CONFIG_FILE).is_file());

        let reopened = Workspace::open(ws.root()).unwrap();
        let name = reopened.read(|g| g.store().project().name.clone()).unwrap();
        assert_eq!(name, "demo");
        assert!(matches!(
            Workspace::create(ws.root(), "again", WorkspaceConfig::default()),
            Err(SdkError::Persist(_))
        ));
    }

    #[test]
    fn edits_survive_flush_and_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(tmp.path(), WorkspaceConfig::default());
        let doc = ws.add_document("SRS").unwrap();
        let a = ws.add_object(&doc, vec![class("requirement")]).unwrap();
        let b = ws.add_object(&doc, vec![class("requirement")]).unwrap();
        ws.set_property(&a, "title", PropertyValue::Text("A".into()))
            .unwrap();
        ws.add_trace(&a, "depends-on", &b, Some("needs".into()))
            .unwrap();
        let ghost = ObjectId::from_u128(7);
        ws.add_trace(&b, "refines", &ghost, None).unwrap();

        assert!(ws.is_dirty().unwrap());
        let report = ws.flush().unwrap();
        assert_eq!(report.written, 3);
        assert!(!ws.is_dirty().unwrap());
        assert!(ws.flush().unwrap().is_noop());

        let reopened = Workspace::open(ws.root()).unwrap();
        assert_eq!(reopened.object(&a).unwrap(), ws.object(&a).unwrap());
        let (edges, dangling) = reopened
            .read(|g| (g.traces().edges(), g.traces().dangling_edges(g.store())))
            .unwrap();
        assert_eq!(edges, ws.read(|g| g.traces().edges()).unwrap());
        assert_eq!(dangling.len(), 1);
        assert_eq!(
            reopened.impact(&[a], &TraceFilter::Any).unwrap().ids(),
            vec![b]
        );
    }

    #[test]
    fn malformed_trace_type_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(tmp.path(), WorkspaceConfig::default());
        let doc = ws.add_document("D").unwrap();
        let a = ws.add_object(&doc, Vec::new()).unwrap();
        assert!(matches!(
            ws.add_trace(&a, "depends on", &doc, None),
            Err(SdkError::Type(arche_types::TypeError::InvalidTraceType(_)))
        ));
        assert!(ws.read(|g| g.traces().is_empty()).unwrap());
    }

    #[test]
    fn deletion_follows_the_configured_policy() {
        let tmp = tempfile::tempdir().unwrap();
        for (policy, dangling) in [(DanglingPolicy::Keep, 1), (DanglingPolicy::Cascade, 0)] {
            let config = WorkspaceConfig {
                dangling_policy: policy,
                ..WorkspaceConfig::default()
            };
            let dir = tmp.path().join(format!("{policy:?}"));
            let ws = workspace(&dir, config);
            let doc = ws.add_document("D").unwrap();
            let a = ws.add_object(&doc, Vec::new()).unwrap();
            let b = ws.add_object(&doc, Vec::new()).unwrap();
            ws.add_trace(&a, "depends-on", &b, None).unwrap();

            let removal = ws.remove_object(&b).unwrap();
            assert_eq!(removal.dangling.len(), dangling);
            assert!(matches!(ws.object(&b), Err(SdkError::Store(_))));
            assert_eq!(ws.check().unwrap().dangling.len(), dangling);
            // Queries against the removed object come back empty.
            let value = ws
                .query(None, "get_object", &QueryArgs::new().arg(b))
                .unwrap();
            assert!(value.is_empty());
            let impact = ws
                .query(None, "calculate_impact", &QueryArgs::new().arg(vec![a]))
                .unwrap();
            assert!(impact.is_empty());
            let dep = ws
                .query(None, "check_dependency", &QueryArgs::new().arg(a).arg(b))
                .unwrap();
            assert_eq!(dep.as_bool(), Some(false));
            let targets = ws
                .query(None, "targets_of", &QueryArgs::new().arg(a))
                .unwrap();
            assert!(targets.is_empty());
            assert!(ws.impact(&[a], &TraceFilter::Any).unwrap().is_empty());
        }
    }

    #[test]
    fn clone_object_within_the_project() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(tmp.path(), WorkspaceConfig::default());
        let doc = ws.add_document("D").unwrap();
        let x = ws.add_object(&doc, Vec::new()).unwrap();
        let xc = ws.add_object(&x, Vec::new()).unwrap();
        let y = ws.add_object(&doc, Vec::new()).unwrap();
        ws.add_trace(&x, "contains", &xc, None).unwrap();
        ws.add_trace(&xc, "depends-on", &y, None).unwrap();

        let outcome = ws
            .clone_object(&x, Placement::under(doc), Some("X copy".into()))
            .unwrap();
        let copy = outcome.roots[0];
        let copy_child = outcome.remap.resolve(&xc);
        assert_ne!(copy, x);
        assert_ne!(copy_child, xc);

        let (copy_targets, child_targets) = ws
            .read(|g| {
                (
                    g.traces().targets_of(&copy, &TraceFilter::Any),
                    g.traces().targets_of(&copy_child, &TraceFilter::Any),
                )
            })
            .unwrap();
        assert_eq!(copy_targets, vec![copy_child]);
        assert_eq!(child_targets, vec![y]);
        assert_eq!(ws.object(&copy).unwrap().label(), "X copy");
        ws.check().unwrap();
    }

    #[test]
    fn archetypes_are_cloned_from_the_library() {
        let tmp = tempfile::tempdir().unwrap();
        let library_root = tmp.path().join("library");
        let library = Library::new(&library_root, Default::default());

        let mut templates = ObjectStore::new("templates");
        let srs = Object::document(DocumentMeta::named("SRS template"));
        let srs_id = srs.id;
        templates.put(srs).unwrap();
        let req = Object::new(srs_id).with_class(class("requirement"));
        let req_id = req.id;
        templates.put(req).unwrap();
        library
            .publish(
                "standard",
                "templates",
                &mut templates,
                vec![
                    CatalogEntry {
                        name: "srs".into(),
                        kind: ArchetypeKind::Document,
                        source: "templates".into(),
                        root: Some(srs_id),
                        description: String::new(),
                    },
                    CatalogEntry {
                        name: "starter".into(),
                        kind: ArchetypeKind::Project,
                        source: "templates".into(),
                        root: None,
                        description: String::new(),
                    },
                ],
            )
            .unwrap();

        let config = WorkspaceConfig {
            library_root: Some(library_root),
            ..WorkspaceConfig::default()
        };
        let ws = workspace(tmp.path(), config);

        let srs = ws.resolve_archetype("srs").unwrap();
        let first = ws
            .clone_archetype(&srs, Placement::document(), Some("SRS".into()))
            .unwrap();
        let second = ws.clone_archetype(&srs, Placement::document(), None).unwrap();
        assert_ne!(first.roots, second.roots);
        assert!(first
            .remap
            .pairs()
            .all(|(_, new)| !second.remap.pairs().any(|(_, other)| other == new)));

        let doc = ws.object(&first.roots[0]).unwrap();
        assert_eq!(doc.document_meta().map(|m| m.name.as_str()), Some("SRS"));
        assert_eq!(
            ws.objects_with_classes(&[class("requirement")]).unwrap().len(),
            2
        );

        let starter = ws.resolve_archetype("standard/starter").unwrap();
        let project = ws
            .clone_archetype(&starter, Placement::document(), None)
            .unwrap();
        assert_eq!(project.roots.len(), 1);
        let documents = ws.read(|g| g.store().documents().to_vec()).unwrap();
        assert_eq!(documents.len(), 3);

        // The library source is untouched.
        let profile = ws.library().unwrap().profile("standard").unwrap();
        let source = profile.template("srs").unwrap().source;
        assert_eq!(source.len(), 2);
        assert!(source.contains(&req_id));
    }

    #[test]
    fn missing_library_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(tmp.path(), WorkspaceConfig::default());
        let id = ws.resolve_archetype("srs").unwrap();
        assert!(matches!(
            ws.clone_archetype(&id, Placement::document(), None),
            Err(SdkError::NoLibrary)
        ));
    }

    #[test]
    fn render_sees_assets_and_the_current_document() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(tmp.path(), WorkspaceConfig::default());
        let doc = ws.add_document("D").unwrap();
        ws.assets()
            .write(&AssetPath::new("logo.txt").unwrap(), b"hi")
            .unwrap();

        let current = ws
            .query(Some(doc), "current_document", &QueryArgs::new())
            .unwrap();
        assert_eq!(current, QueryValue::Id(doc));
        let asset = ws
            .query(None, "resolve_asset", &QueryArgs::new().arg("logo.txt"))
            .unwrap();
        assert!(matches!(asset, QueryValue::Asset(ref p) if p.base64 == "aGk="));
        assert!(matches!(
            ws.query(None, "set_property", &QueryArgs::new()),
            Err(SdkError::Bridge(_))
        ));
    }

    #[test]
    fn readers_run_alongside_a_writer() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Arc::new(workspace(tmp.path(), WorkspaceConfig::default()));
        let doc = ws.add_document("D").unwrap();
        let root = ws.add_object(&doc, Vec::new()).unwrap();

        let writer = {
            let ws = Arc::clone(&ws);
            thread::spawn(move || {
                let mut previous = root;
                for _ in 0..50 {
                    let next = ws.add_object(&doc, Vec::new()).unwrap();
                    ws.add_trace(&previous, "depends-on", &next, None).unwrap();
                    previous = next;
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let ws = Arc::clone(&ws);
                thread::spawn(move || {
                    for _ in 0..50 {
                        // The chain is always complete: every indexed edge
                        // starts at an object that exists.
                        ws.read(|g| {
                            let closure = g.impact(&[root], &TraceFilter::Any).ids();
                            assert!(closure.iter().all(|id| g.store().contains(id)));
                        })
                        .unwrap();
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(ws.impact(&[root], &TraceFilter::Any).unwrap().len(), 50);
        ws.check().unwrap();
    }

    #[test]
    fn poisoned_lock_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Arc::new(workspace(tmp.path(), WorkspaceConfig::default()));
        let w = Arc::clone(&ws);
        let _ = thread::spawn(move || {
            let _ = w.write(|_| -> SdkResult<()> { panic!("editor crashed") });
        })
        .join();
        assert!(matches!(ws.is_dirty(), Err(SdkError::LockPoisoned)));
    }
}
