use arche_persist::AssetStore;
use arche_store::ObjectStore;
use arche_trace::{LiveTraces, TraceGraph};
use arche_types::ObjectId;

/// Everything a query may read while a document is rendered.
///
/// Holds shared borrows only, so no query can mutate the graph. The
/// document being rendered is an explicit field rather than ambient state.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub store: &'a ObjectStore,
    pub traces: &'a TraceGraph,
    pub assets: Option<&'a AssetStore>,
    pub current_document: Option<ObjectId>,
}

impl<'a> RenderContext<'a> {
    pub fn new(store: &'a ObjectStore, traces: &'a TraceGraph) -> Self {
        Self {
            store,
            traces,
            assets: None,
            current_document: None,
        }
    }

    pub fn with_assets(mut self, assets: &'a AssetStore) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Set the document being rendered.
    pub fn rendering(mut self, document: ObjectId) -> Self {
        self.current_document = Some(document);
        self
    }

    /// The trace graph restricted to objects in the store.
    pub fn live_traces(&self) -> LiveTraces<'a, ObjectStore> {
        self.traces.live(self.store)
    }
}
