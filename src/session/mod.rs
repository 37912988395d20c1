//! Per-layer editing state and the shared resources around it.
//!
//! A [`Session`] owns one layer's selection together with the index it is drawn on and
//! routes every engine operation through them. Sessions are shared between request contexts
//! behind a per-layer mutex by the [`SessionRegistry`], so two gestures on the same layer
//! serialize while different layers proceed independently.

mod catalog;
mod registry;
mod store;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adjacency::AdjacencyResolver;
use crate::bulk::{BulkOperation, BulkOperator};
use crate::config::EngineConfig;
use crate::geom::DrawnShape;
use crate::index::{convert_codes, GeometryIndex};
use crate::search::{DistanceSearch, RoutingService, SearchOutcome, SearchRequest, SearchResult};
use crate::selection::SelectionSet;
use crate::shape::{SelectionMode, ShapeSelector};

pub use catalog::IndexCatalog;
pub use registry::SessionRegistry;
pub use store::{JsonFileLayerStore, LayerRecord, LayerStore, MemoryLayerStore, StoreError};

/// One layer being edited.
#[derive(Debug)]
pub struct Session {
    layer_id: String,
    index: Arc<GeometryIndex>,
    selection: SelectionSet,
    config: EngineConfig,
    saved_fingerprint: Option<String>,
}

impl Session {
    pub fn new(layer_id: impl Into<String>, index: Arc<GeometryIndex>, config: EngineConfig) -> Self {
        let selection = SelectionSet::new(index.granularity());
        Self { layer_id: layer_id.into(), index, selection, config, saved_fingerprint: None }
    }

    #[inline] pub fn layer_id(&self) -> &str { &self.layer_id }

    #[inline] pub fn index(&self) -> &Arc<GeometryIndex> { &self.index }

    #[inline] pub fn selection(&self) -> &SelectionSet { &self.selection }

    #[inline] pub fn config(&self) -> &EngineConfig { &self.config }

    /// Sorted selected codes.
    pub fn codes(&self) -> Vec<String> {
        self.selection.snapshot()
    }

    /// Receive the selection snapshot after every change.
    pub fn set_listener(&mut self, listener: impl Fn(&[String]) + Send + Sync + 'static) {
        self.selection.set_listener(listener);
    }

    /// Flip one region (a click). Returns `true` if it is selected afterwards.
    pub fn toggle(&mut self, code: &str) -> bool {
        self.selection.toggle(code)
    }

    pub fn add<S: AsRef<str>>(&mut self, codes: &[S]) -> usize {
        self.selection.add(codes)
    }

    pub fn remove<S: AsRef<str>>(&mut self, codes: &[S]) -> usize {
        self.selection.remove(codes)
    }

    pub fn replace<S: AsRef<str>>(&mut self, codes: &[S]) {
        self.selection.replace(codes)
    }

    pub fn clear(&mut self) {
        self.selection.clear()
    }

    /// Apply a drawn shape. Returns the codes it hit.
    pub fn select_by_shape(&mut self, shape: &DrawnShape, mode: SelectionMode) -> Vec<String> {
        ShapeSelector::new(&self.index)
            .with_circle_vertices(self.config.circle_vertices)
            .select_by_shape(shape, mode, &mut self.selection)
    }

    /// Codes of every region intersecting `shape`, sorted, without touching the selection.
    pub fn regions_within(&self, shape: &DrawnShape) -> Vec<String> {
        ShapeSelector::new(&self.index)
            .with_circle_vertices(self.config.circle_vertices)
            .codes(shape)
    }

    /// Run a bulk operation. Returns the codes it added.
    pub fn bulk(&mut self, operation: BulkOperation) -> Vec<String> {
        BulkOperator::new(&self.index).apply(operation, &mut self.selection)
    }

    /// Whether region `code` touches the current selection.
    pub fn touches_selection(&self, code: &str) -> bool {
        let Some(region) = self.index.id_of(code) else { return false };
        let selected = self.index.resolve(&self.selection.snapshot()).into_iter().collect();
        AdjacencyResolver::new(&self.index).is_adjacent(region, &selected)
    }

    /// Distance search around a point on this layer's index. The selection is not changed;
    /// see [`Session::select_hits`].
    pub fn search(
        &self,
        request: &SearchRequest,
        router: Option<&dyn RoutingService>,
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        let search = DistanceSearch::new(&self.index, &self.config.search);
        match router {
            Some(router) => search.with_router(router).run(request, cancel),
            None => search.run(request, cancel),
        }
    }

    /// Apply the hits of a search result to the selection.
    pub fn select_hits(&mut self, result: &SearchResult, mode: SelectionMode) -> Vec<String> {
        let codes = result.codes();
        match mode {
            SelectionMode::Replace => self.selection.replace(&codes),
            SelectionMode::Add => { self.selection.add(&codes); }
            SelectionMode::Toggle => { self.selection.toggle_each(&codes); }
            SelectionMode::Remove => { self.selection.remove(&codes); }
        }
        codes
    }

    /// Move the layer onto another index, carrying the selection over by code prefix.
    /// The listener moves with it and sees the converted selection.
    pub fn switch_index(&mut self, index: Arc<GeometryIndex>) {
        let converted = convert_codes(&self.selection.snapshot(), &index);
        info!(
            layer = %self.layer_id,
            from = %self.index.granularity(), to = %index.granularity(),
            before = self.selection.len(), after = converted.len(),
            "switching index"
        );

        let mut selection = SelectionSet::new(index.granularity());
        if let Some(listener) = self.selection.take_listener() {
            selection.set_listener(listener);
        }
        selection.replace(&converted);

        self.index = index;
        self.selection = selection;
        self.saved_fingerprint = None;
    }

    /// Whether the selection differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.saved_fingerprint.as_deref() != Some(self.selection.fingerprint().as_str())
    }

    /// Replace the selection with the stored layer. Codes unknown to the index are kept;
    /// they are simply never drawn.
    pub fn load(&mut self, store: &dyn LayerStore) -> Result<(), StoreError> {
        let record = store.get_layer(&self.layer_id)?;
        self.selection.replace(&record.postal_codes);
        self.saved_fingerprint = Some(self.selection.fingerprint());
        debug!(layer = %self.layer_id, codes = self.selection.len(), "layer loaded");
        Ok(())
    }

    /// Persist the selection. Returns `false` without writing when nothing changed since the
    /// last load or save.
    pub fn save(&mut self, store: &dyn LayerStore) -> Result<bool, StoreError> {
        let fingerprint = self.selection.fingerprint();
        if self.saved_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            debug!(layer = %self.layer_id, "selection unchanged, skipping save");
            return Ok(false);
        }

        if let Err(e) = store.set_layer_codes(&self.layer_id, &self.selection.snapshot()) {
            warn!(layer = %self.layer_id, error = %e, "saving layer failed");
            return Err(e);
        }
        self.saved_fingerprint = Some(fingerprint);
        debug!(layer = %self.layer_id, codes = self.selection.len(), "layer saved");
        Ok(true)
    }
}
