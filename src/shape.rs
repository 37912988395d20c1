use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geom::{DrawnShape, DEFAULT_CIRCLE_VERTICES};
use crate::index::GeometryIndex;
use crate::region::RegionId;
use crate::selection::SelectionSet;

/// How the regions hit by a shape are applied to the selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Selection becomes exactly the hit regions.
    Replace,
    /// Hit regions are added.
    Add,
    /// Each hit region flips individually (paint-and-erase lasso).
    #[default]
    Toggle,
    /// Hit regions are removed (eraser).
    Remove,
}

/// Resolves drawn shapes into region codes against one index.
#[derive(Debug, Clone, Copy)]
pub struct ShapeSelector<'a> {
    index: &'a GeometryIndex,
    circle_vertices: usize,
}

impl<'a> ShapeSelector<'a> {
    pub fn new(index: &'a GeometryIndex) -> Self {
        Self { index, circle_vertices: DEFAULT_CIRCLE_VERTICES }
    }

    pub fn with_circle_vertices(mut self, circle_vertices: usize) -> Self {
        self.circle_vertices = circle_vertices.max(3);
        self
    }

    /// Regions hit by `shape`, ordered by code. Points resolve to the single containing region;
    /// degenerate shapes hit nothing.
    pub fn resolve(&self, shape: &DrawnShape) -> Vec<RegionId> {
        if let Some(point) = shape.as_point() {
            return self.index.region_at(point).into_iter().collect();
        }
        match shape.to_polygon(self.circle_vertices) {
            Some(polygon) => self.index.regions_intersecting(&polygon),
            None => {
                debug!("ignoring degenerate shape");
                Vec::new()
            }
        }
    }

    /// Codes of the regions hit by `shape`, sorted.
    pub fn codes(&self, shape: &DrawnShape) -> Vec<String> {
        self.index.codes_of(self.resolve(shape))
    }

    /// Resolve `shape` and apply the hits to `selection` according to `mode`.
    /// Returns the hit codes. A degenerate shape leaves the selection untouched, even in
    /// replace mode.
    pub fn select_by_shape(&self, shape: &DrawnShape, mode: SelectionMode, selection: &mut SelectionSet) -> Vec<String> {
        if selection.granularity() != self.index.granularity() {
            warn!(
                "selection is {} but index is {}; ignoring shape",
                selection.granularity(), self.index.granularity()
            );
            return Vec::new();
        }
        if shape.as_point().is_none() && shape.to_polygon(self.circle_vertices).is_none() {
            return Vec::new();
        }

        let codes = self.codes(shape);
        match mode {
            SelectionMode::Replace => selection.replace(&codes),
            SelectionMode::Add => { selection.add(&codes); }
            SelectionMode::Toggle => { selection.toggle_each(&codes); }
            SelectionMode::Remove => { selection.remove(&codes); }
        }
        debug!("{mode:?} applied {} regions, selection now {}", codes.len(), selection.len());
        codes
    }
}
