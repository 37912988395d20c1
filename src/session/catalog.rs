use std::{path::Path, sync::Arc};

use ahash::AHashMap;
use anyhow::Result;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::index::{GeometryIndex, OuterFrame};
use crate::io::load_index;
use crate::region::Granularity;

/// Extensions tried, in order, when discovering datasets by file stem.
const DATASET_EXTENSIONS: [&str; 3] = ["geojson", "geojson.gz", "shp"];

/// The current index of every loaded granularity.
///
/// Indexes are replaced wholesale: `install` swaps in a new `Arc`, and sessions still holding
/// the previous one keep reading it undisturbed.
#[derive(Debug, Default)]
pub struct IndexCatalog {
    indexes: RwLock<AHashMap<Granularity, Arc<GeometryIndex>>>,
}

impl IndexCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `index` the current one for its granularity; returns the one it replaces.
    pub fn install(&self, index: GeometryIndex) -> Option<Arc<GeometryIndex>> {
        self.install_arc(Arc::new(index))
    }

    pub fn install_arc(&self, index: Arc<GeometryIndex>) -> Option<Arc<GeometryIndex>> {
        let granularity = index.granularity();
        debug!(%granularity, regions = index.len(), "installing index");
        self.indexes.write().insert(granularity, index)
    }

    pub fn get(&self, granularity: Granularity) -> Option<Arc<GeometryIndex>> {
        self.indexes.read().get(&granularity).cloned()
    }

    /// Loaded granularities, coarsest first.
    pub fn granularities(&self) -> Vec<Granularity> {
        let mut loaded = self.indexes.read().keys().copied().collect::<Vec<_>>();
        loaded.sort_unstable();
        loaded
    }

    /// Load every `plz-{n}stellig` dataset found in `dir`. Returns the granularities loaded.
    /// Granularities without a file are skipped; a file that fails to load is an error.
    pub fn load_dir(&self, dir: &Path, frame: OuterFrame) -> Result<Vec<Granularity>> {
        let mut loaded = Vec::new();
        for granularity in Granularity::order() {
            let stem = granularity.file_stem();
            let Some(path) = DATASET_EXTENSIONS.iter()
                .map(|ext| dir.join(format!("{stem}.{ext}")))
                .find(|path| path.is_file())
            else {
                debug!(%granularity, dir = %dir.display(), "no dataset found");
                continue;
            };

            // Build outside the lock; readers see the old index until the swap.
            let index = load_index(&path, granularity, frame)?;
            self.install(index);
            loaded.push(granularity);
        }
        info!(dir = %dir.display(), ?loaded, "loaded datasets");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::index::tests::grid;

    #[test]
    fn install_replaces_without_disturbing_readers() {
        let catalog = IndexCatalog::new();
        assert!(catalog.install(grid(2)).is_none());

        let held = catalog.get(Granularity::TwoDigit).unwrap();
        let previous = catalog.install(grid(3)).unwrap();

        assert!(Arc::ptr_eq(&held, &previous));
        assert_eq!(held.len(), 4);
        assert_eq!(catalog.get(Granularity::TwoDigit).unwrap().len(), 9);
        assert!(catalog.get(Granularity::FiveDigit).is_none());
    }

    #[test]
    fn load_dir_discovers_datasets_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let collection = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "plz": "8" },
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
            }],
        });
        std::fs::write(dir.path().join("plz-1stellig.geojson"), collection.to_string()).unwrap();
        std::fs::write(dir.path().join("unrelated.geojson"), "{}").unwrap();

        let catalog = IndexCatalog::new();
        let loaded = catalog.load_dir(dir.path(), OuterFrame::default()).unwrap();

        assert_eq!(loaded, vec![Granularity::OneDigit]);
        assert_eq!(catalog.granularities(), vec![Granularity::OneDigit]);
        assert_eq!(catalog.get(Granularity::OneDigit).unwrap().code(crate::region::RegionId(0)), "8");
    }

    #[test]
    fn load_dir_fails_on_broken_dataset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plz-5stellig.geojson"), "not json").unwrap();
        assert!(IndexCatalog::new().load_dir(dir.path(), OuterFrame::default()).is_err());
    }
}
