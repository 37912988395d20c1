//! Dataset loading and selection export.
//!
//! Readers turn a region file into [`RawRegion`]s with canonical codes; malformed features are
//! logged and skipped here, malformed rings are repaired or skipped by the index build. Only a
//! file that cannot be opened or parsed as a whole is an error.

mod geojson;
mod shp;

use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use crate::index::{GeometryIndex, OuterFrame};
use crate::region::{Granularity, RawRegion};

pub use geojson::{parse_feature_collection, read_geojson, region_bounds, selection_to_geojson};
pub use shp::read_shapefile;

/// File formats a region dataset can come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    GeoJson,
    GzGeoJson,
    Shapefile,
}

impl DatasetFormat {
    /// Guess the format from the file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".geojson.gz") || name.ends_with(".json.gz") {
            Some(Self::GzGeoJson)
        } else if name.ends_with(".geojson") || name.ends_with(".json") {
            Some(Self::GeoJson)
        } else if name.ends_with(".shp") {
            Some(Self::Shapefile)
        } else {
            None
        }
    }
}

/// Read every region of a dataset file.
pub fn read_dataset(path: &Path, granularity: Granularity) -> Result<Vec<RawRegion>> {
    match DatasetFormat::from_path(path) {
        Some(DatasetFormat::GeoJson) | Some(DatasetFormat::GzGeoJson) => read_geojson(path, granularity),
        Some(DatasetFormat::Shapefile) => read_shapefile(path, granularity),
        None => bail!("Unrecognized dataset format: {}", path.display()),
    }
}

/// Read a dataset file and build its index.
pub fn load_index(path: &Path, granularity: Granularity, frame: OuterFrame) -> Result<GeometryIndex> {
    let raw = read_dataset(path, granularity)?;
    info!(path = %path.display(), %granularity, features = raw.len(), "read region dataset");
    Ok(GeometryIndex::build_with_frame(granularity, raw, frame))
}
