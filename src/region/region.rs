use std::{fmt, sync::Arc};

use geo::{Coord, CoordsIter, MultiPolygon};
use serde_json::{Map, Value};

use crate::region::Granularity;

/// Dense index of a region within one `GeometryIndex`.
/// Ids are assigned in load order and are only meaningful for the index that issued them,
/// so only the index can create them:
///
/// ```compile_fail
/// let id = plzmap::RegionId(7);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub(crate) u32);

impl RegionId {
    #[inline] pub fn idx(self) -> usize { self.0 as usize }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

/// A named polygonal feature at one granularity. Immutable once indexed.
#[derive(Debug, Clone)]
pub struct Region {
    pub code: Arc<str>,
    pub granularity: Granularity,
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
}

impl Region {
    /// Common name, if the dataset carries one.
    pub fn name(&self) -> Option<&str> {
        ["name", "Name", "NAME", "ort", "Ort", "note_name"].iter()
            .find_map(|&key| self.properties.get(key).and_then(Value::as_str))
    }
}

/// A region as it comes out of a dataset reader, before ring repair.
/// `polygons[p][0]` is the exterior ring of polygon `p`, the remaining rings are its holes.
#[derive(Debug, Clone, Default)]
pub struct RawRegion {
    pub code: String,
    pub polygons: Vec<Vec<Vec<Coord<f64>>>>,
    pub properties: Map<String, Value>,
}

impl RawRegion {
    pub fn new(code: impl Into<String>, polygons: Vec<Vec<Vec<Coord<f64>>>>) -> Self {
        Self { code: code.into(), polygons, properties: Map::new() }
    }

    /// Build from an already-valid geometry (rings are taken as-is).
    pub fn from_multipolygon(code: impl Into<String>, geometry: &MultiPolygon<f64>) -> Self {
        let polygons = geometry.0.iter()
            .map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(|ring| ring.coords_iter().collect())
                    .collect()
            })
            .collect();
        Self::new(code, polygons)
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}
