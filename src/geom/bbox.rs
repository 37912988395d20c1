use geo::Rect;
use rstar::{RTreeObject, AABB};

use crate::region::RegionId;

/// A bounding box in an R-tree, associated with a region by id.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    id: RegionId,
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(id: RegionId, bbox: Rect<f64>) -> Self {
        Self { id, bbox }
    }

    /// Get the id of the corresponding region.
    #[inline] pub(crate) fn id(&self) -> RegionId { self.id }

    /// Get a reference to the bounding rectangle.
    #[inline] pub(crate) fn bbox(&self) -> &Rect<f64> { &self.bbox }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
