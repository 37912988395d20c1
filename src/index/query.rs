use geo::{BooleanOps, BoundingRect, MultiPolygon, Point};
use rstar::AABB;

use crate::geom::{envelope_around, guarded, point_touches, polygons_intersect, rect_distance_km};
use crate::index::GeometryIndex;
use crate::region::RegionId;

impl GeometryIndex {
    /// Regions whose bounding box lies within `radius_km` of `point`, nearest box first.
    /// A cheap pre-filter; no exact geometry test is made.
    pub fn candidates_near(&self, point: Point<f64>, radius_km: f64) -> Vec<RegionId> {
        let mut hits = self.query(&envelope_around(point, radius_km))
            .map(|bb| (bb.id(), rect_distance_km(point, bb.bbox())))
            .filter(|&(_, d)| d <= radius_km)
            .collect::<Vec<_>>();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits.into_iter().map(|(id, _)| id).collect()
    }

    /// Regions whose geometry genuinely intersects `shape`, ordered by code.
    /// Both sides are decomposed into single polygons; any intersecting pair counts.
    pub fn regions_intersecting(&self, shape: &MultiPolygon<f64>) -> Vec<RegionId> {
        let Some(rect) = shape.bounding_rect() else { return Vec::new() };
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());

        let mut hits = self.query(&envelope)
            .map(|bb| bb.id())
            .filter(|&id| polygons_intersect(self.geometry(id), shape))
            .collect::<Vec<_>>();
        self.sort_by_code(&mut hits);
        hits
    }

    /// The region containing `point`. A point on a boundary shared by several regions
    /// resolves to the one with the lowest code.
    pub fn region_at(&self, point: Point<f64>) -> Option<RegionId> {
        let envelope = AABB::from_point([point.x(), point.y()]);
        self.query(&envelope)
            .map(|bb| bb.id())
            .filter(|&id| point_touches(self.geometry(id), point))
            .min_by(|&a, &b| self.code(a).cmp(self.code(b)))
    }

    /// Regions whose bounding box overlaps the bounding box of `id`, excluding `id` itself.
    pub fn bbox_neighbors(&self, id: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        let rect = self.bounds(id);
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        self.query(&envelope)
            .map(|bb| bb.id())
            .filter(move |&other| other != id)
    }

    /// Geometric union of the given regions.
    /// Falls back to the plain collection of their polygons if the overlay fails; for
    /// intersection tests the two are equivalent.
    pub fn union_of(&self, ids: &[RegionId]) -> MultiPolygon<f64> {
        let collect_all = || MultiPolygon::new(
            ids.iter().flat_map(|&id| self.geometry(id).0.iter().cloned()).collect()
        );

        guarded(|| {
            ids.iter()
                .map(|&id| self.geometry(id).clone())
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| MultiPolygon::new(vec![]))
        })
        .unwrap_or_else(collect_all)
    }

    /// Sort ids by their region code.
    pub fn sort_by_code(&self, ids: &mut [RegionId]) {
        ids.sort_unstable_by(|&a, &b| self.code(a).cmp(self.code(b)));
    }
}
