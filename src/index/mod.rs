mod convert;
mod frame;
mod query;

use std::sync::Arc;

use ahash::AHashMap;
use geo::{BoundingRect, Centroid, Coord, InteriorPoint, MultiPolygon, Point, Rect};
use rstar::{RTree, AABB};
use tracing::{debug, info, warn};

use crate::geom::{repair_rings, BoundingBox, RepairStats};
use crate::region::{normalize_code, Granularity, RawRegion, Region, RegionId};

pub use convert::convert_codes;
pub use frame::OuterFrame;

/// What happened while building an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Regions excluded because their geometry was unrepairable or their code was blank.
    pub skipped: usize,
    /// Later occurrences of an already-indexed code.
    pub duplicates: usize,
    pub repairs: RepairStats,
}

/// Read-only spatial index over every region of one granularity.
///
/// Built once per dataset and shared behind an `Arc`; a dataset refresh or a granularity switch
/// builds a new index instead of mutating this one.
#[derive(Debug)]
pub struct GeometryIndex {
    granularity: Granularity,
    regions: Vec<Region>,
    lookup: AHashMap<Arc<str>, RegionId>,
    by_code: Vec<RegionId>, // All ids, sorted by code
    rtree: RTree<BoundingBox>,
    bounds: Vec<Rect<f64>>,
    anchors: Vec<Point<f64>>, // Interior point (lon, lat) used as routing destination
    exterior: Vec<bool>,      // Touches the dataset's outer frame
    extent: Option<Rect<f64>>,
    report: LoadReport,
}

impl GeometryIndex {
    /// Build an index using the default outer frame (convex hull of the dataset).
    pub fn build(granularity: Granularity, raw: Vec<RawRegion>) -> Self {
        Self::build_with_frame(granularity, raw, OuterFrame::default())
    }

    /// Build an index from raw regions, repairing rings and skipping regions that cannot be
    /// repaired. Never fails: bad features are logged and counted in [`LoadReport`].
    pub fn build_with_frame(granularity: Granularity, raw: Vec<RawRegion>, frame: OuterFrame) -> Self {
        let mut report = LoadReport::default();
        let mut regions = Vec::with_capacity(raw.len());
        let mut lookup = AHashMap::with_capacity(raw.len());
        let mut bounds = Vec::with_capacity(raw.len());

        for RawRegion { code, polygons, properties } in raw {
            let Some(code) = normalize_code(&code, granularity) else {
                warn!("skipping {granularity} region with blank code");
                report.skipped += 1;
                continue;
            };
            if lookup.contains_key(code.as_str()) {
                warn!("skipping duplicate {granularity} region {code}");
                report.duplicates += 1;
                continue;
            }

            let geometry = match repair_rings(&polygons) {
                Ok((geometry, stats)) => { report.repairs += stats; geometry }
                Err(e) => {
                    warn!("skipping {granularity} region {code}: {e}");
                    report.skipped += 1;
                    continue;
                }
            };
            let Some(rect) = geometry.bounding_rect() else {
                warn!("skipping {granularity} region {code}: empty geometry");
                report.skipped += 1;
                continue;
            };

            let code: Arc<str> = Arc::from(code);
            lookup.insert(code.clone(), RegionId(regions.len() as u32));
            bounds.push(rect);
            regions.push(Region { code, granularity, geometry, properties });
        }
        report.loaded = regions.len();

        let rtree = RTree::bulk_load(
            bounds.iter().enumerate()
                .map(|(i, rect)| BoundingBox::new(RegionId(i as u32), *rect))
                .collect()
        );

        let anchors = regions.iter()
            .zip(&bounds)
            .map(|(region, rect)| anchor_point(&region.geometry, rect))
            .collect();

        let mut by_code = (0..regions.len() as u32).map(RegionId).collect::<Vec<_>>();
        by_code.sort_unstable_by(|a, b| regions[a.idx()].code.cmp(&regions[b.idx()].code));

        let extent = bounds.iter().copied().reduce(|a, b| Rect::new(
            Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        ));

        let exterior = frame::exterior_flags(&regions, &bounds, extent, frame);

        info!(
            "indexed {} {granularity} regions ({} skipped, {} duplicates, {} rings closed, {} rings dropped)",
            report.loaded, report.skipped, report.duplicates,
            report.repairs.closed_rings, report.repairs.dropped_rings,
        );
        debug!("{} regions touch the outer frame", exterior.iter().filter(|&&e| e).count());

        Self { granularity, regions, lookup, by_code, rtree, bounds, anchors, exterior, extent, report }
    }

    #[inline] pub fn granularity(&self) -> Granularity { self.granularity }

    #[inline] pub fn len(&self) -> usize { self.regions.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    #[inline] pub fn report(&self) -> LoadReport { self.report }

    /// Bounding box of the whole dataset, `None` when empty.
    #[inline] pub fn extent(&self) -> Option<Rect<f64>> { self.extent }

    #[inline] pub fn region(&self, id: RegionId) -> &Region { &self.regions[id.idx()] }

    #[inline] pub fn code(&self, id: RegionId) -> &str { &self.regions[id.idx()].code }

    #[inline] pub fn geometry(&self, id: RegionId) -> &MultiPolygon<f64> { &self.regions[id.idx()].geometry }

    #[inline] pub fn bounds(&self, id: RegionId) -> &Rect<f64> { &self.bounds[id.idx()] }

    /// Representative point inside the region.
    #[inline] pub fn anchor(&self, id: RegionId) -> Point<f64> { self.anchors[id.idx()] }

    /// True if the region touches the dataset's outer frame.
    #[inline] pub fn is_exterior(&self, id: RegionId) -> bool { self.exterior[id.idx()] }

    /// Look up a region by its canonical code.
    #[inline] pub fn id_of(&self, code: &str) -> Option<RegionId> { self.lookup.get(code).copied() }

    /// All region ids in load order.
    pub fn ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        (0..self.regions.len() as u32).map(RegionId)
    }

    /// All region ids ordered by code.
    #[inline] pub fn ids_by_code(&self) -> &[RegionId] { &self.by_code }

    /// Resolve codes to ids, normalizing them first; unknown codes are dropped.
    pub fn resolve<S: AsRef<str>>(&self, codes: &[S]) -> Vec<RegionId> {
        codes.iter()
            .filter_map(|code| normalize_code(code.as_ref(), self.granularity))
            .filter_map(|code| self.id_of(&code))
            .collect()
    }

    /// Codes for `ids`, sorted and de-duplicated.
    pub fn codes_of(&self, ids: impl IntoIterator<Item = RegionId>) -> Vec<String> {
        let mut codes = ids.into_iter().map(|id| self.code(id).to_string()).collect::<Vec<_>>();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    /// Query the R-tree for bounding boxes intersecting the given envelope.
    #[inline]
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = &BoundingBox> + use<'_> {
        self.rtree.locate_in_envelope_intersecting(envelope)
    }
}

/// Interior point when `geo` can find one, else the centroid, else the box centre.
fn anchor_point(geometry: &MultiPolygon<f64>, rect: &Rect<f64>) -> Point<f64> {
    geometry.interior_point()
        .or_else(|| geometry.centroid())
        .unwrap_or_else(|| rect.center().into())
}
