use geo::{BoundingRect, ConvexHull, Coord, CoordsIter, Intersects, Line, LineString, MultiPoint, Rect};
use serde::{Deserialize, Serialize};

use crate::geom::guarded;
use crate::region::Region;

/// What counts as the outer boundary of a dataset when deciding which regions are "outside".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OuterFrame {
    /// Convex hull of every region vertex.
    #[default]
    ConvexHull,
    /// Axis-aligned bounding box of the dataset.
    BoundingBox,
}

impl OuterFrame {
    /// Ring tracing this frame around `regions`, `None` for an empty dataset.
    fn ring(&self, regions: &[Region], extent: Option<Rect<f64>>) -> Option<LineString<f64>> {
        let extent = extent?;
        match self {
            OuterFrame::BoundingBox => Some(extent.to_polygon().exterior().clone()),
            OuterFrame::ConvexHull => {
                let points = regions.iter()
                    .flat_map(|region| region.geometry.0.iter().flat_map(|p| p.exterior().coords_iter()))
                    .collect::<Vec<Coord<f64>>>();
                let hull = MultiPoint::from(points).convex_hull();
                Some(hull.exterior().clone())
            }
        }
    }
}

/// Flag every region that touches the frame ring.
/// Frame segments are matched against region bounding boxes before any exact test.
pub(super) fn exterior_flags(regions: &[Region], bounds: &[Rect<f64>], extent: Option<Rect<f64>>, frame: OuterFrame) -> Vec<bool> {
    let Some(ring) = frame.ring(regions, extent) else { return vec![false; regions.len()] };

    let segments = ring.lines()
        .map(|line: Line<f64>| (line.bounding_rect(), line))
        .collect::<Vec<_>>();

    regions.iter().zip(bounds)
        .map(|(region, rect)| {
            segments.iter()
                .filter(|(seg_rect, _)| seg_rect.intersects(rect))
                .any(|(_, line)| guarded(|| region.geometry.intersects(line)).unwrap_or(false))
        })
        .collect()
}
