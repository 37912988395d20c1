use geo::{Coord, LineString, MultiPolygon, Polygon};
use thiserror::Error;

/// Why a region's rings could not be turned into a usable geometry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepairError {
    #[error("ring {ring} of polygon {polygon} contains a non-finite coordinate")]
    NonFinite { polygon: usize, ring: usize },
    #[error("no polygon with a valid exterior ring remains")]
    Empty,
}

/// Counts of the fixes applied while repairing one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairStats {
    pub closed_rings: usize,
    pub dropped_rings: usize,
    pub dropped_polygons: usize,
}

impl std::ops::AddAssign for RepairStats {
    fn add_assign(&mut self, other: Self) {
        self.closed_rings += other.closed_rings;
        self.dropped_rings += other.dropped_rings;
        self.dropped_polygons += other.dropped_polygons;
    }
}

/// Turn raw rings into a MultiPolygon.
///
/// Unclosed rings are closed by repeating their first vertex; rings with fewer than four
/// points after closing are dropped. A polygon whose exterior is dropped goes with it.
/// Non-finite coordinates are not repairable and fail the whole region.
pub fn repair_rings(polygons: &[Vec<Vec<Coord<f64>>>]) -> Result<(MultiPolygon<f64>, RepairStats), RepairError> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<Coord<f64>>) -> bool {
        match (coords.first(), coords.last()) {
            (Some(&first), Some(&last)) if first != last => { coords.push(first); true }
            _ => false,
        }
    }

    let mut stats = RepairStats::default();
    let mut result = Vec::with_capacity(polygons.len());

    for (p, rings) in polygons.iter().enumerate() {
        let mut kept: Vec<Option<LineString<f64>>> = Vec::with_capacity(rings.len());
        for (r, ring) in rings.iter().enumerate() {
            if ring.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(RepairError::NonFinite { polygon: p, ring: r });
            }

            let mut coords = ring.clone();
            if ensure_closed(&mut coords) { stats.closed_rings += 1 }

            if coords.len() < 4 {
                stats.dropped_rings += 1;
                kept.push(None);
            } else {
                kept.push(Some(LineString::new(coords)));
            }
        }

        let mut kept = kept.into_iter();
        match kept.next().flatten() {
            Some(exterior) => result.push(Polygon::new(exterior, kept.flatten().collect())),
            None => stats.dropped_polygons += 1,
        }
    }

    if result.is_empty() { return Err(RepairError::Empty) }

    Ok((MultiPolygon::new(result), stats))
}
