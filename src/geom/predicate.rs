use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::{BoundingRect, Intersects, MultiPolygon, Point, Polygon};
use tracing::warn;

/// Run a geometric computation, converting a panic inside it into `None`.
/// Degenerate rings can trip assertions deep inside `geo`; one bad pair must not abort a batch.
pub fn guarded<T>(f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("geometric predicate failed on degenerate input; treating as non-intersecting");
            None
        }
    }
}

/// Intersection test between two single polygons with a bounding-box short circuit.
/// Shared edges and single shared vertices both count.
fn polygon_pair_intersects(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) if ra.intersects(&rb) => guarded(|| a.intersects(b)).unwrap_or(false),
        _ => false,
    }
}

/// True if any constituent polygon of `a` intersects any constituent polygon of `b`.
pub fn polygons_intersect(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    a.0.iter().any(|pa| b.0.iter().any(|pb| polygon_pair_intersects(pa, pb)))
}

/// True if `point` lies inside or on the boundary of `geometry`.
pub fn point_touches(geometry: &MultiPolygon<f64>, point: Point<f64>) -> bool {
    geometry.0.iter().any(|polygon| guarded(|| polygon.intersects(&point)).unwrap_or(false))
}
