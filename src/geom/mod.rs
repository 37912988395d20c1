mod bbox;
mod distance;
mod predicate;
mod repair;
mod shape;

pub(crate) use bbox::BoundingBox;
pub use distance::{destination_point, envelope_around, haversine_km, rect_distance_km};
pub use predicate::{guarded, point_touches, polygons_intersect};
pub use repair::{repair_rings, RepairError, RepairStats};
pub use shape::{DrawnShape, DEFAULT_CIRCLE_VERTICES};
