use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::geom::destination_point;

/// Vertex count used to approximate circles unless configured otherwise.
pub const DEFAULT_CIRCLE_VERTICES: usize = 64;

/// A transient shape produced by a drawing interaction, in lon/lat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawnShape {
    /// Freehand or lasso ring; closing the ring is optional.
    Polygon { vertices: Vec<[f64; 2]> },
    /// Circle of `radius_km` around `center`.
    Circle { center: [f64; 2], radius_km: f64 },
    /// Axis-aligned lon/lat rectangle.
    Rectangle { min: [f64; 2], max: [f64; 2] },
    /// Single click.
    Point { position: [f64; 2] },
}

impl DrawnShape {
    pub fn polygon(vertices: impl IntoIterator<Item = (f64, f64)>) -> Self {
        DrawnShape::Polygon { vertices: vertices.into_iter().map(|(x, y)| [x, y]).collect() }
    }

    pub fn circle(center: (f64, f64), radius_km: f64) -> Self {
        DrawnShape::Circle { center: [center.0, center.1], radius_km }
    }

    pub fn point(x: f64, y: f64) -> Self {
        DrawnShape::Point { position: [x, y] }
    }

    /// The click position, for point shapes.
    pub fn as_point(&self) -> Option<Point<f64>> {
        match self {
            DrawnShape::Point { position: [x, y] } if x.is_finite() && y.is_finite() => Some(Point::new(*x, *y)),
            _ => None,
        }
    }

    /// Polygonal query geometry for this shape, or `None` when the draw is degenerate
    /// (fewer than three distinct vertices, zero radius, empty rectangle) or a point.
    /// Circles become a geodesic `circle_vertices`-gon.
    pub fn to_polygon(&self, circle_vertices: usize) -> Option<MultiPolygon<f64>> {
        let ring = match self {
            DrawnShape::Polygon { vertices } => polygon_ring(vertices)?,
            DrawnShape::Circle { center: [x, y], radius_km } => {
                if !(radius_km.is_finite() && *radius_km > 0.0 && x.is_finite() && y.is_finite()) { return None }
                let n = circle_vertices.max(3);
                let center = Point::new(*x, *y);
                (0..n)
                    .map(|i| destination_point(center, i as f64 * 360.0 / n as f64, *radius_km).into())
                    .collect::<Vec<Coord<f64>>>()
            }
            DrawnShape::Rectangle { min: [x0, y0], max: [x1, y1] } => {
                if !(x0 < x1 && y0 < y1) { return None }
                vec![
                    Coord { x: *x0, y: *y0 },
                    Coord { x: *x1, y: *y0 },
                    Coord { x: *x1, y: *y1 },
                    Coord { x: *x0, y: *y1 },
                ]
            }
            DrawnShape::Point { .. } => return None,
        };

        Some(MultiPolygon::new(vec![Polygon::new(LineString::new(ring), vec![])]))
    }
}

/// Clean up a freehand ring: drop consecutive duplicates and the closing vertex.
/// Returns `None` if fewer than three distinct vertices remain.
fn polygon_ring(vertices: &[[f64; 2]]) -> Option<Vec<Coord<f64>>> {
    if vertices.iter().flatten().any(|v| !v.is_finite()) { return None }

    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(vertices.len());
    for &[x, y] in vertices {
        let c = Coord { x, y };
        if ring.last() != Some(&c) { ring.push(c) }
    }
    while ring.len() > 1 && ring.first() == ring.last() { ring.pop(); }

    let mut distinct = ring.iter().map(|c| (c.x.to_bits(), c.y.to_bits())).collect::<Vec<_>>();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 3 { return None }

    Some(ring)
}

#[cfg(test)]
mod tests {
    use geo::{Contains, CoordsIter};

    use super::*;
    use crate::geom::haversine_km;

    #[test]
    fn lasso_with_three_distinct_vertices_is_accepted() {
        let shape = DrawnShape::polygon([(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]);
        let mp = shape.to_polygon(DEFAULT_CIRCLE_VERTICES).unwrap();
        // 3 distinct vertices plus the closing one.
        assert_eq!(mp.0[0].exterior().coords_count(), 4);
    }

    #[test]
    fn degenerate_draws_yield_nothing() {
        assert!(DrawnShape::polygon([(0.0, 0.0), (1.0, 1.0)]).to_polygon(64).is_none());
        assert!(DrawnShape::polygon([(0.0, 0.0), (1.0, 1.0), (0.0, 0.0), (1.0, 1.0)]).to_polygon(64).is_none());
        assert!(DrawnShape::polygon([(0.0, 0.0), (f64::NAN, 1.0), (2.0, 0.0)]).to_polygon(64).is_none());
        assert!(DrawnShape::circle((11.5, 48.1), 0.0).to_polygon(64).is_none());
        assert!(DrawnShape::Rectangle { min: [1.0, 1.0], max: [1.0, 2.0] }.to_polygon(64).is_none());
        assert!(DrawnShape::point(1.0, 1.0).to_polygon(64).is_none());
    }

    #[test]
    fn circle_is_rasterized_on_its_radius() {
        let center = (11.576, 48.137);
        let mp = DrawnShape::circle(center, 10.0).to_polygon(64).unwrap();
        let exterior = mp.0[0].exterior();
        assert_eq!(exterior.coords_count(), 65);
        for c in exterior.coords() {
            let d = haversine_km(center.into(), (*c).into());
            assert!((d - 10.0).abs() < 1e-6);
        }
        assert!(mp.contains(&Point::new(center.0, center.1)));
    }

    #[test]
    fn shapes_deserialize_from_tagged_json() {
        let shape: DrawnShape = serde_json::from_str(
            r#"{"type": "circle", "center": [11.5, 48.1], "radius_km": 5.0}"#
        ).unwrap();
        assert_eq!(shape, DrawnShape::circle((11.5, 48.1), 5.0));
        let click: DrawnShape = serde_json::from_str(r#"{"type": "point", "position": [1.0, 2.0]}"#).unwrap();
        assert_eq!(click.as_point(), Some(Point::new(1.0, 2.0)));
    }
}
