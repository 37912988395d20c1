use geo::{Coord, Point, Rect};
use rstar::AABB;

/// Mean earth radius used by all great-circle computations, in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two lon/lat points using the haversine formula, in km.
pub fn haversine_km(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let delta_lat = (b.y() - a.y()).to_radians();
    let delta_lon = (b.x() - a.x()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Point reached by travelling `distance_km` from `origin` along the initial `bearing_deg`
/// (clockwise from north) on a sphere.
pub fn destination_point(origin: Point<f64>, bearing_deg: f64, distance_km: f64) -> Point<f64> {
    let delta = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.y().to_radians();
    let lon1 = origin.x().to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1 + (theta.sin() * delta.sin() * lat1.cos())
        .atan2(delta.cos() - lat1.sin() * lat2.sin());

    // Normalise longitude to [-180, 180).
    let lon2 = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    Point::new(lon2, lat2.to_degrees())
}

/// Lon/lat envelope that contains every point within `radius_km` of `center`.
pub fn envelope_around(center: Point<f64>, radius_km: f64) -> AABB<[f64; 2]> {
    let radius_km = radius_km.max(0.0);
    // Padded by a rounding margin so points exactly on the circle stay inside.
    let dlat = (radius_km / EARTH_RADIUS_KM).to_degrees() * (1.0 + 1e-9);
    // Widen longitude by the cosine at the pole-ward edge so the box never undershoots.
    let edge_lat = (center.y().abs() + dlat).min(89.9).to_radians();
    let dlon = (dlat / edge_lat.cos()).min(180.0);

    AABB::from_corners(
        [center.x() - dlon, center.y() - dlat],
        [center.x() + dlon, center.y() + dlat],
    )
}

/// Great-circle distance from `point` to the nearest point of `rect` (0 when inside), in km.
/// Clamping in lon/lat space is exact enough for the box sizes postal regions have.
pub fn rect_distance_km(point: Point<f64>, rect: &Rect<f64>) -> f64 {
    let nearest = Coord {
        x: point.x().clamp(rect.min().x, rect.max().x),
        y: point.y().clamp(rect.min().y, rect.max().y),
    };
    haversine_km(point, nearest.into())
}

#[cfg(test)]
mod tests {
    use geo::coord;
    use rstar::Envelope;

    use super::*;

    const MUNICH: (f64, f64) = (11.576, 48.137);
    const BERLIN: (f64, f64) = (13.405, 52.52);

    #[test]
    fn haversine_matches_known_city_distance() {
        let d = haversine_km(MUNICH.into(), BERLIN.into());
        assert!((d - 504.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn haversine_is_zero_for_same_point_and_symmetric() {
        let m: Point<f64> = MUNICH.into();
        let b: Point<f64> = BERLIN.into();
        assert_eq!(haversine_km(m, m), 0.0);
        assert!((haversine_km(m, b) - haversine_km(b, m)).abs() < 1e-9);
    }

    #[test]
    fn destination_point_travels_requested_distance() {
        let origin: Point<f64> = MUNICH.into();
        for bearing in [0.0, 45.0, 90.0, 180.0, 270.0] {
            let p = destination_point(origin, bearing, 10.0);
            assert!((haversine_km(origin, p) - 10.0).abs() < 1e-6, "bearing {bearing}");
        }
        let north = destination_point(origin, 0.0, 10.0);
        assert!(north.y() > origin.y());
        assert!((north.x() - origin.x()).abs() < 1e-9);
    }

    #[test]
    fn envelope_contains_circle() {
        let center: Point<f64> = MUNICH.into();
        let env = envelope_around(center, 25.0);
        for bearing in (0..360).step_by(15) {
            let p = destination_point(center, bearing as f64, 25.0);
            assert!(env.contains_point(&[p.x(), p.y()]), "bearing {bearing}");
        }
    }

    #[test]
    fn envelope_latitude_edge_matches_destination() {
        let center: Point<f64> = MUNICH.into();
        let env = envelope_around(center, 25.0);
        let north = destination_point(center, 0.0, 25.0);
        let south = destination_point(center, 180.0, 25.0);
        assert!((env.upper()[1] - north.y()).abs() < 1e-9);
        assert!((env.lower()[1] - south.y()).abs() < 1e-9);
    }

    #[test]
    fn rect_distance_is_zero_inside_and_positive_outside() {
        let rect = Rect::new(coord! { x: 11.0, y: 48.0 }, coord! { x: 12.0, y: 49.0 });
        assert_eq!(rect_distance_km(MUNICH.into(), &rect), 0.0);
        let outside = Point::new(12.0, 48.5 + 1.0);
        assert!(rect_distance_km(outside, &rect) > 50.0);
    }
}
