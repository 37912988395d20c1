use crate::config::SearchConfig;

/// Road distance and travel time estimated from straight-line distance, for when no routing
/// service answers. Distance is inflated by a fixed road factor; time uses an average speed
/// picked by distance bracket (slow urban short trips, fast long highway trips).
#[derive(Debug, Clone, Copy)]
pub struct ApproximationModel<'a> {
    config: &'a SearchConfig,
}

impl<'a> ApproximationModel<'a> {
    pub fn new(config: &'a SearchConfig) -> Self {
        Self { config }
    }

    /// Estimated road distance in km.
    pub fn road_km(&self, straight_km: f64) -> f64 {
        straight_km * self.config.road_factor
    }

    /// Estimated `(road km, minutes)` for a straight-line distance.
    pub fn estimate(&self, straight_km: f64) -> (f64, f64) {
        let road_km = self.road_km(straight_km);
        let kmh = self.config.speed_for(road_km);
        (road_km, road_km / kmh * 60.0)
    }
}
