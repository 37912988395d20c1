mod approx;
mod engine;
#[cfg(feature = "routing")]
mod osrm;
mod routing;

use serde::{Deserialize, Serialize};

pub use approx::ApproximationModel;
pub use engine::DistanceSearch;
#[cfg(feature = "routing")]
pub use osrm::OsrmRouter;
pub use routing::{DistanceMatrix, RoutingError, RoutingService};

/// Which value the radius limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMetric {
    /// Radius in km.
    #[default]
    Distance,
    /// Radius in minutes.
    Time,
}

/// How distances are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    /// Great-circle distance; always available.
    #[default]
    StraightLine,
    /// Road distance and travel time from the routing service, or the approximation model.
    Driving,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Search center as `[lon, lat]`.
    pub center: [f64; 2],
    /// km for [`SearchMetric::Distance`], minutes for [`SearchMetric::Time`].
    pub radius: f64,
    #[serde(default)]
    pub metric: SearchMetric,
    #[serde(default)]
    pub travel: TravelMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub code: String,
    pub distance_km: f64,
    pub duration_min: Option<f64>,
}

impl SearchHit {
    /// The value the radius was compared against.
    pub fn metric(&self, metric: SearchMetric) -> Option<f64> {
        match metric {
            SearchMetric::Distance => Some(self.distance_km),
            SearchMetric::Time => self.duration_min,
        }
    }
}

/// Hits sorted ascending by the requested metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    /// Values come from the approximation model rather than the routing service.
    pub fell_back_to_approximation: bool,
    /// Why the routing service could not be used, if it failed.
    pub error: Option<String>,
}

impl SearchResult {
    pub fn codes(&self) -> Vec<String> {
        self.hits.iter().map(|hit| hit.code.clone()).collect()
    }
}

/// Terminal state of one search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Completed(SearchResult),
    /// Superseded by the caller before routing finished; no partial result is reported.
    Cancelled,
}

impl SearchOutcome {
    pub fn result(self) -> Option<SearchResult> {
        match self {
            SearchOutcome::Completed(result) => Some(result),
            SearchOutcome::Cancelled => None,
        }
    }
}
