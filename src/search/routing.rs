use geo::Point;
use thiserror::Error;

/// Failure of the external routing service.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Transport(String),
    #[error("routing request timed out")]
    Timeout,
    #[error("routing service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed routing response: {0}")]
    Malformed(String),
}

/// Road distances and durations from one origin, aligned with the requested destinations.
/// `None` marks a destination the service could not route to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceMatrix {
    pub distances_km: Vec<Option<f64>>,
    pub durations_min: Vec<Option<f64>>,
}

/// External distance/duration matrix provider.
pub trait RoutingService: Send + Sync {
    /// One row of the matrix: `origin` to each of `destinations`, all lon/lat.
    fn distance_matrix(&self, origin: Point<f64>, destinations: &[Point<f64>]) -> Result<DistanceMatrix, RoutingError>;
}
