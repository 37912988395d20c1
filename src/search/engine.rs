use std::{thread, time::Duration};

use geo::Point;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::geom::haversine_km;
use crate::index::GeometryIndex;
use crate::region::RegionId;

use super::approx::ApproximationModel;
use super::routing::{RoutingError, RoutingService};
use super::{SearchHit, SearchMetric, SearchOutcome, SearchRequest, SearchResult, TravelMode};

/// Finds regions within a radius of a point by straight-line or driving distance/time.
///
/// One instance can serve many requests; each [`run`](Self::run) is independent and can be
/// abandoned through its cancellation token.
pub struct DistanceSearch<'a> {
    index: &'a GeometryIndex,
    config: &'a SearchConfig,
    router: Option<&'a dyn RoutingService>,
}

/// `(region, road km, minutes)` for each routed candidate; `None` means unroutable.
type Resolved = Vec<(RegionId, Option<f64>, Option<f64>)>;

impl<'a> DistanceSearch<'a> {
    pub fn new(index: &'a GeometryIndex, config: &'a SearchConfig) -> Self {
        Self { index, config, router: None }
    }

    /// Use `router` for driving searches instead of the approximation model.
    pub fn with_router(mut self, router: &'a dyn RoutingService) -> Self {
        self.router = Some(router);
        self
    }

    /// Run one search. Invalid input (non-finite center, non-positive radius) yields an empty
    /// result. Returns [`SearchOutcome::Cancelled`] if `cancel` fires before routing finishes.
    pub fn run(&self, request: &SearchRequest, cancel: &CancellationToken) -> SearchOutcome {
        if cancel.is_cancelled() { return SearchOutcome::Cancelled }

        let [lon, lat] = request.center;
        if !lon.is_finite() || !lat.is_finite() || !request.radius.is_finite() || request.radius <= 0.0 {
            debug!(?request, "ignoring invalid search request");
            return SearchOutcome::Completed(SearchResult::default());
        }
        let center = Point::new(lon, lat);

        let candidates = self.prefilter(center, request);
        if candidates.is_empty() { return SearchOutcome::Completed(SearchResult::default()) }

        let mut result = SearchResult::default();
        let mut hits = match request.travel {
            TravelMode::StraightLine => self.straight_line(center, &candidates),
            TravelMode::Driving => match self.router {
                None => {
                    debug!("no routing service configured; approximating driving distances");
                    result.fell_back_to_approximation = true;
                    self.approximate(center, &candidates)
                }
                Some(router) => match self.route(router, center, &candidates, cancel) {
                    Ok(Some(resolved)) => self.hits_from(resolved),
                    Ok(None) => {
                        info!("search cancelled between routing batches");
                        return SearchOutcome::Cancelled;
                    }
                    Err(e) => {
                        warn!(error = %e, "routing failed; falling back to approximation");
                        result.fell_back_to_approximation = true;
                        result.error = Some(e.to_string());
                        self.approximate(center, &candidates)
                    }
                },
            },
        };

        hits.retain(|hit| hit.metric(request.metric).is_some_and(|value| value <= request.radius));
        hits.sort_by(|a, b| {
            let (x, y) = (a.metric(request.metric), b.metric(request.metric));
            x.unwrap_or(f64::INFINITY).total_cmp(&y.unwrap_or(f64::INFINITY))
                .then_with(|| a.code.cmp(&b.code))
        });

        debug!(candidates = candidates.len(), hits = hits.len(), "search finished");
        result.hits = hits;
        SearchOutcome::Completed(result)
    }

    /// Bounding-box candidates within the inflated radius, nearest first, capped.
    fn prefilter(&self, center: Point<f64>, request: &SearchRequest) -> Vec<RegionId> {
        let radius_km = match request.metric {
            SearchMetric::Distance => request.radius,
            SearchMetric::Time => request.radius / 60.0 * self.config.fastest_kmh(),
        } * self.config.prefilter_factor;

        let mut candidates = self.index.candidates_near(center, radius_km);
        if candidates.len() > self.config.max_candidates {
            debug!(found = candidates.len(), cap = self.config.max_candidates, "capping search candidates");
            candidates.truncate(self.config.max_candidates);
        }
        candidates
    }

    /// Great-circle distance to each anchor; the region containing the center is at 0.
    fn straight_line(&self, center: Point<f64>, candidates: &[RegionId]) -> Vec<SearchHit> {
        let home = self.index.region_at(center);
        let model = ApproximationModel::new(self.config);

        candidates.iter()
            .map(|&id| {
                let km = if Some(id) == home { 0.0 } else { haversine_km(center, self.index.anchor(id)) };
                SearchHit {
                    code: self.index.code(id).to_string(),
                    distance_km: km,
                    duration_min: Some(model.estimate(km).1),
                }
            })
            .collect()
    }

    /// Approximated road distance and travel time for every candidate.
    fn approximate(&self, center: Point<f64>, candidates: &[RegionId]) -> Vec<SearchHit> {
        let model = ApproximationModel::new(self.config);
        candidates.iter()
            .map(|&id| {
                let (road_km, minutes) = model.estimate(haversine_km(center, self.index.anchor(id)));
                SearchHit { code: self.index.code(id).to_string(), distance_km: road_km, duration_min: Some(minutes) }
            })
            .collect()
    }

    /// Query the routing service batch by batch. `Ok(None)` means cancelled; any failed batch
    /// aborts the whole computation.
    fn route(
        &self,
        router: &dyn RoutingService,
        center: Point<f64>,
        candidates: &[RegionId],
        cancel: &CancellationToken,
    ) -> Result<Option<Resolved>, RoutingError> {
        let batch_size = self.config.batch_size.max(1);
        let delay = Duration::from_millis(self.config.batch_delay_ms);
        let mut resolved = Vec::with_capacity(candidates.len());

        for (i, batch) in candidates.chunks(batch_size).enumerate() {
            if i > 0 && !delay.is_zero() { thread::sleep(delay) }
            if cancel.is_cancelled() { return Ok(None) }

            let destinations = batch.iter().map(|&id| self.index.anchor(id)).collect::<Vec<_>>();
            let matrix = router.distance_matrix(center, &destinations)?;
            if matrix.distances_km.len() != batch.len() || matrix.durations_min.len() != batch.len() {
                return Err(RoutingError::Malformed(format!(
                    "expected {} matrix entries, got {} distances and {} durations",
                    batch.len(), matrix.distances_km.len(), matrix.durations_min.len(),
                )));
            }

            debug!(batch = i, size = batch.len(), "routing batch resolved");
            resolved.extend(
                batch.iter().zip(matrix.distances_km.into_iter().zip(matrix.durations_min))
                    .map(|(&id, (km, min))| (id, km, min))
            );
        }

        if cancel.is_cancelled() { return Ok(None) }
        Ok(Some(resolved))
    }

    /// Unroutable destinations (no distance) are dropped.
    fn hits_from(&self, resolved: Resolved) -> Vec<SearchHit> {
        resolved.into_iter()
            .filter_map(|(id, km, minutes)| Some(SearchHit {
                code: self.index.code(id).to_string(),
                distance_km: km?,
                duration_min: minutes,
            }))
            .collect()
    }
}
