use std::time::Duration;

use geo::Point;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use super::routing::{DistanceMatrix, RoutingError, RoutingService};

/// [`RoutingService`] backed by the `table` service of an OSRM-compatible server.
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: Client,
    base_url: String,
}

impl OsrmRouter {
    /// `base_url` is the server root, e.g. `https://router.project-osrm.org`.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .user_agent(concat!("plzmap/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RoutingError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    /// One-to-many table request: source 0 is the origin, destinations are 1..=n.
    pub(crate) fn table_url(&self, origin: Point<f64>, destinations: &[Point<f64>]) -> String {
        let coordinates = std::iter::once(origin)
            .chain(destinations.iter().copied())
            .map(|p| format!("{:.6},{:.6}", p.x(), p.y()))
            .collect::<Vec<_>>()
            .join(";");
        let targets = (1..=destinations.len())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/driving/{coordinates}?sources=0&destinations={targets}&annotations=distance,duration",
            self.base_url,
        )
    }
}

impl RoutingService for OsrmRouter {
    fn distance_matrix(&self, origin: Point<f64>, destinations: &[Point<f64>]) -> Result<DistanceMatrix, RoutingError> {
        if destinations.is_empty() { return Ok(DistanceMatrix::default()) }

        let url = self.table_url(origin, destinations);
        debug!(destinations = destinations.len(), "requesting OSRM table");

        let response = self.client.get(&url).send().map_err(|e| {
            if e.is_timeout() { RoutingError::Timeout } else { RoutingError::Transport(e.to_string()) }
        })?;

        let status = response.status();
        let body = response.text().map_err(|e| RoutingError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(RoutingError::Status { status: status.as_u16(), message: body });
        }

        parse_table(&body, destinations.len())
    }
}

/// Parse an OSRM table response body into km and minutes.
pub(crate) fn parse_table(body: &str, expected: usize) -> Result<DistanceMatrix, RoutingError> {
    let json: Value = serde_json::from_str(body).map_err(|e| RoutingError::Malformed(e.to_string()))?;

    let code = json.get("code").and_then(Value::as_str).unwrap_or("");
    if code != "Ok" {
        let message = json.get("message").and_then(Value::as_str).unwrap_or(code);
        return Err(RoutingError::Malformed(format!("service returned code {code:?}: {message}")));
    }

    let row = |key: &str, scale: f64| -> Result<Vec<Option<f64>>, RoutingError> {
        let values = json.get(key)
            .and_then(|rows| rows.get(0))
            .and_then(Value::as_array)
            .ok_or_else(|| RoutingError::Malformed(format!("missing {key} row")))?;
        if values.len() != expected {
            return Err(RoutingError::Malformed(format!("{key} row has {} entries, expected {expected}", values.len())));
        }
        Ok(values.iter().map(|v| v.as_f64().map(|x| x / scale)).collect())
    };

    Ok(DistanceMatrix {
        distances_km: row("distances", 1000.0)?,
        durations_min: row("durations", 60.0)?,
    })
}
