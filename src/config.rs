use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geom::DEFAULT_CIRCLE_VERTICES;
use crate::index::OuterFrame;

/// Engine-wide settings. Every field has a default, so a config file only needs the keys
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Vertex count used to approximate drawn circles.
    pub circle_vertices: usize,
    /// Outer boundary used by fill-holes to decide what is "outside".
    pub outer_frame: OuterFrame,
    pub search: SearchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            circle_vertices: DEFAULT_CIRCLE_VERTICES,
            outer_frame: OuterFrame::default(),
            search: SearchConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Average driving speed for trips up to `up_to_km`; `None` is the open-ended last bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBracket {
    pub up_to_km: Option<f64>,
    pub kmh: f64,
}

/// Settings for the distance search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Inflation applied to the requested radius for the bounding-box pre-filter.
    pub prefilter_factor: f64,
    /// Maximum number of candidates passed on to distance resolution.
    pub max_candidates: usize,
    /// Destinations per routing request.
    pub batch_size: usize,
    /// Pause between routing requests, in milliseconds.
    pub batch_delay_ms: u64,
    /// Road-network inflation over straight-line distance used by the approximation model.
    pub road_factor: f64,
    /// Piecewise average speeds, ordered by `up_to_km`.
    pub speed_brackets: Vec<SpeedBracket>,
    /// Base URL of an OSRM-compatible routing service.
    pub routing_url: Option<String>,
    pub routing_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            prefilter_factor: 1.5,
            max_candidates: 1000,
            batch_size: 50,
            batch_delay_ms: 100,
            road_factor: 1.3,
            speed_brackets: vec![
                SpeedBracket { up_to_km: Some(5.0), kmh: 30.0 },
                SpeedBracket { up_to_km: Some(20.0), kmh: 50.0 },
                SpeedBracket { up_to_km: Some(50.0), kmh: 70.0 },
                SpeedBracket { up_to_km: None, kmh: 90.0 },
            ],
            routing_url: None,
            routing_timeout_secs: 10,
        }
    }
}

impl SearchConfig {
    /// Average speed for a road trip of `road_km`.
    pub fn speed_for(&self, road_km: f64) -> f64 {
        self.speed_brackets.iter()
            .find(|bracket| bracket.up_to_km.is_none_or(|limit| road_km <= limit))
            .or(self.speed_brackets.last())
            .map_or(50.0, |bracket| bracket.kmh)
    }

    /// Highest speed of any bracket, used to turn a time budget into a search radius.
    pub fn fastest_kmh(&self) -> f64 {
        self.speed_brackets.iter()
            .map(|bracket| bracket.kmh)
            .fold(None, |acc: Option<f64>, kmh| Some(acc.map_or(kmh, |a| a.max(kmh))))
            .unwrap_or(50.0)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn speed_brackets_are_piecewise() {
        let config = SearchConfig::default();
        assert_eq!(config.speed_for(2.0), 30.0);
        assert_eq!(config.speed_for(5.0), 30.0);
        assert_eq!(config.speed_for(12.0), 50.0);
        assert_eq!(config.speed_for(49.0), 70.0);
        assert_eq!(config.speed_for(400.0), 90.0);
        assert_eq!(config.fastest_kmh(), 90.0);
    }

    #[test]
    fn speed_without_open_bracket_uses_last() {
        let config = SearchConfig {
            speed_brackets: vec![SpeedBracket { up_to_km: Some(10.0), kmh: 40.0 }],
            ..SearchConfig::default()
        };
        assert_eq!(config.speed_for(100.0), 40.0);
        let empty = SearchConfig { speed_brackets: vec![], ..SearchConfig::default() };
        assert_eq!(empty.speed_for(1.0), 50.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "outer_frame": "bounding_box", "search": {{ "batch_size": 10 }} }}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.outer_frame, OuterFrame::BoundingBox);
        assert_eq!(config.search.batch_size, 10);
        assert_eq!(config.search.road_factor, 1.3);
        assert_eq!(config.circle_vertices, DEFAULT_CIRCLE_VERTICES);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(EngineConfig::from_json_file(Path::new("/nonexistent/plzmap.json")).is_err());
    }
}
