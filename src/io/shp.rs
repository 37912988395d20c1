use std::path::Path;

use anyhow::{Context, Result};
use geo::Coord;
use serde_json::{json, Map, Value};
use shapefile::{self as shp, dbase::FieldValue, Shape};
use tracing::warn;

use crate::region::{code_from_properties, Granularity, RawRegion};

/// Read regions from an ESRI Shapefile; the code comes from the `.dbf` attributes.
pub fn read_shapefile(path: &Path, granularity: Granularity) -> Result<Vec<RawRegion>> {
    let mut reader = shp::Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut regions = Vec::new();
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.with_context(|| format!("Error reading shape+record in {}", path.display()))?;

        let properties = record_properties(record);
        let Some(code) = code_from_properties(&properties, granularity) else {
            warn!(feature = i, "skipping shape without postal code attribute");
            continue;
        };

        let polygons = match &shape {
            Shape::Polygon(p) => group_rings(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonM(p) => group_rings(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonZ(p) => group_rings(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            other => {
                warn!(feature = i, %code, shape = ?other.shapetype(), "skipping non-polygon shape");
                continue;
            }
        };

        regions.push(RawRegion::new(code, polygons).with_properties(properties));
    }
    Ok(regions)
}

/// Group shapefile rings into polygons: each outer ring owns the inner rings that follow it.
/// Inner rings before any outer ring are dropped.
fn group_rings<P>(rings: &[shp::PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> Vec<Vec<Vec<Coord<f64>>>> {
    let mut polygons: Vec<Vec<Vec<Coord<f64>>>> = Vec::new();
    for ring in rings {
        let coords = ring.points().iter().map(&xy).collect::<Vec<_>>();
        match ring {
            shp::PolygonRing::Outer(_) => polygons.push(vec![coords]),
            shp::PolygonRing::Inner(_) => match polygons.last_mut() {
                Some(polygon) => polygon.push(coords),
                None => warn!("dropping hole ring without exterior"),
            },
        }
    }
    polygons
}

/// Attribute record as JSON properties. Integral numbers become JSON integers so numeric
/// postal codes normalize the same way as in GeoJSON.
fn record_properties(record: impl IntoIterator<Item = (String, FieldValue)>) -> Map<String, Value> {
    record.into_iter()
        .map(|(field, value)| {
            let value = match value {
                FieldValue::Character(Some(s)) => json!(s.trim()),
                FieldValue::Numeric(Some(n)) | FieldValue::Double(n) => number(n),
                FieldValue::Float(Some(n)) => number(n as f64),
                FieldValue::Integer(n) => json!(n),
                FieldValue::Logical(Some(b)) => json!(b),
                _ => Value::Null,
            };
            (field, value)
        })
        .collect()
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 { json!(n as i64) } else { json!(n) }
}
