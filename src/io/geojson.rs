use std::{fs::File, io::BufReader, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;
use geo::{Coord, MultiPolygon, Rect};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::index::GeometryIndex;
use crate::region::{code_from_properties, normalize_code, Granularity, RawRegion};

/// Read a GeoJSON FeatureCollection, gzip-compressed if the file name ends in `.gz`.
pub fn read_geojson(path: &Path, granularity: Granularity) -> Result<Vec<RawRegion>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;

    let gzipped = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    let json: Value = if gzipped {
        serde_json::from_reader(BufReader::new(GzDecoder::new(file)))
    } else {
        serde_json::from_reader(BufReader::new(file))
    }
    .with_context(|| format!("Failed to parse GeoJSON {}", path.display()))?;

    parse_feature_collection(&json, granularity)
        .with_context(|| format!("Invalid dataset {}", path.display()))
}

/// Extract regions from a parsed FeatureCollection. Features without a usable code or
/// polygonal geometry are skipped with a warning.
pub fn parse_feature_collection(json: &Value, granularity: Granularity) -> Result<Vec<RawRegion>> {
    if json.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        bail!("expected a GeoJSON FeatureCollection");
    }
    let features = json.get("features").and_then(Value::as_array)
        .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?;

    let mut regions = Vec::with_capacity(features.len());
    let mut skipped = 0;
    for (i, feature) in features.iter().enumerate() {
        match parse_feature(feature, granularity) {
            Ok(region) => regions.push(region),
            Err(e) => {
                warn!(feature = i, error = %e, "skipping feature");
                skipped += 1;
            }
        }
    }
    if skipped > 0 { warn!(skipped, kept = regions.len(), "dataset contained unusable features") }

    Ok(regions)
}

fn parse_feature(feature: &Value, granularity: Granularity) -> Result<RawRegion> {
    let properties = match feature.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    let code = code_from_properties(&properties, granularity)
        .or_else(|| match feature.get("id") {
            Some(Value::String(s)) => normalize_code(s, granularity),
            Some(Value::Number(n)) => normalize_code(&n.to_string(), granularity),
            _ => None,
        })
        .ok_or_else(|| anyhow!("no postal code property"))?;

    let geometry = feature.get("geometry").filter(|g| !g.is_null())
        .ok_or_else(|| anyhow!("feature {code} has no geometry"))?;
    let coordinates = geometry.get("coordinates")
        .ok_or_else(|| anyhow!("feature {code} geometry has no coordinates"))?;

    let polygons = match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => vec![parse_polygon(coordinates)?],
        Some("MultiPolygon") => coordinates.as_array()
            .ok_or_else(|| anyhow!("MultiPolygon coordinates must be an array"))?
            .iter()
            .map(parse_polygon)
            .collect::<Result<_>>()?,
        other => bail!("feature {code} has unsupported geometry type {other:?}"),
    };

    Ok(RawRegion::new(code, polygons).with_properties(properties))
}

fn parse_polygon(value: &Value) -> Result<Vec<Vec<Coord<f64>>>> {
    value.as_array()
        .ok_or_else(|| anyhow!("polygon must be an array of rings"))?
        .iter()
        .map(|ring| -> Result<Vec<Coord<f64>>> {
            ring.as_array()
                .ok_or_else(|| anyhow!("ring must be an array of positions"))?
                .iter()
                .map(parse_position)
                .collect()
        })
        .collect()
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    match value.as_array().map(Vec::as_slice) {
        Some([x, y, ..]) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => bail!("position has non-numeric coordinates"),
        },
        _ => bail!("position must have at least two coordinates"),
    }
}

/// Export the selected regions as a FeatureCollection, ordered by code. Each feature's id is
/// its code. Unknown codes are left out.
pub fn selection_to_geojson<S: AsRef<str>>(index: &GeometryIndex, codes: &[S]) -> Value {
    let mut ids = index.resolve(codes);
    index.sort_by_code(&mut ids);
    ids.dedup();

    let features = ids.into_iter()
        .map(|id| {
            let region = index.region(id);
            let mut properties = Map::new();
            properties.insert("code".to_string(), json!(&*region.code));
            if let Some(name) = region.name() {
                properties.insert("name".to_string(), json!(name));
            }
            json!({
                "type": "Feature",
                "id": &*region.code,
                "geometry": multipolygon_to_geojson(&region.geometry),
                "properties": properties,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Combined bounding box of the given regions, for zooming to a selection.
pub fn region_bounds<S: AsRef<str>>(index: &GeometryIndex, codes: &[S]) -> Option<Rect<f64>> {
    index.resolve(codes).into_iter()
        .map(|id| *index.bounds(id))
        .reduce(|a, b| Rect::new(
            Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
            Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
        ))
}

fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    let polygons = mp.0.iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};
    use geo::coord;

    use super::*;
    use crate::index::tests::grid;

    fn square_feature(properties: Value, x: f64, y: f64) -> Value {
        json!({
            "type": "Feature",
            "properties": properties,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0], [x, y]]],
            },
        })
    }

    fn collection() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                square_feature(json!({ "plz": "1067", "note": "Dresden" }), 0.0, 0.0),
                square_feature(json!({ "PLZ": 80331 }), 1.0, 0.0),
                { "type": "Feature", "properties": { "code": "99999" }, "geometry": null },
                square_feature(json!({ "einwohner": 10 }), 2.0, 0.0),
                {
                    "type": "Feature",
                    "properties": { "code": "20095" },
                    "geometry": { "type": "Point", "coordinates": [10.0, 53.5] },
                },
                {
                    "type": "Feature",
                    "properties": { "code": "10115" },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]],
                            [[[7.0, 7.0], [8.0, 7.0], [8.0, 8.0], [7.0, 7.0]]],
                        ],
                    },
                },
            ],
        })
    }

    #[test]
    fn parses_polygons_and_normalizes_codes() {
        let regions = parse_feature_collection(&collection(), Granularity::FiveDigit).unwrap();
        let codes = regions.iter().map(|r| r.code.as_str()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["01067", "80331", "10115"]);
        assert_eq!(regions[0].properties.get("note"), Some(&json!("Dresden")));
        assert_eq!(regions[2].polygons.len(), 2);
    }

    #[test]
    fn rejects_non_collections() {
        assert!(parse_feature_collection(&json!({ "type": "Feature" }), Granularity::FiveDigit).is_err());
        assert!(parse_feature_collection(&json!({ "type": "FeatureCollection" }), Granularity::FiveDigit).is_err());
    }

    #[test]
    fn reads_plain_and_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let text = collection().to_string();

        let plain = dir.path().join("plz-5stellig.geojson");
        std::fs::write(&plain, &text).unwrap();

        let gz = dir.path().join("plz-5stellig.geojson.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_geojson(&plain, Granularity::FiveDigit).unwrap().len(), 3);
        assert_eq!(read_geojson(&gz, Granularity::FiveDigit).unwrap().len(), 3);
        assert!(read_geojson(&dir.path().join("missing.geojson"), Granularity::FiveDigit).is_err());

        let broken = dir.path().join("broken.geojson");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(read_geojson(&broken, Granularity::FiveDigit).is_err());
    }

    #[test]
    fn exports_selected_regions_in_code_order() {
        let index = grid(3);
        let json = selection_to_geojson(&index, &["11", "00", "zz", "00"]);
        let features = json["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["id"], json!("00"));
        assert_eq!(features[1]["properties"]["code"], json!("11"));
        assert_eq!(features[0]["geometry"]["type"], json!("MultiPolygon"));
        assert_eq!(features[0]["geometry"]["coordinates"][0][0].as_array().unwrap().len(), 5);
    }

    #[test]
    fn bounds_cover_every_selected_region() {
        let index = grid(3);
        assert_eq!(
            region_bounds(&index, &["00", "12"]),
            Some(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 3.0, y: 2.0 })),
        );
        assert_eq!(region_bounds::<&str>(&index, &[]), None);
    }
}
