#![allow(dead_code)]

use geo::Coord;
use plzmap::{GeometryIndex, Granularity, RawRegion};

/// Axis-aligned rectangle ring set with lower-left corner at (x, y).
pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Vec<Vec<Vec<Coord<f64>>>> {
    vec![vec![vec![
        Coord { x, y },
        Coord { x: x + w, y },
        Coord { x: x + w, y: y + h },
        Coord { x, y: y + h },
        Coord { x, y },
    ]]]
}

pub fn square(x: f64, y: f64) -> Vec<Vec<Vec<Coord<f64>>>> {
    rect(x, y, 1.0, 1.0)
}

/// `n x n` grid of unit squares at 2-digit granularity; cell (col, row) is code `{row}{col}`.
pub fn grid(n: usize) -> GeometryIndex {
    let raw = (0..n)
        .flat_map(|row| (0..n).map(move |col| (row, col)))
        .map(|(row, col)| RawRegion::new(format!("{row}{col}"), square(col as f64, row as f64)))
        .collect();
    GeometryIndex::build(Granularity::TwoDigit, raw)
}
