mod common;

use std::sync::OnceLock;

use ahash::AHashSet;
use plzmap::{AdjacencyResolver, BulkOperation, BulkOperator, GeometryIndex, Granularity, SelectionSet};
use proptest::prelude::*;

const N: usize = 4;

fn index() -> &'static GeometryIndex {
    static INDEX: OnceLock<GeometryIndex> = OnceLock::new();
    INDEX.get_or_init(|| common::grid(N))
}

fn code(cell: usize) -> String {
    format!("{}{}", cell / N, cell % N)
}

/// A random subset of the grid's codes.
fn arb_selection() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(0..N * N, 0..=N * N)
        .prop_map(|cells| cells.into_iter().map(code).collect())
}

proptest! {
    #[test]
    fn add_is_idempotent(codes in arb_selection(), extra in arb_selection()) {
        let mut once = SelectionSet::with_codes(Granularity::TwoDigit, &codes);
        once.add(&extra);
        let revision = once.revision();

        let mut twice = SelectionSet::with_codes(Granularity::TwoDigit, &codes);
        twice.add(&extra);
        prop_assert_eq!(twice.add(&extra), 0);

        prop_assert_eq!(once.snapshot(), twice.snapshot());
        prop_assert_eq!(twice.revision(), revision);
    }

    #[test]
    fn toggle_twice_restores(codes in arb_selection(), cell in 0..N * N) {
        let mut selection = SelectionSet::with_codes(Granularity::TwoDigit, &codes);
        let before = selection.snapshot();
        selection.toggle(&code(cell));
        selection.toggle(&code(cell));
        prop_assert_eq!(selection.snapshot(), before);
    }

    #[test]
    fn adjacency_is_symmetric(a in 0..N * N, b in 0..N * N) {
        let index = index();
        let (ra, rb) = (index.id_of(&code(a)).unwrap(), index.id_of(&code(b)).unwrap());
        let mut resolver = AdjacencyResolver::new(index);

        let ab = resolver.is_adjacent(ra, &AHashSet::from_iter([rb]));
        let ba = AdjacencyResolver::new(index).is_adjacent(rb, &AHashSet::from_iter([ra]));
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn expand_never_removes(codes in arb_selection()) {
        let mut selection = SelectionSet::with_codes(Granularity::TwoDigit, &codes);
        let before = selection.snapshot();
        let added = BulkOperator::new(index()).apply(BulkOperation::Expand, &mut selection);

        prop_assert!(before.iter().all(|code| selection.contains(code)));
        prop_assert!(added.iter().all(|code| !before.contains(code)));
    }

    #[test]
    fn fill_holes_is_idempotent(codes in arb_selection()) {
        let operator = BulkOperator::new(index());
        let mut selection = SelectionSet::with_codes(Granularity::TwoDigit, &codes);
        operator.apply(BulkOperation::FillHoles, &mut selection);

        prop_assert!(operator.fill_holes(&selection.snapshot()).is_empty());
    }

    #[test]
    fn shape_hits_really_intersect(x in 0.0..3.5f64, y in 0.0..3.5f64, w in 0.1..2.0f64, h in 0.1..2.0f64) {
        use geo::{Intersects, Polygon, LineString};

        let index = index();
        let vertices = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        let shape = plzmap::DrawnShape::polygon(vertices);
        let query = Polygon::new(LineString::from(vertices.to_vec()), vec![]);

        for code in plzmap::ShapeSelector::new(index).codes(&shape) {
            let id = index.id_of(&code).unwrap();
            prop_assert!(index.geometry(id).intersects(&query));
        }
    }
}
