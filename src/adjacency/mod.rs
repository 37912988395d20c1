use ahash::{AHashMap, AHashSet};
use geo::{Intersects, MultiPolygon};
use smallvec::SmallVec;

use crate::geom::polygons_intersect;
use crate::index::GeometryIndex;
use crate::region::RegionId;

/// Neighbor list of one region; most postal regions have a handful of neighbors.
pub type Neighbors = SmallVec<[RegionId; 8]>;

/// On-demand adjacency queries over a [`GeometryIndex`].
///
/// No adjacency graph is precomputed. Pair results and neighbor lists are memoized for the
/// lifetime of the resolver, which is meant to live for one bulk operation.
/// "Adjacent" means the geometries intersect: a shared edge, a shared vertex, or overlap.
pub struct AdjacencyResolver<'a> {
    index: &'a GeometryIndex,
    pairs: AHashMap<(RegionId, RegionId), bool>,
    neighbors: AHashMap<RegionId, Neighbors>,
}

impl<'a> AdjacencyResolver<'a> {
    pub fn new(index: &'a GeometryIndex) -> Self {
        Self { index, pairs: AHashMap::new(), neighbors: AHashMap::new() }
    }

    #[inline] pub fn index(&self) -> &'a GeometryIndex { self.index }

    /// Number of region pairs tested so far.
    #[inline] pub fn tested_pairs(&self) -> usize { self.pairs.len() }

    /// Returns `true` if regions `a` and `b` touch or overlap. A region is not adjacent to itself.
    pub fn are_adjacent(&mut self, a: RegionId, b: RegionId) -> bool {
        if a == b { return false }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&known) = self.pairs.get(&key) { return known }

        let index = self.index;
        let adjacent = index.bounds(key.0).intersects(index.bounds(key.1))
            && polygons_intersect(index.geometry(key.0), index.geometry(key.1));
        self.pairs.insert(key, adjacent);
        adjacent
    }

    /// Returns `true` if `region` touches or overlaps any region in `selected`.
    pub fn is_adjacent(&mut self, region: RegionId, selected: &AHashSet<RegionId>) -> bool {
        if selected.is_empty() { return false }
        let candidates = self.index.bbox_neighbors(region)
            .filter(|other| selected.contains(other))
            .collect::<Neighbors>();
        candidates.into_iter().any(|other| self.are_adjacent(region, other))
    }

    /// Returns `true` if `region` touches or overlaps `combined`, typically the precomputed
    /// union of a selection. The caller owns computing the union once per operation.
    pub fn is_adjacent_to_union(&self, region: RegionId, combined: &MultiPolygon<f64>) -> bool {
        polygons_intersect(self.index.geometry(region), combined)
    }

    /// Sorted list of every region adjacent to `region`.
    pub fn neighbors(&mut self, region: RegionId) -> &[RegionId] {
        if !self.neighbors.contains_key(&region) {
            let mut candidates = self.index.bbox_neighbors(region).collect::<Neighbors>();
            candidates.sort_unstable();
            candidates.retain(|other| self.are_adjacent(region, *other));
            self.neighbors.insert(region, candidates);
        }
        &self.neighbors[&region]
    }
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use crate::index::tests::{grid, square};
    use crate::region::{Granularity, RawRegion};

    use super::*;

    fn ids(index: &GeometryIndex, codes: &[&str]) -> AHashSet<RegionId> {
        index.resolve(codes).into_iter().collect()
    }

    #[test]
    fn edge_and_vertex_neighbors_are_adjacent() {
        let index = grid(3);
        let mut resolver = AdjacencyResolver::new(&index);
        let [a, b, c, d] = ["00", "01", "11", "22"].map(|code| index.id_of(code).unwrap());
        assert!(resolver.are_adjacent(a, b)); // shared edge
        assert!(resolver.are_adjacent(a, c)); // shared corner only
        assert!(!resolver.are_adjacent(a, d));
        assert!(!resolver.are_adjacent(a, a));
    }

    #[test]
    fn adjacency_is_symmetric_and_memoized() {
        let index = grid(3);
        let mut resolver = AdjacencyResolver::new(&index);
        for a in index.ids() {
            for b in index.ids() {
                assert_eq!(resolver.are_adjacent(a, b), resolver.are_adjacent(b, a));
            }
        }
        // 9 choose 2 unordered pairs.
        assert_eq!(resolver.tested_pairs(), 36);
    }

    #[test]
    fn is_adjacent_against_selection() {
        let index = grid(3);
        let mut resolver = AdjacencyResolver::new(&index);
        let selected = ids(&index, &["11"]);
        assert!(index.ids().filter(|id| !selected.contains(id)).all(|id| resolver.is_adjacent(id, &selected)));

        let selected = ids(&index, &["00"]);
        assert!(!resolver.is_adjacent(index.id_of("22").unwrap(), &selected));
        assert!(!resolver.is_adjacent(index.id_of("22").unwrap(), &AHashSet::new()));
    }

    #[test]
    fn neighbors_of_center_are_the_ring() {
        let index = grid(3);
        let mut resolver = AdjacencyResolver::new(&index);
        let center = index.id_of("11").unwrap();
        assert_eq!(resolver.neighbors(center).len(), 8);
        let corner = index.id_of("00").unwrap();
        let codes = resolver.neighbors(corner).iter().map(|&id| index.code(id).to_string()).collect::<Vec<_>>();
        assert_eq!(codes.len(), 3);
        assert!(codes.iter().all(|c| ["01", "10", "11"].contains(&c.as_str())));
    }

    #[test]
    fn union_variant_detects_corner_contact() {
        let index = grid(3);
        let resolver = AdjacencyResolver::new(&index);
        let selected = index.resolve(&["00", "01"]);
        let union = index.union_of(&selected);
        assert!(resolver.is_adjacent_to_union(index.id_of("12").unwrap(), &union));
        assert!(!resolver.is_adjacent_to_union(index.id_of("22").unwrap(), &union));
    }

    #[test]
    fn islands_count_through_any_part() {
        let mut island = square(0.0, 0.0);
        island.extend(square(5.0, 5.0));
        let raw = vec![
            RawRegion::new("1", island),
            RawRegion::new("2", square(6.0, 5.0)),
            RawRegion::new("3", vec![vec![vec![
                coord! { x: 10.0, y: 10.0 }, coord! { x: 11.0, y: 10.0 }, coord! { x: 11.0, y: 11.0 },
            ]]]),
        ];
        let index = GeometryIndex::build(Granularity::OneDigit, raw);
        let mut resolver = AdjacencyResolver::new(&index);
        let [one, two, three] = ["1", "2", "3"].map(|code| index.id_of(code).unwrap());
        assert!(resolver.are_adjacent(one, two));
        assert!(!resolver.are_adjacent(one, three));
    }
}
