mod holes;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adjacency::AdjacencyResolver;
use crate::index::GeometryIndex;
use crate::region::RegionId;
use crate::selection::SelectionSet;

/// Set-topology operations seeded by the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOperation {
    /// Add every region touching the selection; everything when nothing is selected.
    Expand,
    /// Add unselected regions enclosed by the selection.
    FillHoles,
    /// Add every region intersecting the union of the selection.
    Grow,
    /// Add every region of the granularity.
    SelectAll,
}

/// Computes bulk additions against one index. Each operation reads the selection, computes
/// the full result, and only then (in [`BulkOperator::apply`]) writes.
#[derive(Debug, Clone, Copy)]
pub struct BulkOperator<'a> {
    index: &'a GeometryIndex,
}

impl<'a> BulkOperator<'a> {
    pub fn new(index: &'a GeometryIndex) -> Self {
        Self { index }
    }

    /// Compute `operation` for `selected` and add the result to `selection`.
    /// Returns the added codes.
    pub fn apply(&self, operation: BulkOperation, selection: &mut SelectionSet) -> Vec<String> {
        let additions = self.compute(operation, &selection.snapshot());
        selection.add(&additions);
        additions
    }

    /// Codes `operation` would add to `selected`, sorted. Never includes selected codes.
    pub fn compute<S: AsRef<str>>(&self, operation: BulkOperation, selected: &[S]) -> Vec<String> {
        let additions = match operation {
            BulkOperation::Expand => self.expand(selected),
            BulkOperation::FillHoles => self.fill_holes(selected),
            BulkOperation::Grow => self.grow(selected),
            BulkOperation::SelectAll => self.select_all(selected),
        };
        debug!("{operation:?} on {} selected regions adds {}", selected.len(), additions.len());
        additions
    }

    /// Every unselected region adjacent to the selection. With nothing selected this selects
    /// the whole granularity.
    /// Codes unknown to the index still make the selection non-empty.
    pub fn expand<S: AsRef<str>>(&self, selected: &[S]) -> Vec<String> {
        if selected.is_empty() {
            return self.index.codes_of(self.index.ids());
        }
        let selected = self.selected_ids(selected);
        if selected.is_empty() { return Vec::new() }

        let mut resolver = AdjacencyResolver::new(self.index);
        let candidates = self.frontier_candidates(&selected);
        let additions = candidates.into_iter()
            .filter(|&id| resolver.is_adjacent(id, &selected))
            .collect::<Vec<_>>();
        self.index.codes_of(additions)
    }

    /// Every unselected region intersecting the geometric union of the selection.
    /// The union is computed once per call.
    pub fn grow<S: AsRef<str>>(&self, selected: &[S]) -> Vec<String> {
        let selected = self.selected_ids(selected);
        if selected.is_empty() { return Vec::new() }

        let mut ids = selected.iter().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        let union = self.index.union_of(&ids);

        let resolver = AdjacencyResolver::new(self.index);
        let additions = self.frontier_candidates(&selected).into_iter()
            .filter(|&id| resolver.is_adjacent_to_union(id, &union))
            .collect::<Vec<_>>();
        self.index.codes_of(additions)
    }

    /// Every region not yet selected.
    pub fn select_all<S: AsRef<str>>(&self, selected: &[S]) -> Vec<String> {
        let selected = self.selected_ids(selected);
        self.index.codes_of(self.index.ids().filter(|id| !selected.contains(id)))
    }

    /// Resolve codes to ids in this index, ignoring unknown ones.
    fn selected_ids<S: AsRef<str>>(&self, selected: &[S]) -> AHashSet<RegionId> {
        self.index.resolve(selected).into_iter().collect()
    }

    /// Unselected regions whose bounding box overlaps a selected region's bounding box:
    /// the only regions that can possibly touch the selection.
    fn frontier_candidates(&self, selected: &AHashSet<RegionId>) -> Vec<RegionId> {
        let mut candidates = selected.iter()
            .flat_map(|&id| self.index.bbox_neighbors(id))
            .filter(|id| !selected.contains(id))
            .collect::<Vec<_>>();
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }
}

#[cfg(test)]
mod tests {
    use crate::index::tests::{grid, square};
    use crate::region::{Granularity, RawRegion};

    use super::*;

    /// 1-digit strip: 0 | 1 | 2 touch in a row, 5 sits apart.
    fn strip() -> GeometryIndex {
        let raw = vec![
            RawRegion::new("0", square(0.0, 0.0)),
            RawRegion::new("1", square(1.0, 0.0)),
            RawRegion::new("2", square(2.0, 0.0)),
            RawRegion::new("5", square(10.0, 0.0)),
        ];
        GeometryIndex::build(Granularity::OneDigit, raw)
    }

    #[test]
    fn expand_adds_touching_regions_only() {
        let index = strip();
        let bulk = BulkOperator::new(&index);
        assert_eq!(bulk.expand(&["1"]), vec!["0", "2"]);
        let mut selection = SelectionSet::with_codes(Granularity::OneDigit, &["1"]);
        bulk.apply(BulkOperation::Expand, &mut selection);
        assert_eq!(selection.snapshot(), vec!["0", "1", "2"]);
    }

    #[test]
    fn expand_of_nothing_selects_everything() {
        let index = strip();
        let bulk = BulkOperator::new(&index);
        assert_eq!(bulk.expand::<&str>(&[]), vec!["0", "1", "2", "5"]);
    }

    #[test]
    fn expand_of_unknown_codes_adds_nothing() {
        let index = grid(3);
        let bulk = BulkOperator::new(&index);
        assert!(bulk.expand(&["99"]).is_empty());
        let mut selection = SelectionSet::with_codes(Granularity::TwoDigit, &["99"]);
        assert!(bulk.apply(BulkOperation::Expand, &mut selection).is_empty());
        assert_eq!(selection.snapshot(), vec!["99"]);
    }

    #[test]
    fn expand_includes_corner_contacts() {
        let index = grid(3);
        let bulk = BulkOperator::new(&index);
        assert_eq!(bulk.expand(&["00"]), vec!["01", "10", "11"]);
    }

    #[test]
    fn grow_matches_expand_on_clean_data() {
        let index = grid(4);
        let bulk = BulkOperator::new(&index);
        let selected = ["11", "12"];
        assert_eq!(bulk.grow(&selected), bulk.expand(&selected));
        assert!(bulk.grow::<&str>(&[]).is_empty());
    }

    #[test]
    fn select_all_skips_selected() {
        let index = strip();
        let bulk = BulkOperator::new(&index);
        assert_eq!(bulk.select_all(&["1", "5"]), vec!["0", "2"]);
    }

    #[test]
    fn empty_dataset_yields_nothing() {
        let index = GeometryIndex::build(Granularity::OneDigit, vec![]);
        let bulk = BulkOperator::new(&index);
        for op in [BulkOperation::Expand, BulkOperation::FillHoles, BulkOperation::Grow, BulkOperation::SelectAll] {
            assert!(bulk.compute(op, &["1"]).is_empty(), "{op:?}");
        }
    }
}
