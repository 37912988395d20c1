use std::collections::VecDeque;

use tracing::debug;

use crate::adjacency::AdjacencyResolver;
use crate::bulk::BulkOperator;

impl BulkOperator<'_> {
    /// Unselected regions enclosed by the selection, counting only unreached components that
    /// border the selection as holes.
    ///
    /// Unselected regions touching the dataset's outer frame seed a flood fill across the
    /// unselected adjacency graph. Whatever the fill does not reach is split into connected
    /// components; a component is a hole if it borders the selection. Components touching
    /// neither the frame nor the selection (detached islands) are left alone.
    pub fn fill_holes<S: AsRef<str>>(&self, selected: &[S]) -> Vec<String> {
        let index = self.index;
        let selected = self.selected_ids(selected);
        if selected.is_empty() { return Vec::new() }

        let n = index.len();
        let mut is_selected = vec![false; n];
        selected.iter().for_each(|id| is_selected[id.idx()] = true);

        let mut resolver = AdjacencyResolver::new(index);

        // Flood fill from every unselected region on the outer frame.
        let mut outside = vec![false; n];
        let mut queue = index.ids()
            .filter(|&id| !is_selected[id.idx()] && index.is_exterior(id))
            .inspect(|id| outside[id.idx()] = true)
            .collect::<VecDeque<_>>();

        while let Some(u) = queue.pop_front() {
            for &v in resolver.neighbors(u) {
                if !is_selected[v.idx()] && !outside[v.idx()] {
                    outside[v.idx()] = true;
                    queue.push_back(v);
                }
            }
        }

        // Group the unreached regions into components and keep those bordering the selection.
        let mut seen = outside;
        let mut holes = Vec::new();
        for start in index.ids() {
            if is_selected[start.idx()] || seen[start.idx()] { continue }

            let mut component = vec![start];
            let mut borders_selection = false;
            seen[start.idx()] = true;

            let mut queue = VecDeque::from([start]);
            while let Some(u) = queue.pop_front() {
                for &v in resolver.neighbors(u) {
                    if is_selected[v.idx()] {
                        borders_selection = true;
                    } else if !seen[v.idx()] {
                        seen[v.idx()] = true;
                        component.push(v);
                        queue.push_back(v);
                    }
                }
            }

            if borders_selection { holes.extend(component) }
        }

        debug!("fill-holes tested {} region pairs, found {} holes", resolver.tested_pairs(), holes.len());
        index.codes_of(holes)
    }
}

#[cfg(test)]
mod tests {
    use crate::bulk::BulkOperator;
    use crate::index::tests::{grid, square};
    use crate::index::GeometryIndex;
    use crate::region::{Granularity, RawRegion};

    /// Codes of a ring of cells around (cx, cy) in a grid built by `grid`.
    fn ring(cx: usize, cy: usize) -> Vec<String> {
        let mut codes = Vec::new();
        for row in cy - 1..=cy + 1 {
            for col in cx - 1..=cx + 1 {
                if (row, col) != (cy, cx) { codes.push(format!("{row}{col}")) }
            }
        }
        codes
    }

    #[test]
    fn ring_encloses_center() {
        let index = grid(5);
        let bulk = BulkOperator::new(&index);
        assert_eq!(bulk.fill_holes(&ring(2, 2)), vec!["22"]);
    }

    #[test]
    fn open_ring_has_no_hole() {
        let index = grid(5);
        let bulk = BulkOperator::new(&index);
        let mut open = ring(2, 2);
        // Removing one ring cell still leaves the centre touching it diagonally, and the gap
        // reaches the outside.
        open.retain(|code| code != "13");
        assert!(bulk.fill_holes(&open).is_empty());
    }

    #[test]
    fn fill_holes_is_idempotent() {
        let index = grid(5);
        let bulk = BulkOperator::new(&index);
        let mut selected = ring(2, 2);
        selected.extend(bulk.fill_holes(&selected));
        assert!(bulk.fill_holes(&selected).is_empty());
    }

    #[test]
    fn multi_cell_hole_is_filled_whole() {
        // 6x6 grid, select the border of the inner 4x4 block; the 2x2 core is one hole.
        let index = grid(6);
        let bulk = BulkOperator::new(&index);
        let selected = (1..=4)
            .flat_map(|row| (1..=4).map(move |col| (row, col)))
            .filter(|&(row, col)| row == 1 || row == 4 || col == 1 || col == 4)
            .map(|(row, col)| format!("{row}{col}"))
            .collect::<Vec<_>>();
        assert_eq!(bulk.fill_holes(&selected), vec!["22", "23", "32", "33"]);
    }

    #[test]
    fn detached_island_is_not_a_hole() {
        let mut raw = (0..3)
            .flat_map(|row| (0..3).map(move |col| (row, col)))
            .map(|(row, col)| RawRegion::new(format!("{row}{col}"), square(col as f64, row as f64)))
            .collect::<Vec<_>>();
        // Island well inside the convex hull of an L-shaped mainland.
        raw.retain(|r| r.code != "22" && r.code != "21" && r.code != "12");
        raw.push(RawRegion::new("99", square(20.0, 20.0)));
        raw.push(RawRegion::new("55", square(9.0, 9.0)));
        let index = GeometryIndex::build(Granularity::TwoDigit, raw);
        let bulk = BulkOperator::new(&index);
        assert!(bulk.fill_holes(&["00"]).is_empty());
    }

    #[test]
    fn nothing_selected_means_no_holes() {
        let index = grid(3);
        let bulk = BulkOperator::new(&index);
        assert!(bulk.fill_holes::<&str>(&[]).is_empty());
    }
}
