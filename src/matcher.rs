//! Match detection for a proposed swap.
//!
//! A swap is checked from both of its cells: the neighbour as if it held the
//! selected kind, and the selected cell as if it held the neighbour's kind. Each
//! anchor scans outward along its row and its column, counting consecutive cells
//! of its new kind on the post-swap board. Either axis reaching three cells makes
//! that anchor a match; no matching anchor means the swap is rejected.

use crate::board::{Coord, Grid, Kind};

/// Minimum `end - start` for a run to count (three cells inclusive).
pub const MIN_RUN_SPAN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Inclusive bounds of a same-kind run along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSpan {
    pub start: usize,
    pub end: usize,
}

impl RunSpan {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_match(&self) -> bool {
        self.end - self.start >= MIN_RUN_SPAN
    }
}

/// Maximal run of three or more along `axis`; `fixed_index` is the row of a
/// horizontal run or the column of a vertical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRun {
    pub axis: Axis,
    pub start: usize,
    pub end: usize,
    pub fixed_index: usize,
}

impl MatchRun {
    pub fn cells(&self) -> impl Iterator<Item = Coord> + use<> {
        let (axis, fixed) = (self.axis, self.fixed_index);
        (self.start..=self.end).map(move |i| match axis {
            Axis::Horizontal => Coord::new(fixed, i),
            Axis::Vertical => Coord::new(i, fixed),
        })
    }
}

/// Runs found around one anchor of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapMatch {
    pub anchor: Coord,
    /// Kind the anchor holds after the swap.
    pub kind: Kind,
    pub horizontal: RunSpan,
    pub vertical: RunSpan,
}

impl SwapMatch {
    /// Qualifying runs only; an axis shorter than three is not cleared.
    pub fn runs(&self) -> impl Iterator<Item = MatchRun> + use<> {
        let h = self.horizontal.is_match().then_some(MatchRun {
            axis: Axis::Horizontal,
            start: self.horizontal.start,
            end: self.horizontal.end,
            fixed_index: self.anchor.row,
        });
        let v = self.vertical.is_match().then_some(MatchRun {
            axis: Axis::Vertical,
            start: self.vertical.start,
            end: self.vertical.end,
            fixed_index: self.anchor.col,
        });
        h.into_iter().chain(v)
    }

    pub fn is_match(&self) -> bool {
        self.horizontal.is_match() || self.vertical.is_match()
    }
}

/// The board as it would read with `a` and `b` exchanged.
struct SwappedView<'a> {
    grid: &'a Grid,
    a: Coord,
    b: Coord,
}

impl SwappedView<'_> {
    fn kind(&self, c: Coord) -> Kind {
        if c == self.a {
            self.grid[self.b].kind
        } else if c == self.b {
            self.grid[self.a].kind
        } else {
            self.grid[c].kind
        }
    }

    fn runs_through(&self, anchor: Coord) -> SwapMatch {
        let kind = self.kind(anchor);
        // Cells waiting for skyfall hold their respawn kind but are not on the board.
        let same = |row: usize, col: usize| {
            let c = Coord::new(row, col);
            self.grid[c].alive && self.kind(c) == kind
        };

        let mut xstart = anchor.col;
        while xstart > 0 && same(anchor.row, xstart - 1) {
            xstart -= 1;
        }
        let mut xend = anchor.col;
        while xend + 1 < self.grid.cols() && same(anchor.row, xend + 1) {
            xend += 1;
        }
        let mut ystart = anchor.row;
        while ystart > 0 && same(ystart - 1, anchor.col) {
            ystart -= 1;
        }
        let mut yend = anchor.row;
        while yend + 1 < self.grid.rows() && same(yend + 1, anchor.col) {
            yend += 1;
        }

        SwapMatch {
            anchor,
            kind,
            horizontal: RunSpan { start: xstart, end: xend },
            vertical: RunSpan { start: ystart, end: yend },
        }
    }
}

/// Matches produced by swapping `selected` with its orthogonal `neighbor`.
/// Neighbour anchor first, then selected. Empty means the swap is invalid.
pub fn evaluate_swap(grid: &Grid, selected: Coord, neighbor: Coord) -> Vec<SwapMatch> {
    debug_assert!(grid.contains(selected) && grid.contains(neighbor));
    debug_assert_eq!(
        selected.row.abs_diff(neighbor.row) + selected.col.abs_diff(neighbor.col),
        1,
        "swap cells must be orthogonal neighbours"
    );
    let view = SwappedView {
        grid,
        a: selected,
        b: neighbor,
    };
    [neighbor, selected]
        .into_iter()
        .map(|anchor| view.runs_through(anchor))
        .filter(SwapMatch::is_match)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: u8 = 0;
    const G: u8 = 1;
    const B: u8 = 2;
    const Y: u8 = 3;

    #[test]
    fn test_row_swap_completes_left_run() {
        let g = Grid::from_rows(&[
            &[R, R, G, R, R],
            &[B, Y, B, Y, B],
            &[Y, B, Y, B, Y],
        ]);
        let m = evaluate_swap(&g, Coord::new(0, 2), Coord::new(0, 3));
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].anchor, Coord::new(0, 2));
        assert_eq!(m[0].kind, Kind(R));
        assert_eq!(m[0].horizontal, RunSpan { start: 0, end: 2 });
        let cells: Vec<Coord> = m[0].runs().flat_map(|r| r.cells()).collect();
        assert_eq!(cells, vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)]);
    }

    #[test]
    fn test_swap_without_run_is_empty() {
        let g = Grid::from_rows(&[
            &[R, G, B, Y],
            &[G, B, Y, R],
            &[B, Y, R, G],
        ]);
        assert!(evaluate_swap(&g, Coord::new(1, 1), Coord::new(1, 2)).is_empty());
        assert!(evaluate_swap(&g, Coord::new(0, 0), Coord::new(1, 0)).is_empty());
    }

    #[test]
    fn test_vertical_run_from_neighbor_anchor() {
        // Moving the R at (2,0) right into column 1 lines up with the two Rs above.
        let g = Grid::from_rows(&[
            &[G, R, B],
            &[B, R, G],
            &[R, Y, B],
        ]);
        let m = evaluate_swap(&g, Coord::new(2, 0), Coord::new(2, 1));
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].anchor, Coord::new(2, 1));
        assert_eq!(m[0].vertical, RunSpan { start: 0, end: 2 });
        assert!(!m[0].horizontal.is_match());
        let runs: Vec<MatchRun> = m[0].runs().collect();
        assert_eq!(
            runs,
            vec![MatchRun { axis: Axis::Vertical, start: 0, end: 2, fixed_index: 1 }]
        );
    }

    #[test]
    fn test_both_anchors_match() {
        let g = Grid::from_rows(&[
            &[R, B, G, Y],
            &[R, B, G, Y],
            &[B, R, Y, G],
        ]);
        let m = evaluate_swap(&g, Coord::new(2, 0), Coord::new(2, 1));
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].anchor, Coord::new(2, 1));
        assert_eq!(m[0].kind, Kind(B));
        assert_eq!(m[0].vertical, RunSpan { start: 0, end: 2 });
        assert_eq!(m[1].anchor, Coord::new(2, 0));
        assert_eq!(m[1].kind, Kind(R));
        assert_eq!(m[1].vertical, RunSpan { start: 0, end: 2 });
    }

    #[test]
    fn test_anchor_in_middle_of_run() {
        let g = Grid::from_rows(&[
            &[Y, G, Y, B],
            &[R, Y, R, R],
        ]);
        let m = evaluate_swap(&g, Coord::new(0, 1), Coord::new(1, 1));
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].anchor, Coord::new(0, 1));
        assert_eq!(m[0].horizontal, RunSpan { start: 0, end: 2 });
    }

    #[test]
    fn test_two_in_a_row_is_not_enough() {
        let g = Grid::from_rows(&[&[R, G, R, B], &[B, Y, G, Y]]);
        assert!(evaluate_swap(&g, Coord::new(0, 1), Coord::new(0, 2)).is_empty());
    }

    #[test]
    fn test_run_span_len() {
        let span = RunSpan { start: 3, end: 6 };
        assert_eq!(span.len(), 4);
        assert!(span.is_match());
        assert!(!RunSpan { start: 1, end: 2 }.is_match());
    }
}
