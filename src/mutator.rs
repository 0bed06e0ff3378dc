//! Board mutation: committing swaps, clearing runs, and skyfall.

use crate::board::{Coord, Grid, Kind, Vec2};
use crate::kinds::KindSource;
use crate::matcher::{SwapMatch, evaluate_swap};
use crate::selection::{Direction, Selection};
use tracing::{debug, trace};

/// A cell taken off the board and the kind it held at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cleared {
    pub coord: Coord,
    pub kind: Kind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    /// Nothing selected, no neighbour that way, or either cell awaiting skyfall.
    /// Board and selection untouched.
    Ignored,
    /// No run formed; board unchanged, selection cleared.
    Rejected,
    /// Swap kept and runs cleared.
    Cleared {
        matches: Vec<SwapMatch>,
        cleared: Vec<Cleared>,
    },
}

/// Swap the selected cell with its neighbour in `direction` if that forms a run.
///
/// Cleared cells get a fresh kind straight away so the refill already knows
/// what will drop in; skyfall does the actual moving.
pub fn try_swap<K: KindSource + ?Sized>(
    grid: &mut Grid,
    selection: &mut Selection,
    direction: Direction,
    kinds: &mut K,
) -> SwapOutcome {
    let Some(selected) = selection.cell() else {
        return SwapOutcome::Ignored;
    };
    let Some(neighbor) = selection.neighbor(direction) else {
        return SwapOutcome::Ignored;
    };
    if !grid[selected].alive || !grid[neighbor].alive {
        return SwapOutcome::Ignored;
    }

    let matches = evaluate_swap(grid, selected, neighbor);
    selection.reset();
    if matches.is_empty() {
        debug!(?selected, ?direction, "swap rejected");
        return SwapOutcome::Rejected;
    }

    grid.swap_kinds(selected, neighbor);
    let cleared = clear_runs(grid, &matches);
    for cl in &cleared {
        grid[cl.coord].kind = kinds.next_kind();
    }
    let longest = matches
        .iter()
        .flat_map(|m| [m.horizontal.len(), m.vertical.len()])
        .max()
        .unwrap_or(0);
    debug!(?selected, ?direction, longest, cleared = cleared.len(), "swap accepted");
    SwapOutcome::Cleared { matches, cleared }
}

/// Mark every cell of every qualifying run dead. Returns the cells newly
/// cleared; a cell covered by two runs is reported once.
pub fn clear_runs(grid: &mut Grid, matches: &[SwapMatch]) -> Vec<Cleared> {
    let mut cleared = Vec::new();
    for run in matches.iter().flat_map(SwapMatch::runs) {
        for coord in run.cells() {
            let cell = &mut grid[coord];
            if cell.alive {
                cell.alive = false;
                cleared.push(Cleared {
                    coord,
                    kind: cell.kind,
                });
            }
        }
    }
    cleared
}

/// Clear a single cell (bomb, quake) and deal its respawn kind. Returns the
/// kind it held, or None if it was already dead.
pub fn clear_cell<K: KindSource + ?Sized>(
    grid: &mut Grid,
    c: Coord,
    kinds: &mut K,
) -> Option<Kind> {
    let cell = &mut grid[c];
    if !cell.alive {
        return None;
    }
    let old = cell.kind;
    cell.alive = false;
    cell.kind = kinds.next_kind();
    Some(old)
}

/// Skyfall: every dead cell is filled by shifting its column down one row and
/// dealing a new kind into the top row. Returns how many cells were dealt.
///
/// Shifted cells keep their drawn position so they can ease down; dealt cells
/// start one row above the board. A settled board is left untouched.
pub fn collapse<K: KindSource + ?Sized>(grid: &mut Grid, kinds: &mut K) -> usize {
    let mut dealt = 0;
    let above = Vec2::new(0.0, -grid.layout().delta.y);
    for col in 0..grid.cols() {
        for row in (0..grid.rows()).rev() {
            while !grid[Coord::new(row, col)].alive {
                shift_column_down(grid, row, col);
                let top = &mut grid[Coord::new(0, col)];
                top.kind = kinds.next_kind();
                top.alive = true;
                top.position = top.original_position + above;
                dealt += 1;
            }
        }
    }
    if dealt > 0 {
        trace!(dealt, "skyfall");
    }
    dealt
}

/// Move rows `0..row` of `col` down by one, overwriting `row`.
fn shift_column_down(grid: &mut Grid, row: usize, col: usize) {
    for r in (1..=row).rev() {
        let src = grid[Coord::new(r - 1, col)];
        let dst = &mut grid[Coord::new(r, col)];
        dst.kind = src.kind;
        dst.alive = src.alive;
        dst.position = src.position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardLayout, Kind};
    use crate::kinds::{RandomKinds, SeqKinds};
    use proptest::prelude::*;

    const R: u8 = 0;
    const G: u8 = 1;
    const B: u8 = 2;
    const Y: u8 = 3;

    fn select(grid: &Grid, row: usize, col: usize) -> Selection {
        let mut s = Selection::default();
        s.select(Coord::new(row, col), grid.rows(), grid.cols());
        s
    }

    #[test]
    fn test_valid_swap_clears_run() {
        let mut g = Grid::from_rows(&[
            &[R, R, G, R, R],
            &[B, Y, B, Y, B],
            &[Y, B, Y, B, Y],
        ]);
        let mut sel = select(&g, 0, 2);
        let mut kinds = SeqKinds::new(&[Y]);
        let out = try_swap(&mut g, &mut sel, Direction::Right, &mut kinds);
        let SwapOutcome::Cleared { matches, cleared } = out else {
            panic!("expected a clear, got {out:?}");
        };
        assert_eq!(matches.len(), 1);
        let coords: Vec<Coord> = cleared.iter().map(|cl| cl.coord).collect();
        assert_eq!(coords, vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)]);
        assert!(cleared.iter().all(|cl| cl.kind == Kind(R)));
        for c in &coords {
            assert!(!g[*c].alive);
            assert_eq!(g[*c].kind, Kind(Y));
        }
        assert_eq!(g[Coord::new(0, 3)].kind, Kind(G));
        assert!(g[Coord::new(0, 3)].alive);
        assert!(!sel.is_active());
    }

    #[test]
    fn test_dead_cells_do_not_complete_a_run() {
        let mut g = Grid::from_rows(&[
            &[Y, G, G, R],
            &[B, Y, B, G],
        ]);
        for col in [1, 2] {
            g[Coord::new(0, col)].alive = false;
        }
        let before = g.clone();
        let mut sel = select(&g, 0, 3);
        let mut kinds = SeqKinds::new(&[R]);
        assert_eq!(
            try_swap(&mut g, &mut sel, Direction::Down, &mut kinds),
            SwapOutcome::Rejected
        );
        assert_eq!(g, before);
        assert_eq!(kinds.dealt(), 0);
    }

    #[test]
    fn test_swap_with_dead_cell_is_ignored() {
        let mut g = Grid::from_rows(&[
            &[R, R, G, R],
            &[B, Y, B, Y],
        ]);
        g[Coord::new(0, 3)].alive = false;
        let before = g.clone();
        let mut sel = select(&g, 0, 2);
        let mut kinds = SeqKinds::new(&[Y]);
        assert_eq!(
            try_swap(&mut g, &mut sel, Direction::Right, &mut kinds),
            SwapOutcome::Ignored
        );
        assert_eq!(g, before);
        assert!(sel.is_active());
    }

    #[test]
    fn test_invalid_swap_leaves_board_identical() {
        let mut g = Grid::from_rows(&[
            &[R, G, B, Y],
            &[G, B, Y, R],
            &[B, Y, R, G],
        ]);
        let before = g.clone();
        let mut sel = select(&g, 1, 1);
        let mut kinds = SeqKinds::new(&[R]);
        assert_eq!(
            try_swap(&mut g, &mut sel, Direction::Right, &mut kinds),
            SwapOutcome::Rejected
        );
        assert_eq!(g, before);
        assert_eq!(kinds.dealt(), 0);
        assert!(!sel.is_active());
    }

    #[test]
    fn test_missing_neighbor_is_ignored() {
        let mut g = Grid::from_rows(&[&[R, G, B], &[G, B, R], &[B, R, G]]);
        let before = g.clone();
        let mut sel = select(&g, 0, 0);
        let mut kinds = SeqKinds::new(&[R]);
        assert_eq!(try_swap(&mut g, &mut sel, Direction::Up, &mut kinds), SwapOutcome::Ignored);
        assert_eq!(g, before);
        assert!(sel.is_active());

        let mut empty = Selection::default();
        assert_eq!(
            try_swap(&mut g, &mut empty, Direction::Right, &mut kinds),
            SwapOutcome::Ignored
        );
    }

    #[test]
    fn test_clear_runs_counts_overlap_once() {
        // Both runs of an L meet at (2,2).
        let mut g = Grid::from_rows(&[
            &[G, B, R],
            &[B, G, R],
            &[R, R, Y],
            &[G, B, R],
        ]);
        let mut sel = select(&g, 2, 2);
        let mut kinds = SeqKinds::new(&[Y]);
        let out = try_swap(&mut g, &mut sel, Direction::Down, &mut kinds);
        let SwapOutcome::Cleared { cleared, .. } = out else {
            panic!("expected a clear, got {out:?}");
        };
        let mut cleared: Vec<Coord> = cleared.iter().map(|cl| cl.coord).collect();
        cleared.sort();
        assert_eq!(
            cleared,
            vec![
                Coord::new(0, 2),
                Coord::new(1, 2),
                Coord::new(2, 0),
                Coord::new(2, 1),
                Coord::new(2, 2),
            ]
        );
        assert_eq!(g.dead_count(), 5);
        let again = clear_runs(&mut g, &[]);
        assert!(again.is_empty());
    }

    #[test]
    fn test_clear_cell_once() {
        let mut g = Grid::from_rows(&[&[R, G], &[B, Y]]);
        let mut kinds = SeqKinds::new(&[B]);
        assert_eq!(clear_cell(&mut g, Coord::new(1, 1), &mut kinds), Some(Kind(Y)));
        assert_eq!(clear_cell(&mut g, Coord::new(1, 1), &mut kinds), None);
        assert_eq!(g[Coord::new(1, 1)].kind, Kind(B));
        assert_eq!(kinds.dealt(), 1);
        assert_eq!(g.dead_count(), 1);
    }

    #[test]
    fn test_collapse_single_dead_cell() {
        let rows: Vec<Vec<u8>> = (0..10).map(|r| vec![(r % 4) as u8; 3]).collect();
        let row_refs: Vec<&[u8]> = rows.iter().map(Vec::as_slice).collect();
        let mut g = Grid::from_rows(&row_refs);
        g[Coord::new(5, 1)].alive = false;
        let before = g.clone();
        let mut kinds = SeqKinds::new(&[5]);

        assert_eq!(collapse(&mut g, &mut kinds), 1);
        for row in 1..=5 {
            assert_eq!(g[Coord::new(row, 1)].kind, before[Coord::new(row - 1, 1)].kind);
        }
        for row in 6..10 {
            assert_eq!(g[Coord::new(row, 1)].kind, before[Coord::new(row, 1)].kind);
        }
        assert_eq!(g[Coord::new(0, 1)].kind, Kind(5));
        assert!((0..10).all(|row| g[Coord::new(row, 1)].alive));
        for col in [0, 2] {
            for row in 0..10 {
                assert_eq!(g[Coord::new(row, col)], before[Coord::new(row, col)]);
            }
        }
    }

    #[test]
    fn test_collapse_stacked_dead_cells() {
        let mut g = Grid::from_rows(&[&[R], &[G], &[B], &[Y]]);
        g[Coord::new(2, 0)].alive = false;
        g[Coord::new(3, 0)].alive = false;
        let mut kinds = SeqKinds::new(&[4, 5]);
        assert_eq!(collapse(&mut g, &mut kinds), 2);
        assert_eq!(g.kinds(), vec![vec![5], vec![4], vec![R], vec![G]]);
        assert_eq!(g.dead_count(), 0);
    }

    #[test]
    fn test_collapse_dealt_cell_starts_above_board() {
        let mut g = Grid::from_rows(&[&[R], &[G], &[B]]);
        g[Coord::new(0, 0)].alive = false;
        let mut kinds = SeqKinds::new(&[Y]);
        collapse(&mut g, &mut kinds);
        let top = g[Coord::new(0, 0)];
        assert!(top.position.y > top.original_position.y);
    }

    #[test]
    fn test_collapse_settled_board_is_noop() {
        let layout = BoardLayout::for_window(Vec2::new(1.0, 1.0), 10, 10);
        let mut kinds = RandomKinds::new(5, Some(17));
        let mut g = Grid::new(10, 10, layout, &mut kinds);
        let before = g.clone();
        assert_eq!(collapse(&mut g, &mut kinds), 0);
        assert_eq!(collapse(&mut g, &mut kinds), 0);
        assert_eq!(g, before);
    }

    proptest! {
        #[test]
        fn prop_collapse_leaves_no_dead_cells(
            seed in any::<u64>(),
            dead in proptest::collection::vec(any::<bool>(), 64),
        ) {
            let layout = BoardLayout::for_window(Vec2::new(1.0, 1.0), 8, 8);
            let mut kinds = RandomKinds::new(5, Some(seed));
            let mut g = Grid::new(8, 8, layout, &mut kinds);
            for (c, &d) in g.coords().collect::<Vec<_>>().into_iter().zip(&dead) {
                g[c].alive = !d;
            }
            let expected = dead.iter().filter(|&&d| d).count();
            let survivors_per_col: Vec<Vec<u8>> = (0..8)
                .map(|col| (0..8).filter(|&row| !dead[row * 8 + col]).map(|row| g[Coord::new(row, col)].kind.0).collect())
                .collect();

            prop_assert_eq!(collapse(&mut g, &mut kinds), expected);
            prop_assert_eq!(g.dead_count(), 0);
            for (col, survivors) in survivors_per_col.iter().enumerate() {
                let bottom: Vec<u8> = (8 - survivors.len()..8).map(|row| g[Coord::new(row, col)].kind.0).collect();
                prop_assert_eq!(&bottom, survivors);
            }
        }
    }
}
