//! Grid: fixed-size board of cells, their layout in world space and click areas.

use crate::error::BoardError;
use crate::kinds::KindSource;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub};

/// Display scale every cell is drawn at when settled.
pub const DISPLAY_SCALE: f32 = 0.15;

/// Share of the camera window the board occupies.
const BOARD_FILL: f32 = 0.8;

/// Piece kind. Matching compares kinds by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(pub u8);

impl Kind {
    /// Distinct kinds the palette can tell apart.
    pub const MAX_KINDS: u8 = 6;

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Counter-clockwise rotation by `angle` radians.
    pub fn rotated(self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    pub fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Clickable area of a cell: `[xmin, xmax) x [ymin, ymax)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitRect {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
}

impl HitRect {
    pub fn around(center: Vec2, delta: Vec2) -> Self {
        let hw = 0.5 * delta.x.abs();
        let hh = 0.5 * delta.y.abs();
        Self {
            xmin: center.x - hw,
            xmax: center.x + hw,
            ymin: center.y - hh,
            ymax: center.y + hh,
        }
    }

    /// Half-open so neighbouring rectangles never both claim a shared edge.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.xmin && p.x < self.xmax && p.y >= self.ymin && p.y < self.ymax
    }
}

/// Board coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub kind: Kind,
    /// False while the cell waits for skyfall to refill it.
    pub alive: bool,
    /// Where the cell is drawn; eases back to `original_position` every tick.
    pub position: Vec2,
    pub original_position: Vec2,
    pub scale: Vec2,
    pub area: HitRect,
}

/// Where the board sits in world space: cell `(row, col)` is centred on `origin + delta * (col, row)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub origin: Vec2,
    pub delta: Vec2,
}

impl BoardLayout {
    /// Fit `rows x cols` into a camera window with half-extents `window`.
    /// Columns run left to right from `-0.4 w`, rows top to bottom from `0.8 h`.
    pub fn for_window(window: Vec2, rows: usize, cols: usize) -> Self {
        let rows = rows.max(1) as f32;
        let cols = cols.max(1) as f32;
        Self {
            origin: Vec2::new(-0.5 * BOARD_FILL * window.x, BOARD_FILL * window.y),
            delta: Vec2::new(
                BOARD_FILL * window.x / cols,
                -2.0 * BOARD_FILL * window.y / rows,
            ),
        }
    }

    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> Vec2 {
        Vec2::new(
            self.origin.x + self.delta.x * col as f32,
            self.origin.y + self.delta.y * row as f32,
        )
    }
}

/// Fixed-size board of cells stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    layout: BoardLayout,
    cells: Vec<Cell>,
}

impl Grid {
    /// Fill every slot with a kind from `kinds`, centred on its layout position.
    pub fn new<K: KindSource + ?Sized>(
        rows: usize,
        cols: usize,
        layout: BoardLayout,
        kinds: &mut K,
    ) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let center = layout.cell_center(row, col);
                cells.push(Cell {
                    kind: kinds.next_kind(),
                    alive: true,
                    position: center,
                    original_position: center,
                    scale: Vec2::new(DISPLAY_SCALE, DISPLAY_SCALE),
                    area: HitRect::around(center, layout.delta),
                });
            }
        }
        Self {
            rows,
            cols,
            layout,
            cells,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.row < self.rows && c.col < self.cols
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Result<&Cell, BoardError> {
        let i = self.index_of(row, col)?;
        Ok(&self.cells[i])
    }

    fn index_of(&self, row: usize, col: usize) -> Result<usize, BoardError> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(BoardError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// First cell (row-major) whose area contains the world-space point.
    pub fn hit_test(&self, p: Vec2) -> Option<Coord> {
        self.cells
            .iter()
            .position(|c| c.area.contains(p))
            .map(|i| Coord::new(i / self.cols, i % self.cols))
    }

    /// Exchange kinds and drawn positions of two cells; areas stay put.
    pub fn swap_kinds(&mut self, a: Coord, b: Coord) {
        let (ka, pa) = (self[a].kind, self[a].position);
        let (kb, pb) = (self[b].kind, self[b].position);
        self[a].kind = kb;
        self[a].position = pb;
        self[b].kind = ka;
        self[b].position = pa;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (Coord::new(i / cols, i % cols), c))
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let cols = self.cols;
        (0..self.rows * self.cols).map(move |i| Coord::new(i / cols, i % cols))
    }

    pub fn dead_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.alive).count()
    }

    /// Board with the given kinds, row by row, on the default 1x1 window layout.
    #[cfg(test)]
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let flat: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let layout = BoardLayout::for_window(Vec2::new(1.0, 1.0), n_rows, n_cols);
        let mut kinds = crate::kinds::SeqKinds::new(&flat);
        Self::new(n_rows, n_cols, layout, &mut kinds)
    }

    #[cfg(test)]
    pub fn kinds(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.cols).map(|r| r.iter().map(|c| c.kind.0).collect()).collect()
    }
}

/// Indexing is for coordinates already known to be on the board.
impl Index<Coord> for Grid {
    type Output = Cell;

    fn index(&self, c: Coord) -> &Cell {
        debug_assert!(self.contains(c), "{c:?} outside {}x{}", self.rows, self.cols);
        &self.cells[c.row * self.cols + c.col]
    }
}

impl IndexMut<Coord> for Grid {
    fn index_mut(&mut self, c: Coord) -> &mut Cell {
        debug_assert!(self.contains(c), "{c:?} outside {}x{}", self.rows, self.cols);
        &mut self.cells[c.row * self.cols + c.col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::RandomKinds;
    use proptest::prelude::*;

    fn board(rows: usize, cols: usize, seed: u64) -> Grid {
        let layout = BoardLayout::for_window(Vec2::new(1.0, 1.0), rows, cols);
        Grid::new(rows, cols, layout, &mut RandomKinds::new(5, Some(seed)))
    }

    #[test]
    fn test_layout_matches_reference_board() {
        let layout = BoardLayout::for_window(Vec2::new(2.0, 1.0), 10, 10);
        assert!((layout.origin.x - -0.8).abs() < 1e-6);
        assert!((layout.origin.y - 0.8).abs() < 1e-6);
        assert!((layout.delta.x - 0.16).abs() < 1e-6);
        assert!((layout.delta.y - -0.16).abs() < 1e-6);
    }

    #[test]
    fn test_init_fills_every_cell_alive() {
        let g = board(10, 10, 3);
        assert_eq!(g.iter().count(), 100);
        for (_, cell) in g.iter() {
            assert!(cell.alive);
            assert!(cell.kind.0 < 5);
            assert_eq!(cell.position, cell.original_position);
            assert_eq!(cell.scale, Vec2::new(DISPLAY_SCALE, DISPLAY_SCALE));
        }
    }

    #[test]
    fn test_cell_at_out_of_bounds() {
        let g = board(4, 6, 1);
        assert!(g.cell_at(3, 5).is_ok());
        assert_eq!(
            g.cell_at(4, 0),
            Err(BoardError::OutOfBounds { row: 4, col: 0, rows: 4, cols: 6 })
        );
        assert!(g.cell_at(0, 6).is_err());
    }

    #[test]
    fn test_hit_test_misses_outside_board() {
        let g = board(10, 10, 1);
        assert_eq!(g.hit_test(Vec2::new(0.95, -0.95)), None);
        assert_eq!(g.hit_test(Vec2::new(-5.0, 0.0)), None);
    }

    #[test]
    fn test_swap_kinds_keeps_areas() {
        let mut g = Grid::from_rows(&[&[0, 1], &[2, 3]]);
        let (a, b) = (Coord::new(0, 0), Coord::new(0, 1));
        let area_a = g[a].area;
        g.swap_kinds(a, b);
        assert_eq!(g.kinds(), vec![vec![1, 0], vec![2, 3]]);
        assert_eq!(g[a].area, area_a);
        assert_eq!(g[a].position, g[b].original_position);
    }

    #[test]
    fn test_vec2_rotation_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotated(std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-6 && (v.y - 1.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_every_cell_contains_its_center(rows in 1usize..16, cols in 1usize..16, seed in any::<u64>()) {
            let g = board(rows, cols, seed);
            for row in 0..rows {
                for col in 0..cols {
                    let cell = g.cell_at(row, col).unwrap();
                    prop_assert!(cell.area.contains(cell.position));
                    prop_assert_eq!(g.hit_test(cell.position), Some(Coord::new(row, col)));
                }
            }
        }

        #[test]
        fn prop_rects_do_not_overlap(rows in 1usize..8, cols in 1usize..8, fx in 0.0f32..1.0, fy in 0.0f32..1.0) {
            let g = board(rows, cols, 0);
            let (min, max) = (g[Coord::new(rows - 1, 0)].area, g[Coord::new(0, cols - 1)].area);
            let p = Vec2::new(
                min.xmin + fx * (max.xmax - min.xmin),
                min.ymin + fy * (max.ymax - min.ymin),
            );
            let owners = g.iter().filter(|(_, c)| c.area.contains(p)).count();
            prop_assert!(owners <= 1);
        }
    }
}
