//! Selection tracker: at most one selected cell plus its reachable neighbours.

use crate::board::Coord;

/// Swap direction relative to the selected cell. Up is towards row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Neighbouring coordinate in this direction, or None at the board edge.
    pub fn step(self, from: Coord, rows: usize, cols: usize) -> Option<Coord> {
        match self {
            Self::Up if from.row > 0 => Some(Coord::new(from.row - 1, from.col)),
            Self::Down if from.row + 1 < rows => Some(Coord::new(from.row + 1, from.col)),
            Self::Left if from.col > 0 => Some(Coord::new(from.row, from.col - 1)),
            Self::Right if from.col + 1 < cols => Some(Coord::new(from.row, from.col + 1)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub up: Option<Coord>,
    pub right: Option<Coord>,
    pub down: Option<Coord>,
    pub left: Option<Coord>,
}

impl Neighbors {
    fn around(c: Coord, rows: usize, cols: usize) -> Self {
        Self {
            up: Direction::Up.step(c, rows, cols),
            right: Direction::Right.step(c, rows, cols),
            down: Direction::Down.step(c, rows, cols),
            left: Direction::Left.step(c, rows, cols),
        }
    }

    pub fn get(&self, dir: Direction) -> Option<Coord> {
        match dir {
            Direction::Up => self.up,
            Direction::Right => self.right,
            Direction::Down => self.down,
            Direction::Left => self.left,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, Coord)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.get(d).map(|c| (d, c)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    cell: Option<Coord>,
    neighbors: Neighbors,
}

impl Selection {
    /// Select `c` unless something is already selected. Returns whether it took.
    pub fn select(&mut self, c: Coord, rows: usize, cols: usize) -> bool {
        if self.cell.is_some() {
            return false;
        }
        debug_assert!(c.row < rows && c.col < cols);
        self.cell = Some(c);
        self.neighbors = Neighbors::around(c, rows, cols);
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn cell(&self) -> Option<Coord> {
        self.cell
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.cell.is_some()
    }

    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    pub fn neighbor(&self, dir: Direction) -> Option<Coord> {
        self.neighbors.get(dir)
    }

    /// Direction of `target` if it is one of the recorded neighbours.
    pub fn direction_to(&self, target: Coord) -> Option<Direction> {
        self.neighbors
            .iter()
            .find_map(|(d, c)| (c == target).then_some(d))
    }
}
