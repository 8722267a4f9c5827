//! Field storage: rows × columns of cells, bounds-checked.

use crate::piece::Color;
use thiserror::Error;

/// Single cell: empty, a virus, or one half of a capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Virus(Color),
    Capsule(Color),
}

impl Cell {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Colour regardless of kind; viruses and capsules of one colour compare equal.
    #[inline]
    pub fn color(&self) -> Option<Color> {
        match self {
            Self::Empty => None,
            Self::Virus(c) | Self::Capsule(c) => Some(*c),
        }
    }

    /// Character shown in the field: lowercase for viruses, uppercase for capsules.
    pub fn glyph(&self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Virus(c) => c.as_char().to_ascii_lowercase(),
            Self::Capsule(c) => c.as_char(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside a {rows}x{columns} field")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        columns: usize,
    },
}

/// Playfield: grid of cells. Row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    /// cells[row][col]
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![vec![Cell::Empty; columns]; rows],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.columns
    }

    fn check(&self, row: usize, col: usize) -> Result<(), GridError> {
        if self.in_bounds(row, col) {
            Ok(())
        } else {
            Err(GridError::OutOfRange {
                row,
                col,
                rows: self.rows,
                columns: self.columns,
            })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Cell, GridError> {
        self.check(row, col)?;
        Ok(self.cells[row][col])
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), GridError> {
        self.check(row, col)?;
        self.cells[row][col] = cell;
        Ok(())
    }

    /// True if (row, col) is inside the field and empty.
    #[inline]
    pub fn is_open(&self, row: usize, col: usize) -> bool {
        matches!(self.get(row, col), Ok(Cell::Empty))
    }

    /// Number of non-empty cells.
    #[cfg(test)]
    pub fn count_occupied(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    pub fn has_virus(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .any(|cell| matches!(cell, Cell::Virus(_)))
    }

    /// Row-major iterator over ((row, col), cell).
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().map(move |(c, cell)| ((r, c), *cell))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::new('r').unwrap()
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(3, 4);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.columns(), 4);
        assert_eq!(grid.count_occupied(), 0);
        assert!(grid.iter().all(|(_, cell)| cell == Cell::Empty));
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new(3, 4);
        grid.set(2, 3, Cell::Capsule(red())).unwrap();
        assert_eq!(grid.get(2, 3), Ok(Cell::Capsule(red())));
        assert!(!grid.is_open(2, 3));
        assert_eq!(grid.count_occupied(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let mut grid = Grid::new(3, 4);
        assert!(matches!(grid.get(3, 0), Err(GridError::OutOfRange { row: 3, .. })));
        assert!(matches!(grid.get(0, 4), Err(GridError::OutOfRange { col: 4, .. })));
        assert!(grid.set(5, 5, Cell::Virus(red())).is_err());
        assert!(!grid.is_open(3, 0));
    }

    #[test]
    fn test_virus_and_capsule_share_colour() {
        assert_eq!(Cell::Virus(red()).color(), Cell::Capsule(red()).color());
        assert_eq!(Cell::Virus(red()).glyph(), 'r');
        assert_eq!(Cell::Capsule(red()).glyph(), 'R');
        assert!(Cell::Empty.color().is_none());
    }

    #[test]
    fn test_has_virus() {
        let mut grid = Grid::new(2, 2);
        assert!(!grid.has_virus());
        grid.set(1, 1, Cell::Virus(red())).unwrap();
        assert!(grid.has_virus());
    }
}
