//! Match detection: runs of four or more same-colour cells.

use crate::grid::Grid;
use crate::piece::{PieceState, Pieces};
use std::collections::HashSet;

/// Number of aligned cells that make a match.
pub const MATCH_LEN: usize = 4;

pub type Coord = (usize, usize);

/// Matched (row, col) coordinates.
pub type MatchSet = HashSet<Coord>;

/// Find every cell that is part of a horizontal or vertical run of at least
/// [`MATCH_LEN`] equal colours. Cells held by a piece that is not frozen never match.
pub fn find_matches(grid: &Grid, pieces: &Pieces) -> MatchSet {
    let moving: HashSet<Coord> = pieces
        .halves()
        .filter(|(_, h)| h.state != PieceState::Frozen)
        .map(|(_, h)| h.pos())
        .collect();

    let color_at = |row: usize, col: usize| {
        if moving.contains(&(row, col)) {
            return None;
        }
        grid.get(row, col).ok().and_then(|cell| cell.color())
    };

    let mut matched = MatchSet::new();
    let (rows, columns) = (grid.rows(), grid.columns());

    for r in 0..rows {
        for c in 0..columns.saturating_sub(MATCH_LEN - 1) {
            let Some(first) = color_at(r, c) else { continue };
            if (1..MATCH_LEN).all(|i| color_at(r, c + i) == Some(first)) {
                matched.extend((0..MATCH_LEN).map(|i| (r, c + i)));
            }
        }
    }

    for c in 0..columns {
        for r in 0..rows.saturating_sub(MATCH_LEN - 1) {
            let Some(first) = color_at(r, c) else { continue };
            if (1..MATCH_LEN).all(|i| color_at(r + i, c) == Some(first)) {
                matched.extend((0..MATCH_LEN).map(|i| (r + i, c)));
            }
        }
    }

    matched
}
