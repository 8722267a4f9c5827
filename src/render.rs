//! Plain-text field rendering: three characters per cell with piece-state decorations.

use crate::piece::{Orientation, PieceState};
use crate::session::GameState;

pub const LEVEL_CLEARED: &str = "LEVEL CLEARED";
pub const GAME_OVER: &str = "GAME OVER";

/// Three-character label for every cell, `labels[row][col]`.
///
/// Horizontal pairs show `[X-`/`-X]` falling, `|X-`/`-X|` landed, ` X-`/`-X ` frozen;
/// vertical pairs show `[X]` falling and `|X|` landed. Cells in the pending match set
/// show `*X*`, which wins over any piece decoration.
pub fn labels(state: &GameState) -> Vec<Vec<String>> {
    let grid = state.grid();
    let mut out: Vec<Vec<String>> = (0..grid.rows())
        .map(|_| vec![String::new(); grid.columns()])
        .collect();
    for ((r, c), cell) in grid.iter() {
        out[r][c] = format!(" {} ", cell.glyph());
    }

    let pieces = state.pieces();
    for (id, pair) in pieces.pairs() {
        let Some([pivot, orbiter]) = pieces.pair_halves(id) else {
            continue;
        };
        let (a, b) = (pivot.color, orbiter.color);
        let decorated = match (pair.orientation, pivot.state) {
            (Orientation::Horizontal, PieceState::Falling) => {
                Some((format!("[{a}-"), format!("-{b}]")))
            }
            (Orientation::Horizontal, PieceState::Landed) => {
                Some((format!("|{a}-"), format!("-{b}|")))
            }
            (Orientation::Horizontal, PieceState::Frozen) => {
                Some((format!(" {a}-"), format!("-{b} ")))
            }
            (Orientation::Vertical, PieceState::Falling) => {
                Some((format!("[{a}]"), format!("[{b}]")))
            }
            (Orientation::Vertical, PieceState::Landed) => {
                Some((format!("|{a}|"), format!("|{b}|")))
            }
            (Orientation::Vertical, PieceState::Frozen) => None,
        };
        if let Some((pivot_label, orbiter_label)) = decorated {
            out[pivot.row][pivot.col] = pivot_label;
            out[orbiter.row][orbiter.col] = orbiter_label;
        }
    }

    for &(r, c) in state.matches() {
        if let Ok(cell) = grid.get(r, c) {
            out[r][c] = format!("*{}*", cell.glyph());
        }
    }
    out
}

/// The whole field, one line per row, walls on both sides and a floor underneath.
pub fn field_lines(state: &GameState) -> Vec<String> {
    let mut lines: Vec<String> = labels(state)
        .into_iter()
        .map(|row| format!("|{}|", row.concat()))
        .collect();
    lines.push(format!(" {} ", "---".repeat(state.columns())));
    lines
}
