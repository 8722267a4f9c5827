//! Game session: field, pieces, the player's faller, cached matches, game over.
//!
//! Every command or tick runs to completion before the next one. A tick clears the matches
//! cached by the previous tick, applies gravity, then caches the new matches so a renderer can
//! highlight them for one turn before they disappear.

use crate::grid::{Cell, Grid, GridError};
use crate::matching::{find_matches, MatchSet};
use crate::physics::{self, Spin};
use crate::piece::{Color, Faller, HalfCapsule, Orientation, PairId, PieceState, Pieces};
use thiserror::Error;

/// Row a new faller appears in.
const SPAWN_ROW: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field must have at least one row and one column, got {rows}x{columns}")]
    EmptyField { rows: usize, columns: usize },
    #[error("expected {expected} lines of contents, got {found}")]
    RowCount { expected: usize, found: usize },
    #[error("line {line} must have exactly {expected} characters, got {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column {col}: {ch:?} is not a capsule, virus or space")]
    UnknownCell { line: usize, col: usize, ch: char },
}

/// Game state: field, live pieces, current faller, match cache.
#[derive(Debug, Clone)]
pub struct GameState {
    grid: Grid,
    pieces: Pieces,
    faller: Option<Faller>,
    /// Matches found at the end of the last turn; cleared by the next tick.
    matched: MatchSet,
    game_over: bool,
}

impl GameState {
    pub fn new(rows: usize, columns: usize) -> Result<Self, ConfigError> {
        if rows == 0 || columns == 0 {
            return Err(ConfigError::EmptyField { rows, columns });
        }
        Ok(Self {
            grid: Grid::new(rows, columns),
            pieces: Pieces::new(),
            faller: None,
            matched: MatchSet::new(),
            game_over: false,
        })
    }

    /// Build a field from literal rows: uppercase = capsule half, `r`/`b`/`y` = virus,
    /// space = empty. Halves resting on the floor or another cell start frozen, the rest fall.
    pub fn from_contents<S: AsRef<str>>(
        rows: usize,
        columns: usize,
        lines: &[S],
    ) -> Result<Self, ConfigError> {
        let mut state = Self::new(rows, columns)?;
        if lines.len() != rows {
            return Err(ConfigError::RowCount {
                expected: rows,
                found: lines.len(),
            });
        }

        for (r, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != columns {
                return Err(ConfigError::RowLength {
                    line: r + 1,
                    expected: columns,
                    found,
                });
            }
            for (c, ch) in line.chars().enumerate() {
                let cell = match (ch, Color::new(ch)) {
                    (' ', _) => Cell::Empty,
                    (_, Some(color)) if ch.is_ascii_uppercase() => Cell::Capsule(color),
                    (_, Some(color)) if color.is_virus_color() => Cell::Virus(color),
                    _ => {
                        return Err(ConfigError::UnknownCell {
                            line: r + 1,
                            col: c + 1,
                            ch,
                        });
                    }
                };
                state.grid.set(r, c, cell).map_err(|_| ConfigError::RowLength {
                    line: r + 1,
                    expected: columns,
                    found,
                })?;
            }
        }

        let capsules: Vec<_> = state
            .grid
            .iter()
            .filter_map(|(pos, cell)| match cell {
                Cell::Capsule(color) => Some((pos, color)),
                _ => None,
            })
            .collect();
        for ((r, c), color) in capsules {
            let resting = r + 1 == rows || !state.grid.is_open(r + 1, c);
            let phase = if resting {
                PieceState::Frozen
            } else {
                PieceState::Falling
            };
            state
                .pieces
                .insert_half(HalfCapsule::new(color, r, c, phase));
        }

        state.matched = find_matches(&state.grid, &state.pieces);
        Ok(state)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.grid.columns()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pieces(&self) -> &Pieces {
        &self.pieces
    }

    /// Matches that the next tick will clear.
    pub fn matches(&self) -> &MatchSet {
        &self.matched
    }

    pub fn faller(&self) -> Option<&Faller> {
        self.faller.as_ref()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// True when no virus is left on the field.
    pub fn is_level_cleared(&self) -> bool {
        !self.grid.has_virus()
    }

    /// No faller, no pending matches and nothing left falling: the field is ready for the
    /// next capsule.
    pub fn is_settled(&self) -> bool {
        self.faller.is_none()
            && self.matched.is_empty()
            && self
                .pieces
                .halves()
                .all(|(_, half)| half.state == PieceState::Frozen)
    }

    /// Spawn column: the centre, or left of centre on an even width.
    fn spawn_column(&self) -> usize {
        let columns = self.columns();
        if columns % 2 == 1 {
            columns / 2
        } else {
            (columns / 2).saturating_sub(1)
        }
    }

    /// Drop a new horizontal capsule into the spawn row. Does nothing while a faller is
    /// active; ends the game, leaving the field untouched, when a spawn cell is taken.
    pub fn create_faller(&mut self, left: Color, right: Color) -> Result<(), GridError> {
        if self.faller.is_some() || self.game_over {
            return Ok(());
        }
        let col = self.spawn_column();
        let cells = [(SPAWN_ROW, col), (SPAWN_ROW, col + 1)];
        if !cells.iter().all(|&(r, c)| self.grid.is_open(r, c)) {
            self.game_over = true;
            return Ok(());
        }

        let mut halves = Vec::with_capacity(2);
        for ((r, c), color) in cells.into_iter().zip([left, right]) {
            self.grid.set(r, c, Cell::Capsule(color))?;
            halves.push(
                self.pieces
                    .insert_half(HalfCapsule::new(color, r, c, PieceState::Falling)),
            );
        }
        let pair = self
            .pieces
            .join(halves[0], halves[1], Orientation::Horizontal);
        self.faller = Some(Faller::new(pair));
        Ok(())
    }

    /// Place a virus. Out-of-range or occupied targets and colours other than red, blue or
    /// yellow are ignored; returns whether it was placed.
    pub fn create_virus(&mut self, row: usize, col: usize, color: Color) -> bool {
        if !color.is_virus_color() || !self.grid.is_open(row, col) {
            return false;
        }
        self.grid.set(row, col, Cell::Virus(color)).is_ok()
    }

    /// One time step: clear last turn's matches, apply gravity, find new matches.
    pub fn tick(&mut self) -> Result<(), GridError> {
        if self.game_over {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.matched);
        physics::clear_matches(&mut self.grid, &mut self.pieces, &pending)?;
        physics::apply_gravity(&mut self.grid, &mut self.pieces, &mut self.faller, &pending)?;

        if let Some(faller) = self.faller {
            let state = self.pieces.pair_state(faller.pair);
            if matches!(state, None | Some(PieceState::Frozen)) {
                self.faller = None;
            }
        }

        self.matched = find_matches(&self.grid, &self.pieces);
        Ok(())
    }

    pub fn move_left(&mut self) -> Result<(), GridError> {
        self.steer(|grid, pieces, id| physics::shift(grid, pieces, id, -1))
    }

    pub fn move_right(&mut self) -> Result<(), GridError> {
        self.steer(|grid, pieces, id| physics::shift(grid, pieces, id, 1))
    }

    pub fn rotate_clockwise(&mut self) -> Result<(), GridError> {
        self.steer(|grid, pieces, id| physics::rotate(grid, pieces, id, Spin::Clockwise))
    }

    pub fn rotate_counterclockwise(&mut self) -> Result<(), GridError> {
        self.steer(|grid, pieces, id| physics::rotate(grid, pieces, id, Spin::Counterclockwise))
    }

    fn steer<F>(&mut self, op: F) -> Result<(), GridError>
    where
        F: FnOnce(&mut Grid, &mut Pieces, PairId) -> Result<bool, GridError>,
    {
        if self.game_over {
            return Ok(());
        }
        let Some(faller) = self.faller.as_mut() else {
            return Ok(());
        };
        if op(&mut self.grid, &mut self.pieces, faller.pair)? {
            physics::refresh_support(&self.grid, &mut self.pieces, faller);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: Color = Color::RED;
    const B: Color = Color::BLUE;

    fn faller_cells(state: &GameState) -> [(usize, usize); 2] {
        let faller = state.faller().unwrap();
        state
            .pieces()
            .pair_halves(faller.pair)
            .unwrap()
            .map(HalfCapsule::pos)
    }

    #[test]
    fn test_new_rejects_empty_field() {
        assert_eq!(
            GameState::new(0, 4).unwrap_err(),
            ConfigError::EmptyField { rows: 0, columns: 4 }
        );
    }

    #[test]
    fn test_contents_row_length_mismatch() {
        let err = GameState::from_contents(2, 3, &["   ", "    "]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::RowLength {
                line: 2,
                expected: 3,
                found: 4
            }
        );
    }

    #[test]
    fn test_contents_row_count_mismatch() {
        let err = GameState::from_contents(3, 2, &["  "]).unwrap_err();
        assert_eq!(err, ConfigError::RowCount { expected: 3, found: 1 });
    }

    #[test]
    fn test_contents_unknown_cell() {
        let err = GameState::from_contents(1, 2, &["R#"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCell { ch: '#', .. }));
    }

    #[test]
    fn test_contents_rejects_unknown_virus_colour() {
        let err = GameState::from_contents(1, 3, &["rgY"]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownCell { line: 1, col: 2, ch: 'g' });
        assert!(GameState::from_contents(1, 4, &["rbyG"]).is_ok());
    }

    #[test]
    fn test_create_virus_only_primary_colours() {
        let mut state = GameState::new(3, 3).unwrap();
        assert!(!state.create_virus(2, 0, Color::new('g').unwrap()));
        assert!(state.is_level_cleared());
        assert!(state.create_virus(2, 0, Color::new('y').unwrap()));
        assert!(!state.is_level_cleared());
    }

    #[test]
    fn test_contents_support_decides_state() {
        let state = GameState::from_contents(3, 2, &["R ", "  ", "Yb"]).unwrap();
        let floating = state.pieces().half_at(0, 0).unwrap();
        let resting = state.pieces().half_at(2, 0).unwrap();
        assert_eq!(state.pieces().half(floating).unwrap().state, PieceState::Falling);
        assert_eq!(state.pieces().half(resting).unwrap().state, PieceState::Frozen);
        assert_eq!(state.grid().get(2, 1), Ok(Cell::Virus(B)));
        assert_eq!(state.pieces().len(), 2);
    }

    #[test]
    fn test_contents_caches_initial_matches() {
        let state = GameState::from_contents(2, 4, &["    ", "RRRR"]).unwrap();
        assert_eq!(state.matches().len(), 4);
    }

    #[test]
    fn test_spawn_column_odd_and_even() {
        let mut odd = GameState::new(4, 5).unwrap();
        odd.create_faller(R, B).unwrap();
        assert_eq!(faller_cells(&odd), [(1, 2), (1, 3)]);

        let mut even = GameState::new(4, 6).unwrap();
        even.create_faller(R, B).unwrap();
        assert_eq!(faller_cells(&even), [(1, 2), (1, 3)]);
        assert_eq!(even.grid().get(1, 2), Ok(Cell::Capsule(R)));
        assert_eq!(even.grid().get(1, 3), Ok(Cell::Capsule(B)));
    }

    #[test]
    fn test_second_faller_is_ignored() {
        let mut state = GameState::new(4, 4).unwrap();
        state.create_faller(R, B).unwrap();
        let before = state.grid().clone();
        state.create_faller(B, B).unwrap();
        assert_eq!(state.grid(), &before);
        assert_eq!(state.pieces().len(), 2);
    }

    #[test]
    fn test_blocked_spawn_is_game_over() {
        let mut state = GameState::from_contents(3, 3, &["   ", "rby", "   "]).unwrap();
        let before = state.grid().clone();
        state.create_faller(R, B).unwrap();
        assert!(state.is_game_over());
        assert!(state.faller().is_none());
        assert_eq!(state.grid(), &before);
    }

    #[test]
    fn test_too_narrow_to_spawn_is_game_over() {
        let mut state = GameState::new(4, 1).unwrap();
        state.create_faller(R, B).unwrap();
        assert!(state.is_game_over());
    }

    #[test]
    fn test_create_virus_bounds_and_occupancy() {
        let mut state = GameState::new(3, 3).unwrap();
        assert!(state.create_virus(2, 2, R));
        assert!(!state.create_virus(2, 2, B));
        assert!(!state.create_virus(3, 0, B));
        assert!(!state.create_virus(0, 9, B));
        assert_eq!(state.grid().get(2, 2), Ok(Cell::Virus(R)));
        assert!(!state.is_level_cleared());
    }

    #[test]
    fn test_tick_drops_falling_half() {
        let mut state = GameState::from_contents(5, 1, &["R", " ", " ", " ", " "]).unwrap();
        state.tick().unwrap();
        assert_eq!(state.grid().get(0, 0), Ok(Cell::Empty));
        assert_eq!(state.grid().get(1, 0), Ok(Cell::Capsule(R)));
    }

    #[test]
    fn test_faller_lands_and_freezes() {
        let mut state = GameState::new(4, 3).unwrap();
        state.create_faller(R, B).unwrap();

        state.tick().unwrap();
        state.tick().unwrap();
        let pair = state.faller().unwrap().pair;
        assert_eq!(state.pieces().pair_state(pair), Some(PieceState::Landed));
        assert_eq!(faller_cells(&state), [(3, 1), (3, 2)]);

        state.tick().unwrap();
        assert!(state.faller().is_none());
        assert_eq!(state.pieces().pair_state(pair), Some(PieceState::Frozen));
    }

    #[test]
    fn test_landed_faller_never_freezes_right_after_a_move() {
        let mut state = GameState::new(3, 4).unwrap();
        state.create_faller(R, B).unwrap();
        state.tick().unwrap();
        let pair = state.faller().unwrap().pair;
        assert_eq!(state.pieces().pair_state(pair), Some(PieceState::Landed));

        for i in 0..20 {
            if i % 2 == 0 {
                state.move_right().unwrap();
            } else {
                state.move_left().unwrap();
            }
            state.tick().unwrap();
            assert!(state.faller().is_some(), "froze after move {i}");
        }

        state.tick().unwrap();
        assert!(state.faller().is_none());
        assert_eq!(state.pieces().pair_state(pair), Some(PieceState::Frozen));
    }

    #[test]
    fn test_commands_without_faller_do_nothing() {
        let mut state = GameState::from_contents(2, 2, &["  ", "r "]).unwrap();
        let before = state.grid().clone();
        state.move_left().unwrap();
        state.move_right().unwrap();
        state.rotate_clockwise().unwrap();
        state.rotate_counterclockwise().unwrap();
        assert_eq!(state.grid(), &before);
    }

    #[test]
    fn test_clear_and_settle_cycle() {
        let mut state =
            GameState::from_contents(4, 4, &["    ", "    ", "    ", "rrr "]).unwrap();
        state.create_faller(R, B).unwrap();
        state.rotate_counterclockwise().unwrap();
        state.move_right().unwrap();
        state.move_right().unwrap();
        assert_eq!(faller_cells(&state), [(1, 3), (0, 3)]);

        // Fall, land, freeze.
        state.tick().unwrap();
        state.tick().unwrap();
        assert!(state.faller().is_some());
        state.tick().unwrap();
        assert!(state.faller().is_none());
        assert_eq!(state.matches().len(), 4);
        assert!(!state.is_level_cleared());

        assert!(!state.is_settled());

        // Clear: the blue half is orphaned and held for a tick above the hole.
        state.tick().unwrap();
        assert!(state.is_level_cleared());
        assert!(state.matches().is_empty());
        assert_eq!(state.grid().get(2, 3), Ok(Cell::Capsule(B)));
        assert_eq!(state.grid().get(3, 3), Ok(Cell::Empty));

        state.tick().unwrap();
        assert_eq!(state.grid().get(3, 3), Ok(Cell::Capsule(B)));
        assert_eq!(state.grid().count_occupied(), 1);
        let (_, half) = state.pieces().untethered().next().unwrap();
        assert_eq!(half.state, PieceState::Frozen);
        assert!(state.is_settled());
    }

    #[test]
    fn test_game_over_freezes_session() {
        let mut state = GameState::from_contents(3, 2, &["  ", "rb", "  "]).unwrap();
        state.create_faller(R, B).unwrap();
        assert!(state.is_game_over());
        let before = state.grid().clone();
        state.tick().unwrap();
        assert_eq!(state.grid(), &before);
    }
}
