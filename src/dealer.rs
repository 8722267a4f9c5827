//! Seeded colour source for the interactive game: faller colours and the starting virus layout.

use crate::piece::Color;
use crate::session::GameState;

/// Colours dealt to fallers and viruses.
pub const PALETTE: [Color; 3] = [Color::RED, Color::BLUE, Color::YELLOW];

/// Rows at the top of the field that never receive a virus.
const VIRUS_FREE_ROWS: usize = 3;

/// Deterministic dealer (LCG); the same seed deals the same game.
#[derive(Debug, Clone)]
pub struct Dealer {
    rng: u32,
    next: (Color, Color),
}

impl Dealer {
    pub fn new(seed: u32) -> Self {
        let mut d = Self {
            rng: seed,
            next: (Color::RED, Color::RED),
        };
        d.next = d.draw_pair();
        d
    }

    fn next_rand(&mut self) -> u32 {
        self.rng = self.rng.wrapping_mul(1103515245).wrapping_add(12345);
        self.rng >> 16
    }

    fn below(&mut self, n: usize) -> usize {
        self.next_rand() as usize % n.max(1)
    }

    fn draw_color(&mut self) -> Color {
        PALETTE[self.below(PALETTE.len())]
    }

    fn draw_pair(&mut self) -> (Color, Color) {
        (self.draw_color(), self.draw_color())
    }

    /// Colours of the faller after the current one.
    pub fn peek(&self) -> (Color, Color) {
        self.next
    }

    pub fn next_pair(&mut self) -> (Color, Color) {
        let upcoming = self.draw_pair();
        std::mem::replace(&mut self.next, upcoming)
    }

    /// Scatter up to `count` viruses over the lower part of the field, avoiding
    /// three-in-a-row of one colour so the field never starts with a match.
    /// Returns how many were placed.
    pub fn seed_viruses(&mut self, state: &mut GameState, count: usize) -> usize {
        let (rows, columns) = (state.rows(), state.columns());
        let top = VIRUS_FREE_ROWS.min(rows.saturating_sub(1));
        let mut cells: Vec<(usize, usize)> = (top..rows)
            .flat_map(|r| (0..columns).map(move |c| (r, c)))
            .filter(|&(r, c)| state.grid().is_open(r, c))
            .collect();
        // Fisher-Yates shuffle
        for i in (1..cells.len()).rev() {
            let j = self.below(i + 1);
            cells.swap(i, j);
        }

        let mut placed = 0;
        for (r, c) in cells {
            if placed == count {
                break;
            }
            let start = self.below(PALETTE.len());
            let color = (0..PALETTE.len())
                .map(|k| PALETTE[(start + k) % PALETTE.len()])
                .find(|&color| !completes_run(state, r, c, color));
            if color.is_some_and(|color| state.create_virus(r, c, color)) {
                placed += 1;
            }
        }
        placed
    }
}

impl Default for Dealer {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}

/// True if `color` at (row, col) would line up with two same-coloured neighbours on either side.
fn completes_run(state: &GameState, row: usize, col: usize, color: Color) -> bool {
    let grid = state.grid();
    let same = |r: Option<usize>, c: Option<usize>| match (r, c) {
        (Some(r), Some(c)) => grid.get(r, c).ok().and_then(|cell| cell.color()) == Some(color),
        _ => false,
    };
    let run = |dr: isize, dc: isize| {
        (1..=2).all(|k| {
            same(
                row.checked_add_signed(dr * k),
                col.checked_add_signed(dc * k),
            )
        })
    };
    run(0, -1) || run(0, 1) || run(-1, 0) || run(1, 0)
}
