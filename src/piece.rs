//! Half-capsules, the pair table that joins them, and the player's faller.

use std::fmt;

/// Capsule/virus colour: a single ASCII letter, stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(char);

impl Color {
    /// Red, blue, yellow: the classic three.
    pub const RED: Self = Self('R');
    pub const BLUE: Self = Self('B');
    pub const YELLOW: Self = Self('Y');

    /// Colours a virus may have.
    pub const VIRUS_COLORS: [Self; 3] = [Self::RED, Self::BLUE, Self::YELLOW];

    pub fn new(c: char) -> Option<Self> {
        c.is_ascii_alphabetic().then(|| Self(c.to_ascii_uppercase()))
    }

    /// Parse a one-letter token such as `R` or `y`.
    pub fn parse(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => None,
        }
    }

    pub fn is_virus_color(self) -> bool {
        Self::VIRUS_COLORS.contains(&self)
    }

    #[inline]
    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a half-capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceState {
    Falling,
    Landed,
    Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfCapsule {
    pub color: Color,
    pub row: usize,
    pub col: usize,
    pub state: PieceState,
    pub pair: Option<PairId>,
    /// Skip the next gravity step (set when a clear orphans this half).
    pub delay: bool,
}

impl HalfCapsule {
    pub fn new(color: Color, row: usize, col: usize, state: PieceState) -> Self {
        Self {
            color,
            row,
            col,
            state,
            pair: None,
            delay: false,
        }
    }

    #[inline]
    pub fn pos(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

/// Two halves joined into one capsule.
///
/// `halves[0]` is the pivot: the left cell of a horizontal pair, the lower cell of a
/// vertical one. `halves[1]` sits at column + 1 or row - 1 respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub halves: [HalfId; 2],
    pub orientation: Orientation,
}

/// The pair under player control and its lock bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Faller {
    pub pair: PairId,
    /// Landed and observed still for one tick; the next still tick freezes it.
    pub lock_armed: bool,
}

impl Faller {
    pub fn new(pair: PairId) -> Self {
        Self {
            pair,
            lock_armed: false,
        }
    }
}

/// Arena of live half-capsules plus the pair table referencing them by index.
#[derive(Debug, Clone, Default)]
pub struct Pieces {
    halves: Vec<Option<HalfCapsule>>,
    pairs: Vec<Option<Pair>>,
}

impl Pieces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_half(&mut self, half: HalfCapsule) -> HalfId {
        self.halves.push(Some(half));
        HalfId(self.halves.len() - 1)
    }

    /// Join two existing halves into a pair; both must be untethered.
    pub fn join(&mut self, pivot: HalfId, orbiter: HalfId, orientation: Orientation) -> PairId {
        let id = PairId(self.pairs.len());
        self.pairs.push(Some(Pair {
            halves: [pivot, orbiter],
            orientation,
        }));
        for half in [pivot, orbiter] {
            if let Some(h) = self.half_mut(half) {
                h.pair = Some(id);
            }
        }
        id
    }

    #[inline]
    pub fn half(&self, id: HalfId) -> Option<&HalfCapsule> {
        self.halves.get(id.0).and_then(Option::as_ref)
    }

    #[inline]
    pub fn half_mut(&mut self, id: HalfId) -> Option<&mut HalfCapsule> {
        self.halves.get_mut(id.0).and_then(Option::as_mut)
    }

    #[inline]
    pub fn pair(&self, id: PairId) -> Option<&Pair> {
        self.pairs.get(id.0).and_then(Option::as_ref)
    }

    #[inline]
    pub fn pair_mut(&mut self, id: PairId) -> Option<&mut Pair> {
        self.pairs.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Both halves of a pair, pivot first.
    pub fn pair_halves(&self, id: PairId) -> Option<[&HalfCapsule; 2]> {
        let pair = self.pair(id)?;
        Some([self.half(pair.halves[0])?, self.half(pair.halves[1])?])
    }

    /// Lifecycle of a pair (both halves always share it; the pivot's is reported).
    pub fn pair_state(&self, id: PairId) -> Option<PieceState> {
        self.pair_halves(id).map(|[pivot, _]| pivot.state)
    }

    pub fn set_pair_state(&mut self, id: PairId, state: PieceState) {
        if let Some(pair) = self.pair(id).copied() {
            for half in pair.halves {
                if let Some(h) = self.half_mut(half) {
                    h.state = state;
                }
            }
        }
    }

    /// Orientation of a half: its pair's, or none when untethered.
    #[cfg(test)]
    pub fn orientation_of(&self, id: HalfId) -> Option<Orientation> {
        let pair = self.half(id)?.pair?;
        self.pair(pair).map(|p| p.orientation)
    }

    pub fn remove_half(&mut self, id: HalfId) -> Option<HalfCapsule> {
        self.halves.get_mut(id.0).and_then(Option::take)
    }

    /// Dissolve a pair; its halves stay alive, untethered.
    pub fn unjoin(&mut self, id: PairId) -> Option<Pair> {
        let pair = self.pairs.get_mut(id.0).and_then(Option::take)?;
        for half in pair.halves {
            if let Some(h) = self.half_mut(half) {
                h.pair = None;
            }
        }
        Some(pair)
    }

    pub fn halves(&self) -> impl Iterator<Item = (HalfId, &HalfCapsule)> {
        self.halves
            .iter()
            .enumerate()
            .filter_map(|(i, h)| h.as_ref().map(|h| (HalfId(i), h)))
    }

    pub fn pairs(&self) -> impl Iterator<Item = (PairId, &Pair)> {
        self.pairs
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (PairId(i), p)))
    }

    /// Halves that belong to no pair.
    pub fn untethered(&self) -> impl Iterator<Item = (HalfId, &HalfCapsule)> {
        self.halves().filter(|(_, h)| h.pair.is_none())
    }

    #[cfg(test)]
    pub fn half_at(&self, row: usize, col: usize) -> Option<HalfId> {
        self.halves()
            .find(|(_, h)| h.row == row && h.col == col)
            .map(|(id, _)| id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.halves().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_normalises_case() {
        assert_eq!(Color::parse("r"), Some(Color::RED));
        assert_eq!(Color::parse("Y"), Some(Color::YELLOW));
        assert_eq!(Color::parse("RB"), None);
        assert_eq!(Color::parse(""), None);
        assert_eq!(Color::parse("1"), None);
    }

    #[test]
    fn test_join_shares_orientation() {
        let mut pieces = Pieces::new();
        let a = pieces.insert_half(HalfCapsule::new(Color::RED, 1, 2, PieceState::Falling));
        let b = pieces.insert_half(HalfCapsule::new(Color::BLUE, 1, 3, PieceState::Falling));
        let pair = pieces.join(a, b, Orientation::Horizontal);

        assert_eq!(pieces.orientation_of(a), Some(Orientation::Horizontal));
        assert_eq!(pieces.orientation_of(b), Some(Orientation::Horizontal));

        pieces.pair_mut(pair).unwrap().orientation = Orientation::Vertical;
        assert_eq!(pieces.orientation_of(a), pieces.orientation_of(b));
        assert_eq!(pieces.untethered().count(), 0);
    }

    #[test]
    fn test_unjoin_leaves_halves_untethered() {
        let mut pieces = Pieces::new();
        let a = pieces.insert_half(HalfCapsule::new(Color::RED, 1, 2, PieceState::Frozen));
        let b = pieces.insert_half(HalfCapsule::new(Color::BLUE, 1, 3, PieceState::Frozen));
        let pair = pieces.join(a, b, Orientation::Horizontal);

        assert!(pieces.unjoin(pair).is_some());
        assert!(pieces.pair(pair).is_none());
        assert_eq!(pieces.untethered().count(), 2);
        assert_eq!(pieces.orientation_of(a), None);
    }

    #[test]
    fn test_set_pair_state_moves_both_halves() {
        let mut pieces = Pieces::new();
        let a = pieces.insert_half(HalfCapsule::new(Color::RED, 2, 0, PieceState::Falling));
        let b = pieces.insert_half(HalfCapsule::new(Color::RED, 1, 0, PieceState::Falling));
        let pair = pieces.join(a, b, Orientation::Vertical);

        pieces.set_pair_state(pair, PieceState::Landed);
        assert_eq!(pieces.half(a).unwrap().state, PieceState::Landed);
        assert_eq!(pieces.half(b).unwrap().state, PieceState::Landed);
        assert_eq!(pieces.pair_state(pair), Some(PieceState::Landed));
    }

    #[test]
    fn test_half_at_and_remove() {
        let mut pieces = Pieces::new();
        let a = pieces.insert_half(HalfCapsule::new(Color::YELLOW, 4, 1, PieceState::Frozen));
        assert_eq!(pieces.half_at(4, 1), Some(a));
        assert_eq!(pieces.half_at(4, 2), None);
        assert!(pieces.remove_half(a).is_some());
        assert!(pieces.remove_half(a).is_none());
        assert_eq!(pieces.len(), 0);
    }
}
