//! Gravity, landing and freezing, clearing, lateral movement and rotation with wall-kick.

use crate::grid::{Cell, Grid, GridError};
use crate::matching::{Coord, MatchSet};
use crate::piece::{Faller, HalfId, Orientation, PairId, PieceState, Pieces};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Clockwise,
    Counterclockwise,
}

/// Target cells for a pair (pivot first) and the orientation they form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    cells: [Coord; 2],
    orientation: Orientation,
    swap_colors: bool,
}

fn offset((row, col): Coord, dr: isize, dc: isize) -> Option<Coord> {
    Some((row.checked_add_signed(dr)?, col.checked_add_signed(dc)?))
}

/// Cell is inside the field and either empty or already held by `own`.
fn fits(grid: &Grid, own: &[Coord], cell: Coord) -> bool {
    own.contains(&cell) || grid.is_open(cell.0, cell.1)
}

/// Every cell of `own` could move one row down.
fn can_drop(grid: &Grid, own: &[Coord]) -> bool {
    own.iter()
        .all(|&(r, c)| offset((r, c), 1, 0).is_some_and(|below| fits(grid, own, below)))
}

/// A destination below `own` was emptied by this tick's clear.
fn pending_blocks(own: &[Coord], pending: &MatchSet) -> bool {
    own.iter().any(|&(r, c)| {
        let below = (r + 1, c);
        pending.contains(&below) && !own.contains(&below)
    })
}

fn pair_cells(pieces: &Pieces, id: PairId) -> Option<[Coord; 2]> {
    pieces.pair_halves(id).map(|[a, b]| [a.pos(), b.pos()])
}

/// Move a pair to `placement` if every target fits; all-or-nothing.
fn place_pair(
    grid: &mut Grid,
    pieces: &mut Pieces,
    id: PairId,
    placement: Placement,
) -> Result<bool, GridError> {
    let (Some(pair), Some(own)) = (pieces.pair(id).copied(), pair_cells(pieces, id)) else {
        return Ok(false);
    };
    if !placement.cells.iter().all(|&cell| fits(grid, &own, cell)) {
        return Ok(false);
    }

    let mut colors = pair
        .halves
        .map(|h| pieces.half(h).map(|h| h.color));
    if placement.swap_colors {
        colors.swap(0, 1);
    }

    for (r, c) in own {
        grid.set(r, c, Cell::Empty)?;
    }
    for ((half, (r, c)), color) in pair.halves.into_iter().zip(placement.cells).zip(colors) {
        let (Some(h), Some(color)) = (pieces.half_mut(half), color) else {
            continue;
        };
        h.row = r;
        h.col = c;
        h.color = color;
        grid.set(r, c, Cell::Capsule(color))?;
    }
    if let Some(pair) = pieces.pair_mut(id) {
        pair.orientation = placement.orientation;
    }
    Ok(true)
}

fn translate(
    grid: &mut Grid,
    pieces: &mut Pieces,
    id: PairId,
    dr: isize,
    dc: isize,
) -> Result<bool, GridError> {
    let (Some(pair), Some([a, b])) = (pieces.pair(id).copied(), pair_cells(pieces, id)) else {
        return Ok(false);
    };
    let (Some(a), Some(b)) = (offset(a, dr, dc), offset(b, dr, dc)) else {
        return Ok(false);
    };
    place_pair(
        grid,
        pieces,
        id,
        Placement {
            cells: [a, b],
            orientation: pair.orientation,
            swap_colors: false,
        },
    )
}

/// Move a pair one column left (`dc = -1`) or right (`dc = 1`). Blocked moves change nothing.
pub fn shift(
    grid: &mut Grid,
    pieces: &mut Pieces,
    id: PairId,
    dc: isize,
) -> Result<bool, GridError> {
    translate(grid, pieces, id, 0, dc)
}

/// Rotate a pair a quarter turn about its pivot, kicking one column if the default target is
/// blocked. Half 0 stays on the lower/left cell, so colours swap where the turn would otherwise
/// put them out of place.
pub fn rotate(
    grid: &mut Grid,
    pieces: &mut Pieces,
    id: PairId,
    spin: Spin,
) -> Result<bool, GridError> {
    let (Some(pair), Some([pivot, _])) = (pieces.pair(id).copied(), pair_cells(pieces, id)) else {
        return Ok(false);
    };
    let swap_colors = matches!(
        (pair.orientation, spin),
        (Orientation::Horizontal, Spin::Clockwise) | (Orientation::Vertical, Spin::Counterclockwise)
    );
    let candidates = match pair.orientation {
        Orientation::Horizontal => [
            offset(pivot, -1, 0).map(|top| [pivot, top]),
            offset(pivot, 0, 1)
                .zip(offset(pivot, -1, 1))
                .map(|(kicked, top)| [kicked, top]),
        ],
        Orientation::Vertical => [
            offset(pivot, 0, 1).map(|right| [pivot, right]),
            offset(pivot, 0, -1).map(|left| [left, pivot]),
        ],
    };

    for cells in candidates.into_iter().flatten() {
        let placement = Placement {
            cells,
            orientation: pair.orientation.toggled(),
            swap_colors,
        };
        if place_pair(grid, pieces, id, placement)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Remove every piece on a matched coordinate and empty those cells.
///
/// A pair losing both halves disappears; a pair losing one leaves its survivor untethered
/// and falling, held in place for one tick. Returns the number of cells emptied, so a
/// repeated call on the same set reports zero.
pub fn clear_matches(
    grid: &mut Grid,
    pieces: &mut Pieces,
    matched: &MatchSet,
) -> Result<usize, GridError> {
    let hit = |pieces: &Pieces, half: HalfId| {
        pieces
            .half(half)
            .is_some_and(|h| matched.contains(&h.pos()))
    };

    let pair_ids: Vec<PairId> = pieces.pairs().map(|(id, _)| id).collect();
    for id in pair_ids {
        let Some(pair) = pieces.pair(id).copied() else {
            continue;
        };
        let hits = pair.halves.map(|h| hit(pieces, h));
        if !hits.contains(&true) {
            continue;
        }
        pieces.unjoin(id);
        for (half, was_hit) in pair.halves.into_iter().zip(hits) {
            if was_hit {
                pieces.remove_half(half);
            } else if let Some(h) = pieces.half_mut(half) {
                h.state = PieceState::Falling;
                h.delay = true;
            }
        }
    }

    let doomed: Vec<HalfId> = pieces
        .untethered()
        .filter(|(_, h)| matched.contains(&h.pos()))
        .map(|(id, _)| id)
        .collect();
    for id in doomed {
        pieces.remove_half(id);
    }

    let mut cleared = 0;
    for &(r, c) in matched {
        if !grid.get(r, c)?.is_empty() {
            grid.set(r, c, Cell::Empty)?;
            cleared += 1;
        }
    }
    Ok(cleared)
}

/// One gravity step for every piece: untethered halves bottom row first, then pairs bottom
/// row first. Nothing drops into a cell listed in `pending` (the cells cleared this tick).
pub fn apply_gravity(
    grid: &mut Grid,
    pieces: &mut Pieces,
    faller: &mut Option<Faller>,
    pending: &MatchSet,
) -> Result<(), GridError> {
    let mut loose: Vec<(HalfId, usize)> = pieces.untethered().map(|(id, h)| (id, h.row)).collect();
    loose.sort_by(|a, b| b.1.cmp(&a.1));
    for (id, _) in loose {
        settle_half(grid, pieces, id, pending)?;
    }

    let mut pairs: Vec<(PairId, usize)> = pieces
        .pairs()
        .filter_map(|(id, _)| pair_cells(pieces, id).map(|[a, b]| (id, a.0.max(b.0))))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    for (id, _) in pairs {
        match faller.as_mut().filter(|f| f.pair == id) {
            Some(f) => step_faller(grid, pieces, f, pending)?,
            None => settle_pair(grid, pieces, id, pending)?,
        }
    }
    Ok(())
}

fn settle_half(
    grid: &mut Grid,
    pieces: &mut Pieces,
    id: HalfId,
    pending: &MatchSet,
) -> Result<(), GridError> {
    let Some(half) = pieces.half_mut(id) else {
        return Ok(());
    };
    let own = [half.pos()];
    if half.state != PieceState::Falling {
        if !can_drop(grid, &own) {
            half.state = PieceState::Frozen;
            return Ok(());
        }
        half.state = PieceState::Falling;
    }
    if half.delay {
        half.delay = false;
        return Ok(());
    }
    if pending_blocks(&own, pending) {
        return Ok(());
    }

    let (mut r, c) = own[0];
    if can_drop(grid, &own) {
        grid.set(r, c, Cell::Empty)?;
        r += 1;
        grid.set(r, c, Cell::Capsule(half.color))?;
        half.row = r;
    }
    if !can_drop(grid, &[(r, c)]) {
        half.state = PieceState::Frozen;
    }
    Ok(())
}

/// Gravity for a pair nobody controls: it falls while it can and freezes where it stops.
fn settle_pair(
    grid: &mut Grid,
    pieces: &mut Pieces,
    id: PairId,
    pending: &MatchSet,
) -> Result<(), GridError> {
    let (Some(own), Some(state)) = (pair_cells(pieces, id), pieces.pair_state(id)) else {
        return Ok(());
    };
    if state != PieceState::Falling {
        if !can_drop(grid, &own) {
            pieces.set_pair_state(id, PieceState::Frozen);
            return Ok(());
        }
        pieces.set_pair_state(id, PieceState::Falling);
    }
    if pending_blocks(&own, pending) {
        return Ok(());
    }
    translate(grid, pieces, id, 1, 0)?;
    if pair_cells(pieces, id).is_some_and(|own| !can_drop(grid, &own)) {
        pieces.set_pair_state(id, PieceState::Frozen);
    }
    Ok(())
}

/// Gravity for the player's pair: falling → landed → (one still tick) → frozen.
fn step_faller(
    grid: &mut Grid,
    pieces: &mut Pieces,
    faller: &mut Faller,
    pending: &MatchSet,
) -> Result<(), GridError> {
    let id = faller.pair;
    let (Some(own), Some(state)) = (pair_cells(pieces, id), pieces.pair_state(id)) else {
        return Ok(());
    };
    match state {
        PieceState::Frozen => return Ok(()),
        PieceState::Landed if can_drop(grid, &own) => {
            pieces.set_pair_state(id, PieceState::Falling);
            faller.lock_armed = false;
        }
        PieceState::Landed => {
            if faller.lock_armed {
                pieces.set_pair_state(id, PieceState::Frozen);
            } else {
                faller.lock_armed = true;
            }
            return Ok(());
        }
        PieceState::Falling => {}
    }

    if !pending_blocks(&own, pending) {
        translate(grid, pieces, id, 1, 0)?;
    }
    if pair_cells(pieces, id).is_some_and(|own| !can_drop(grid, &own)) {
        pieces.set_pair_state(id, PieceState::Landed);
        faller.lock_armed = true;
    }
    Ok(())
}

/// Re-check the faller's support after it moved or rotated: landed over a gap starts falling
/// again, falling onto support lands. Either way the lock is disarmed, so a moved faller always
/// gets one more still tick before it freezes.
pub fn refresh_support(grid: &Grid, pieces: &mut Pieces, faller: &mut Faller) {
    let Some(own) = pair_cells(pieces, faller.pair) else {
        return;
    };
    let state = if can_drop(grid, &own) {
        PieceState::Falling
    } else {
        PieceState::Landed
    };
    pieces.set_pair_state(faller.pair, state);
    faller.lock_armed = false;
}
