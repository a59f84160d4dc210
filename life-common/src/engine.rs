//! The Game of Life stepping rule (B3/S23) over any [`CellStore`].

use crate::coords::Cell;
use crate::store::CellStore;
use rayon::prelude::*;

/// Moore neighbourhood offsets, `(dx, dy)`.
pub const MOORE_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Number of live cells around `cell`. Cells outside a bounded store, or past
/// the edge of the plane, count as dead.
#[inline(always)]
pub fn live_neighbors<S: CellStore>(store: &S, cell: Cell) -> u8 {
    MOORE_OFFSETS
        .iter()
        .filter_map(|&(dx, dy)| cell.checked_offset(dx, dy))
        .filter(|&neighbor| store.contains(neighbor))
        .count() as u8
}

/// Survival on 2 or 3 neighbours, birth on exactly 3.
#[inline(always)]
pub fn next_state(alive: bool, neighbors: u8) -> bool {
    matches!((alive, neighbors), (true, 2) | (true, 3) | (false, 3))
}

/// Produces the next generation. The input is only read, never modified.
pub fn step<S: CellStore>(store: &S) -> S {
    let next: Vec<Cell> = store
        .candidates()
        .into_par_iter()
        .filter(|&cell| next_state(store.contains(cell), live_neighbors(store, cell)))
        .collect();
    store.with_live(next)
}

/// Applies [`step`] `generations` times.
pub fn step_n<S: CellStore>(store: &S, generations: u32) -> S {
    let mut current = store.clone();
    for _ in 0..generations {
        current = step(&current);
    }
    current
}
