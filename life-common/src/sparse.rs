use crate::coords::{Cell, Region};
use crate::engine::MOORE_OFFSETS;
use crate::error::LifeResult;
use crate::store::{CellStore, Density, RandomizeMode};
use log::debug;
use rand::Rng;
use std::collections::HashSet;

/// Unbounded plane storing only live cells. Absence means dead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseField {
    live: HashSet<Cell>,
}

impl SparseField {
    pub fn new() -> Self {
        SparseField::default()
    }

    pub fn from_cells<I: IntoIterator<Item = Cell>>(cells: I) -> Self {
        SparseField {
            live: cells.into_iter().collect(),
        }
    }
}

impl CellStore for SparseField {
    fn is_alive(&self, cell: Cell) -> LifeResult<bool> {
        Ok(self.live.contains(&cell))
    }

    #[inline]
    fn contains(&self, cell: Cell) -> bool {
        self.live.contains(&cell)
    }

    fn toggle(&self, cell: Cell) -> LifeResult<Self> {
        let mut next = self.clone();
        if !next.live.remove(&cell) {
            next.live.insert(cell);
        }
        Ok(next)
    }

    fn live_cells(&self) -> Box<dyn Iterator<Item = Cell> + '_> {
        Box::new(self.live.iter().copied())
    }

    fn population(&self) -> usize {
        self.live.len()
    }

    fn randomized<R: Rng + ?Sized>(
        &self,
        density: &Density,
        region: Option<Region>,
        mode: RandomizeMode,
        rng: &mut R,
    ) -> Self {
        let Some(region) = region else {
            debug!("Randomize on an unbounded field without a region; result is empty.");
            return SparseField::new();
        };
        SparseField::from_cells(region.cells().filter(|_| mode.roll(density, rng)))
    }

    fn cleared(&self, region: Option<Region>) -> Self {
        match region {
            None => SparseField::new(),
            Some(r) => {
                SparseField::from_cells(self.live.iter().copied().filter(|c| !r.contains(*c)))
            }
        }
    }

    fn resized(&self, _width: u32, _height: u32) -> Self {
        self.clone()
    }

    fn bounds(&self) -> Option<Region> {
        None
    }

    fn candidates(&self) -> Vec<Cell> {
        let mut seen: HashSet<Cell> = HashSet::with_capacity(self.live.len() * 9);
        for &cell in &self.live {
            seen.insert(cell);
            // Neighbours past the edge of the plane do not exist.
            seen.extend(MOORE_OFFSETS.iter().filter_map(|&(dx, dy)| cell.checked_offset(dx, dy)));
        }
        seen.into_iter().collect()
    }

    fn with_live<I: IntoIterator<Item = Cell>>(&self, cells: I) -> Self {
        SparseField::from_cells(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_cells_are_dead_anywhere() {
        let field = SparseField::new();
        assert!(!field.is_alive(Cell::new(i64::MIN / 2, 12)).unwrap());
        assert!(!field.is_alive(Cell::new(-40, -40)).unwrap());
    }

    #[test]
    fn toggle_to_dead_removes_entry() {
        let field = SparseField::new().toggle(Cell::new(-3, 7)).unwrap();
        assert_eq!(field.population(), 1);
        let back = field.toggle(Cell::new(-3, 7)).unwrap();
        assert_eq!(back.population(), 0);
        assert_eq!(back, SparseField::new());
    }

    #[test]
    fn candidates_cover_live_cells_and_neighbours() {
        let field = SparseField::from_cells([Cell::new(0, 0)]);
        let candidates: HashSet<Cell> = field.candidates().into_iter().collect();
        assert_eq!(candidates, Region::new(-1, -1, 2, 2).cells().collect());
        // Neighbourhoods that overlap are not evaluated twice.
        let pair = SparseField::from_cells([Cell::new(0, 0), Cell::new(1, 0)]);
        assert_eq!(pair.candidates().len(), 12);
    }

    #[test]
    fn clear_region_keeps_cells_outside() {
        let field = SparseField::from_cells([Cell::new(0, 0), Cell::new(10, 10)]);
        let cleared = field.cleared(Some(Region::new(-5, -5, 5, 5)));
        assert_eq!(cleared.live_cells().collect::<Vec<_>>(), vec![Cell::new(10, 10)]);
        assert_eq!(field.cleared(None).population(), 0);
    }

    #[test]
    fn cells_on_the_plane_edge_step_without_overflow() {
        let corner = Cell::new(i64::MAX, i64::MAX);
        let field = SparseField::new().toggle(corner).unwrap();
        assert_eq!(field.candidates().len(), 4);
        assert_eq!(field.bounding_box(), Some(Region::new(i64::MAX, i64::MAX, i64::MAX, i64::MAX)));

        let bar = SparseField::from_cells([
            Cell::new(i64::MAX, 0),
            Cell::new(i64::MAX, 1),
            Cell::new(i64::MAX, 2),
        ]);
        let next = crate::engine::step(&bar);
        // The next phase of the blinker would reach past the edge, so it is cut short.
        assert_eq!(
            next.live_cells().collect::<HashSet<_>>(),
            [Cell::new(i64::MAX - 1, 1), Cell::new(i64::MAX, 1)].into_iter().collect()
        );
    }

    #[test]
    fn resize_is_a_no_op() {
        let field = SparseField::from_cells([Cell::new(100, -100)]);
        assert_eq!(field.resized(3, 3), field);
        assert!(field.bounds().is_none());
    }
}
