use crate::coords::{Cell, Region};
use crate::store::CellStore;
use serde::{Deserialize, Serialize};

/// The population at one generation, as recorded by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: u64,
    pub population: u64,
    /// Smallest region holding every live cell; `None` when the board is empty.
    pub bounding_box: Option<Region>,
    /// Dense grid bounds at the time of the snapshot, `None` for sparse storage.
    pub grid_bounds: Option<Region>,
    /// Live cells sorted by `(x, y)`. `None` when the run only records statistics.
    pub live_cells: Option<Vec<Cell>>,
}

impl Snapshot {
    pub fn capture<S: CellStore>(generation: u64, store: &S, with_cells: bool) -> Self {
        let live_cells = with_cells.then(|| {
            let mut cells: Vec<Cell> = store.live_cells().collect();
            cells.sort_unstable();
            cells
        });
        Snapshot {
            generation,
            population: store.population() as u64,
            bounding_box: store.bounding_box(),
            grid_bounds: store.bounds(),
            live_cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseField;

    #[test]
    fn capture_sorts_cells() {
        let field = SparseField::from_cells([Cell::new(3, 1), Cell::new(-2, 5), Cell::new(3, 0)]);
        let snap = Snapshot::capture(9, &field, true);
        assert_eq!(snap.population, 3);
        assert_eq!(snap.bounding_box, Some(Region::new(-2, 0, 4, 6)));
        assert_eq!(
            snap.live_cells.unwrap(),
            vec![Cell::new(-2, 5), Cell::new(3, 0), Cell::new(3, 1)]
        );
        assert!(Snapshot::capture(9, &field, false).live_cells.is_none());
    }
}
