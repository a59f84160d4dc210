use crate::coords::{Cell, Region};
use crate::error::{LifeError, LifeResult};
use crate::store::{CellStore, Density, RandomizeMode};
use rand::Rng;

/// Bounded grid with one flag per cell, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl DenseGrid {
    /// Largest grid, in cells, the session will allocate.
    pub const MAX_CELLS: u64 = 1 << 26;

    /// Rejects dimensions whose cell count exceeds [`DenseGrid::MAX_CELLS`].
    pub fn check_size(width: u32, height: u32) -> LifeResult<()> {
        let cells = width as u64 * height as u64;
        if cells > Self::MAX_CELLS {
            return Err(LifeError::invalid(format!(
                "a {}x{} grid has {} cells, the limit is {}",
                width,
                height,
                cells,
                Self::MAX_CELLS
            )));
        }
        Ok(())
    }

    /// An all-dead grid.
    pub fn new(width: u32, height: u32) -> Self {
        DenseGrid {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// A grid with the given cells alive. Coordinates outside the bounds are dropped.
    pub fn from_cells<I: IntoIterator<Item = Cell>>(width: u32, height: u32, cells: I) -> Self {
        let mut grid = DenseGrid::new(width, height);
        for cell in cells {
            if let Some(i) = grid.index(cell) {
                grid.cells[i] = true;
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major index of an in-range cell.
    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width as i64 || cell.y >= self.height as i64 {
            return None;
        }
        Some(cell.y as usize * self.width as usize + cell.x as usize)
    }

    fn checked_index(&self, cell: Cell) -> LifeResult<usize> {
        self.index(cell).ok_or(LifeError::IndexOutOfBounds {
            x: cell.x,
            y: cell.y,
            width: self.width,
            height: self.height,
        })
    }
}

impl CellStore for DenseGrid {
    fn is_alive(&self, cell: Cell) -> LifeResult<bool> {
        Ok(self.cells[self.checked_index(cell)?])
    }

    #[inline]
    fn contains(&self, cell: Cell) -> bool {
        self.index(cell).map_or(false, |i| self.cells[i])
    }

    fn toggle(&self, cell: Cell) -> LifeResult<Self> {
        let i = self.checked_index(cell)?;
        let mut next = self.clone();
        next.cells[i] = !next.cells[i];
        Ok(next)
    }

    fn live_cells(&self) -> Box<dyn Iterator<Item = Cell> + '_> {
        let width = self.width.max(1) as usize;
        Box::new(
            self.cells
                .iter()
                .enumerate()
                .filter(|(_, &alive)| alive)
                .map(move |(i, _)| Cell::new((i % width) as i64, (i / width) as i64)),
        )
    }

    fn population(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    fn randomized<R: Rng + ?Sized>(
        &self,
        density: &Density,
        region: Option<Region>,
        mode: RandomizeMode,
        rng: &mut R,
    ) -> Self {
        let full = Region::of_size(self.width, self.height);
        let region = region.map_or(full, |r| r.intersect(&full));
        let mut next = DenseGrid::new(self.width, self.height);
        for cell in region.cells() {
            if mode.roll(density, rng) {
                if let Some(i) = next.index(cell) {
                    next.cells[i] = true;
                }
            }
        }
        next
    }

    fn cleared(&self, region: Option<Region>) -> Self {
        let Some(region) = region else {
            return DenseGrid::new(self.width, self.height);
        };
        let mut next = self.clone();
        for cell in region.intersect(&Region::of_size(self.width, self.height)).cells() {
            if let Some(i) = next.index(cell) {
                next.cells[i] = false;
            }
        }
        next
    }

    fn resized(&self, width: u32, height: u32) -> Self {
        let mut next = DenseGrid::new(width, height);
        let keep_w = self.width.min(width) as usize;
        let keep_h = self.height.min(height) as usize;
        for y in 0..keep_h {
            let src = y * self.width as usize;
            let dst = y * width as usize;
            next.cells[dst..dst + keep_w].copy_from_slice(&self.cells[src..src + keep_w]);
        }
        next
    }

    fn bounds(&self) -> Option<Region> {
        Some(Region::of_size(self.width, self.height))
    }

    fn candidates(&self) -> Vec<Cell> {
        Region::of_size(self.width, self.height).cells().collect()
    }

    fn with_live<I: IntoIterator<Item = Cell>>(&self, cells: I) -> Self {
        DenseGrid::from_cells(self.width, self.height, cells)
    }
}
