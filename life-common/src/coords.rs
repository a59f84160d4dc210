use serde::{Deserialize, Serialize};

/// A logical cell coordinate. The plane is unbounded; dense grids only
/// accept coordinates inside their own bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub const fn new(x: i64, y: i64) -> Self {
        Cell { x, y }
    }

    /// This cell shifted by `(dx, dy)`, or `None` past the edge of the `i64` plane.
    pub fn checked_offset(self, dx: i64, dy: i64) -> Option<Self> {
        Some(Cell {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }
}

impl From<(i64, i64)> for Cell {
    fn from((x, y): (i64, i64)) -> Self {
        Cell { x, y }
    }
}

/// A half-open rectangle of cells: `[x0, x1) × [y0, y1)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl Region {
    pub const fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Region { x0, y0, x1, y1 }
    }

    /// The region `[0, width) × [0, height)` covered by a dense grid.
    pub fn of_size(width: u32, height: u32) -> Self {
        Region::new(0, 0, width as i64, height as i64)
    }

    pub fn width(&self) -> i64 {
        self.x1.saturating_sub(self.x0).max(0)
    }

    pub fn height(&self) -> i64 {
        self.y1.saturating_sub(self.y0).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.x0 && cell.x < self.x1 && cell.y >= self.y0 && cell.y < self.y1
    }

    /// Overlap of two regions; empty regions collapse to a zero-sized one.
    pub fn intersect(&self, other: &Region) -> Region {
        let r = Region {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        if r.is_empty() {
            Region::new(r.x0, r.y0, r.x0, r.y0)
        } else {
            r
        }
    }

    /// Row-major iterator over every cell in the region.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (x0, x1) = (self.x0, self.x1);
        (self.y0..self.y1).flat_map(move |y| (x0..x1).map(move |x| Cell::new(x, y)))
    }

    /// Smallest region holding every cell, or `None` when there are none.
    /// The exclusive end saturates at `i64::MAX`.
    pub fn bounding<I: IntoIterator<Item = Cell>>(cells: I) -> Option<Region> {
        cells.into_iter().fold(None, |acc, c| {
            Some(match acc {
                None => Region::new(c.x, c.y, c.x.saturating_add(1), c.y.saturating_add(1)),
                Some(r) => Region::new(
                    r.x0.min(c.x),
                    r.y0.min(c.y),
                    r.x1.max(c.x.saturating_add(1)),
                    r.y1.max(c.y.saturating_add(1)),
                ),
            })
        })
    }
}
