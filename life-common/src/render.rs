use crate::coords::Cell;
use crate::store::CellStore;
use crate::viewport::{PixelRect, Viewport};

/// Everything a renderer needs to paint one on-screen cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisibleCell {
    pub cell: Cell,
    pub alive: bool,
    pub rect: PixelRect,
}

/// Receives one call per visible cell during a draw pass.
///
/// The core decides which cells are visible and where they go; the painter
/// decides how they look.
pub trait CellPainter {
    fn set_cell_style(&mut self, cell: &VisibleCell);
}

impl<F> CellPainter for F
where
    F: FnMut(&VisibleCell),
{
    fn set_cell_style(&mut self, cell: &VisibleCell) {
        self(cell)
    }
}

/// Paints every cell inside the viewport, clipped to the store's bounds when
/// it has any. Returns how many cells were painted.
pub fn draw_cells<S, P>(store: &S, viewport: &Viewport, painter: &mut P) -> usize
where
    S: CellStore,
    P: CellPainter + ?Sized,
{
    let cells: Box<dyn Iterator<Item = Cell>> = match store.bounds() {
        Some(bounds) => Box::new(viewport.visible_range().intersect(&bounds).cells()),
        None => Box::new(viewport.visible_cells()),
    };
    let mut painted = 0;
    for cell in cells {
        painter.set_cell_style(&VisibleCell {
            cell,
            alive: store.contains(cell),
            rect: viewport.cell_rect(cell),
        });
        painted += 1;
    }
    painted
}
