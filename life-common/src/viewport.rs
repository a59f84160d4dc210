use crate::coords::{Cell, Region};
use crate::error::{LifeError, LifeResult};

/// Maps between pixel space and logical cell space.
///
/// A cell `(x, y)` is drawn with its top-left corner at
/// `(x * cell_size + pan_x, y * cell_size + pan_y)`. Hit-testing is the exact
/// inverse of that formula, so a click always lands on the cell drawn under it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pan_x: f64,
    pan_y: f64,
    cell_size: f64,
    width_px: u32,
    height_px: u32,
}

/// A cell's on-screen square.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

fn validate_cell_size(cell_size: f64) -> LifeResult<f64> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(cell_size)
    } else {
        Err(LifeError::invalid(format!(
            "cell_pixel_size must be a positive number, got {}",
            cell_size
        )))
    }
}

/// Most cells a viewport may put on screen at once. Keeps the draw pass, sparse
/// randomize and a viewport-sized dense grid bounded.
pub const MAX_VISIBLE_CELLS: u64 = 1 << 24;

/// Checks the cell size and that the view it implies stays within [`MAX_VISIBLE_CELLS`].
fn validate_geometry(cell_size: f64, width_px: u32, height_px: u32) -> LifeResult<f64> {
    let cell_size = validate_cell_size(cell_size)?;
    // One extra column and row for cells cut by a fractional pan.
    let cols = (width_px as f64 / cell_size).ceil() + 1.0;
    let rows = (height_px as f64 / cell_size).ceil() + 1.0;
    if cols * rows > MAX_VISIBLE_CELLS as f64 {
        return Err(LifeError::invalid(format!(
            "cell_pixel_size {} on a {}x{} px view shows more than {} cells",
            cell_size, width_px, height_px, MAX_VISIBLE_CELLS
        )));
    }
    Ok(cell_size)
}

#[inline(always)]
fn axis_to_pixel(c: i64, pan: f64, size: f64) -> f64 {
    c as f64 * size + pan
}

fn axis_to_cell(p: f64, pan: f64, size: f64) -> i64 {
    let estimate = ((p - pan) / size).floor();
    if !estimate.is_finite() {
        return estimate as i64;
    }
    let mut c = estimate as i64;
    // Rounding in the division can land one cell off the draw formula.
    for _ in 0..2 {
        if axis_to_pixel(c.saturating_add(1), pan, size) <= p {
            c = c.saturating_add(1);
        } else if axis_to_pixel(c, pan, size) > p {
            c = c.saturating_sub(1);
        } else {
            break;
        }
    }
    c
}

impl Viewport {
    pub fn new(cell_size: f64, width_px: u32, height_px: u32) -> LifeResult<Self> {
        Ok(Viewport {
            pan_x: 0.0,
            pan_y: 0.0,
            cell_size: validate_geometry(cell_size, width_px, height_px)?,
            width_px,
            height_px,
        })
    }

    pub fn pan_offset(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn size_px(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    /// Top-left pixel corner of `cell`.
    pub fn cell_to_pixel(&self, cell: Cell) -> (f64, f64) {
        (
            axis_to_pixel(cell.x, self.pan_x, self.cell_size),
            axis_to_pixel(cell.y, self.pan_y, self.cell_size),
        )
    }

    pub fn cell_rect(&self, cell: Cell) -> PixelRect {
        let (x, y) = self.cell_to_pixel(cell);
        PixelRect { x, y, size: self.cell_size }
    }

    /// Hit-test: the cell whose square contains the pixel.
    pub fn pixel_to_cell(&self, px: f64, py: f64) -> Cell {
        Cell::new(
            axis_to_cell(px, self.pan_x, self.cell_size),
            axis_to_cell(py, self.pan_y, self.cell_size),
        )
    }

    /// Cells at least partially on screen, with exclusive ends.
    pub fn visible_range(&self) -> Region {
        let s = self.cell_size;
        Region::new(
            (-self.pan_x / s).floor() as i64,
            (-self.pan_y / s).floor() as i64,
            ((self.width_px as f64 - self.pan_x) / s).ceil() as i64,
            ((self.height_px as f64 - self.pan_y) / s).ceil() as i64,
        )
    }

    pub fn visible_cells(&self) -> impl Iterator<Item = Cell> {
        self.visible_range().cells()
    }

    /// Accumulates a drag delta. The plane has no edges, so pan is unbounded.
    pub fn panned(&self, dx: f64, dy: f64) -> Self {
        Viewport {
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
            ..*self
        }
    }

    /// Places the given cell-space point at the centre of the screen.
    pub fn centered_on(&self, cx: f64, cy: f64) -> Self {
        Viewport {
            pan_x: self.width_px as f64 / 2.0 - cx * self.cell_size,
            pan_y: self.height_px as f64 / 2.0 - cy * self.cell_size,
            ..*self
        }
    }

    pub fn resized(&self, width_px: u32, height_px: u32) -> LifeResult<Self> {
        validate_geometry(self.cell_size, width_px, height_px)?;
        Ok(Viewport {
            width_px,
            height_px,
            ..*self
        })
    }

    pub fn with_cell_size(&self, cell_size: f64) -> LifeResult<Self> {
        Ok(Viewport {
            cell_size: validate_geometry(cell_size, self.width_px, self.height_px)?,
            ..*self
        })
    }

    /// Scales the cell size by `factor`, keeping the point under `(px, py)` fixed.
    pub fn zoomed_at(&self, factor: f64, px: f64, py: f64) -> LifeResult<Self> {
        let new_size = validate_geometry(self.cell_size * factor, self.width_px, self.height_px)?;
        let wx = (px - self.pan_x) / self.cell_size;
        let wy = (py - self.pan_y) / self.cell_size;
        Ok(Viewport {
            pan_x: px - wx * new_size,
            pan_y: py - wy * new_size,
            cell_size: new_size,
            ..*self
        })
    }

    /// How many whole cells fit the container: the size a dense grid should have.
    /// Every viewport is held to [`MAX_VISIBLE_CELLS`], so both counts fit a `u32`.
    pub fn grid_dimensions(&self) -> (u32, u32) {
        (
            (self.width_px as f64 / self.cell_size).floor() as u32,
            (self.height_px as f64 / self.cell_size).floor() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_cell_size() {
        assert!(matches!(Viewport::new(0.0, 100, 100), Err(LifeError::InvalidConfig(_))));
        assert!(Viewport::new(-4.0, 100, 100).is_err());
        assert!(Viewport::new(f64::NAN, 100, 100).is_err());
        let vp = Viewport::new(10.0, 100, 100).unwrap();
        assert!(vp.with_cell_size(0.0).is_err());
        assert!(vp.zoomed_at(0.0, 5.0, 5.0).is_err());
    }

    #[test]
    fn views_with_too_many_cells_are_rejected() {
        assert!(matches!(Viewport::new(1e-9, 800, 600), Err(LifeError::InvalidConfig(_))));

        let vp = Viewport::new(10.0, 800, 600).unwrap();
        assert!(vp.with_cell_size(1e-9).is_err());
        assert!(vp.resized(u32::MAX, u32::MAX).is_err());

        // Zooming out keeps working until the next step would exceed the budget.
        let mut zoomed = vp;
        while let Ok(next) = zoomed.zoomed_at(0.5, 400.0, 300.0) {
            zoomed = next;
        }
        let (w, h) = zoomed.grid_dimensions();
        assert!((w as u64) * (h as u64) <= MAX_VISIBLE_CELLS);
        assert!(zoomed.cell_size() > 0.0);
    }

    #[test]
    fn pixel_to_cell_round_trips_draw_position() {
        let pans = [0.0, 0.1, -0.1, 7.3, -1234.567, 1e6 + 0.3];
        let sizes = [0.3, 1.0, 2.5, 7.0, 13.37, 100.0];
        for &pan in &pans {
            for &size in &sizes {
                let vp = Viewport::new(size, 640, 480).unwrap().panned(pan, -pan / 3.0);
                for x in -60..60 {
                    let cell = Cell::new(x * 7 - 3, 11 - x * 5);
                    let (px, py) = vp.cell_to_pixel(cell);
                    assert_eq!(vp.pixel_to_cell(px, py), cell, "pan {} size {}", pan, size);
                }
            }
        }
    }

    #[test]
    fn hit_test_uses_floor_semantics() {
        let vp = Viewport::new(10.0, 100, 100).unwrap().panned(5.0, 0.0);
        assert_eq!(vp.pixel_to_cell(5.0, 0.0), Cell::new(0, 0));
        assert_eq!(vp.pixel_to_cell(14.99, 9.99), Cell::new(0, 0));
        assert_eq!(vp.pixel_to_cell(15.0, 10.0), Cell::new(1, 1));
        assert_eq!(vp.pixel_to_cell(4.99, -0.01), Cell::new(-1, -1));
    }

    #[test]
    fn visible_range_covers_partial_cells() {
        let vp = Viewport::new(10.0, 95, 40).unwrap();
        assert_eq!(vp.visible_range(), Region::new(0, 0, 10, 4));
        let shifted = vp.panned(-15.0, 25.0);
        assert_eq!(shifted.visible_range(), Region::new(1, -3, 11, 2));
    }

    #[test]
    fn pan_does_not_change_grid_dimensions() {
        let vp = Viewport::new(8.0, 100, 50).unwrap();
        let moved = vp.panned(1234.5, -99.0).panned(-3.0, 4.0);
        assert_eq!(moved.grid_dimensions(), (12, 6));
        assert_eq!(moved.pan_offset(), (1231.5, -95.0));
    }

    #[test]
    fn cell_size_drives_grid_dimensions() {
        let vp = Viewport::new(10.0, 200, 100).unwrap();
        assert_eq!(vp.grid_dimensions(), (20, 10));
        assert_eq!(vp.with_cell_size(25.0).unwrap().grid_dimensions(), (8, 4));
        assert_eq!(vp.resized(55, 9).unwrap().grid_dimensions(), (5, 0));
    }

    #[test]
    fn zoom_keeps_anchor_point_fixed() {
        let vp = Viewport::new(10.0, 200, 200).unwrap().panned(3.0, -7.0);
        let anchor = vp.pixel_to_cell(123.0, 77.0);
        let zoomed = vp.zoomed_at(2.0, 123.0, 77.0).unwrap();
        assert_eq!(zoomed.cell_size(), 20.0);
        assert_eq!(zoomed.pixel_to_cell(123.0, 77.0), anchor);
    }

    #[test]
    fn centering_puts_point_mid_screen() {
        let vp = Viewport::new(4.0, 100, 60).unwrap().centered_on(10.5, -2.5);
        assert_eq!(vp.pixel_to_cell(50.0, 30.0), Cell::new(10, -3));
    }
}
