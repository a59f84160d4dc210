use crate::clock::{ClockState, SimulationClock};
use crate::config::GameConfig;
use crate::coords::{Cell, Region};
use crate::dense::DenseGrid;
use crate::engine;
use crate::error::{LifeError, LifeResult};
use crate::input::InputEvent;
use crate::patterns::Pattern;
use crate::render::{draw_cells, CellPainter};
use crate::store::{Board, CellStore, Density, RandomizeMode, StorageKind};
use crate::viewport::Viewport;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Instant;

/// One running game: the board, the view onto it and the clock driving it.
///
/// All mutation happens through `&mut self` on a single thread. The board is
/// replaced wholesale on every change, so an `Arc` obtained from
/// [`Session::snapshot`] keeps showing the generation it was taken from.
pub struct Session {
    board: Arc<Board>,
    viewport: Viewport,
    clock: SimulationClock,
    density: Density,
    randomize_mode: RandomizeMode,
    rng: StdRng,
}

impl Session {
    pub fn new(config: &GameConfig) -> LifeResult<Self> {
        config.validate()?;
        let init = &config.initial_conditions;
        let (width, height) = config.grid_dimensions()?;

        let rng = match init.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        if init.randomize_mode == RandomizeMode::Compound {
            let p = init.live_density * init.live_density;
            warn!("randomize_mode = \"compound\": cells start alive with probability {:.3}.", p);
        }

        let mut session = Session {
            board: Arc::new(Board::empty(config.grid.storage, width, height)),
            viewport: config.initial_viewport()?,
            clock: SimulationClock::new(config.timing.simulation_delay_ms)?,
            density: Density::new(init.live_density)?,
            randomize_mode: init.randomize_mode,
            rng,
        };

        if init.randomize {
            session.board = Arc::new(session.random_board());
        }
        if let Some(name) = &init.pattern {
            let pattern = find_pattern(name)?;
            let origin = match init.pattern_origin {
                Some(origin) => Cell::from(origin),
                None => session.centered_origin(pattern),
            };
            session.place_pattern(pattern, origin);
        }

        info!(
            "Session ready: {:?} storage, {} live cells, bounds {:?}",
            session.board.kind(),
            session.board.population(),
            session.board.bounds()
        );
        Ok(session)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// A handle on the current generation that stays valid while the session moves on.
    pub fn snapshot(&self) -> Arc<Board> {
        Arc::clone(&self.board)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn generation(&self) -> u64 {
        self.clock.generation()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn population(&self) -> usize {
        self.board.population()
    }

    // --- Cell edits ---

    pub fn on_cell_clicked(&mut self, cell: Cell) -> LifeResult<()> {
        self.board = Arc::new(self.board.toggle(cell)?);
        debug!("Toggled cell ({}, {})", cell.x, cell.y);
        Ok(())
    }

    /// Hit-tests a pointer position and toggles the cell under it.
    pub fn on_pixel_clicked(&mut self, px: f64, py: f64) -> LifeResult<Cell> {
        let cell = self.viewport.pixel_to_cell(px, py);
        self.on_cell_clicked(cell)?;
        Ok(cell)
    }

    /// Stamps a pattern onto the current board. Dense grids drop cells that fall outside.
    pub fn place_pattern(&mut self, pattern: &Pattern, origin: Cell) {
        let cells: Vec<Cell> = self
            .board
            .live_cells()
            .chain(pattern.cells_at(origin))
            .collect();
        self.board = Arc::new(self.board.with_live(cells));
        debug!("Placed pattern '{}' at ({}, {})", pattern.name, origin.x, origin.y);
    }

    /// Empties the board. Resetting always halts the run.
    pub fn clear(&mut self) {
        self.board = Arc::new(self.board.cleared(None));
        self.clock.stop();
        info!("Board cleared at generation {}", self.generation());
    }

    /// Repopulates the board at random. Resetting always halts the run.
    pub fn randomize(&mut self) {
        self.board = Arc::new(self.random_board());
        self.clock.stop();
        info!(
            "Board randomized at generation {}: {} live cells",
            self.generation(),
            self.board.population()
        );
    }

    pub fn on_density_changed(&mut self, density: f64) -> LifeResult<()> {
        self.density = Density::new(density)?;
        debug!("Randomize density set to {}", self.density.value());
        Ok(())
    }

    // --- Geometry ---

    /// Dense grids reflow to the new size keeping the overlap; sparse fields have no size.
    pub fn on_grid_size_changed(&mut self, width: u32, height: u32) -> LifeResult<()> {
        if self.board.kind() == StorageKind::Sparse {
            trace!("Ignoring grid size {}x{} for sparse storage", width, height);
            return Ok(());
        }
        if self.board.bounds() == Some(Region::of_size(width, height)) {
            return Ok(());
        }
        DenseGrid::check_size(width, height)?;
        self.board = Arc::new(self.board.resized(width, height));
        debug!("Dense grid resized to {}x{}", width, height);
        Ok(())
    }

    pub fn on_container_resized(&mut self, width_px: u32, height_px: u32) -> LifeResult<()> {
        let viewport = self.viewport.resized(width_px, height_px)?;
        self.reflow(viewport)
    }

    pub fn on_cell_pixel_size_changed(&mut self, size: f64) -> LifeResult<()> {
        let viewport = self.viewport.with_cell_size(size)?;
        self.reflow(viewport)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport = self.viewport.panned(dx, dy);
    }

    pub fn zoom_at(&mut self, factor: f64, px: f64, py: f64) -> LifeResult<()> {
        let viewport = self.viewport.zoomed_at(factor, px, py)?;
        self.reflow(viewport)
    }

    /// Resizes a dense grid to fit `viewport`, then adopts it. Nothing changes on error.
    fn reflow(&mut self, viewport: Viewport) -> LifeResult<()> {
        let (width, height) = viewport.grid_dimensions();
        self.on_grid_size_changed(width, height)?;
        self.viewport = viewport;
        Ok(())
    }

    // --- Clock ---

    pub fn on_simulation_delay_changed(&mut self, ms: i64) -> LifeResult<()> {
        self.clock.set_delay(ms)
    }

    pub fn toggle_running(&mut self, now: Instant) -> ClockState {
        let state = self.clock.toggle_running(now);
        info!("Simulation {:?} at generation {}", state, self.generation());
        state
    }

    /// Advances exactly one generation, running or not.
    pub fn step_once(&mut self) -> u64 {
        self.board = Arc::new(engine::step(self.board.as_ref()));
        let generation = self.clock.record_generation();
        trace!("Generation {}: {} live cells", generation, self.board.population());
        generation
    }

    /// Runs one generation if the clock is due. Returns whether the board changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.clock.poll(now) {
            self.step_once();
            true
        } else {
            false
        }
    }

    // --- Rendering ---

    /// Hands every on-screen cell to `painter`, once each. Returns the number painted.
    pub fn draw<P: CellPainter + ?Sized>(&self, painter: &mut P) -> usize {
        draw_cells(self.board.as_ref(), &self.viewport, painter)
    }

    // --- Input ---

    /// Applies one already-decoded input event.
    pub fn handle(&mut self, event: &InputEvent, now: Instant) -> LifeResult<()> {
        debug!("Input event: {:?}", event);
        match event {
            InputEvent::Click { px, py } => {
                self.on_pixel_clicked(*px, *py)?;
            }
            InputEvent::ClickCell { x, y } => self.on_cell_clicked(Cell::new(*x, *y))?,
            InputEvent::Pan { dx, dy } => self.pan(*dx, *dy),
            InputEvent::Zoom { factor, px, py } => self.zoom_at(*factor, *px, *py)?,
            InputEvent::Resize { width_px, height_px } => {
                self.on_container_resized(*width_px, *height_px)?
            }
            InputEvent::CellSize { size } => self.on_cell_pixel_size_changed(*size)?,
            InputEvent::Delay { ms } => self.on_simulation_delay_changed(*ms)?,
            InputEvent::Density { value } => self.on_density_changed(*value)?,
            InputEvent::ToggleRunning => {
                self.toggle_running(now);
            }
            InputEvent::Step => {
                self.step_once();
            }
            InputEvent::Clear => self.clear(),
            InputEvent::Randomize => self.randomize(),
            InputEvent::Pattern { name, x, y } => {
                let pattern = find_pattern(name)?;
                self.place_pattern(pattern, Cell::new(*x, *y));
            }
        }
        Ok(())
    }

    fn random_board(&mut self) -> Board {
        // An unbounded field is seeded over what the user can currently see.
        let region = match self.board.kind() {
            StorageKind::Dense => None,
            StorageKind::Sparse => Some(self.viewport.visible_range()),
        };
        self.board
            .randomized(&self.density, region, self.randomize_mode, &mut self.rng)
    }

    fn centered_origin(&self, pattern: &Pattern) -> Cell {
        let area = self
            .board
            .bounds()
            .unwrap_or_else(|| self.viewport.visible_range());
        let extent = pattern.extent();
        Cell::new(
            area.x0.saturating_add((area.width() - extent.width()) / 2),
            area.y0.saturating_add((area.height() - extent.height()) / 2),
        )
    }
}

fn find_pattern(name: &str) -> LifeResult<&'static Pattern> {
    Pattern::find(name).ok_or_else(|| LifeError::invalid(format!("unknown pattern '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::VisibleCell;
    use std::collections::HashSet;
    use std::time::Duration;

    fn session(toml: &str) -> Session {
        Session::new(&GameConfig::from_toml_str(toml).unwrap()).unwrap()
    }

    const EMPTY_DENSE: &str = r#"
        [grid]
        width = 5
        height = 5
        [initial_conditions]
        randomize = false
        seed = 1
        [viewport]
        cell_pixel_size = 10.0
        width_px = 100
        height_px = 80
    "#;

    const EMPTY_SPARSE: &str = r#"
        [grid]
        storage = "sparse"
        [initial_conditions]
        randomize = false
        seed = 1
        [viewport]
        cell_pixel_size = 10.0
        width_px = 100
        height_px = 80
    "#;

    #[test]
    fn cell_click_toggles_and_keeps_old_snapshot() {
        let mut s = session(EMPTY_DENSE);
        let before = s.snapshot();
        s.on_cell_clicked(Cell::new(2, 2)).unwrap();
        assert!(s.board().is_alive(Cell::new(2, 2)).unwrap());
        assert_eq!(before.population(), 0);
        s.on_cell_clicked(Cell::new(2, 2)).unwrap();
        assert_eq!(*s.board(), *before);
    }

    #[test]
    fn dense_out_of_range_click_is_rejected() {
        let mut s = session(EMPTY_DENSE);
        let err = s.on_cell_clicked(Cell::new(5, 0)).unwrap_err();
        assert!(matches!(err, LifeError::IndexOutOfBounds { .. }));
        assert_eq!(s.population(), 0);
    }

    #[test]
    fn pixel_click_hits_cell_under_pointer() {
        let mut s = session(EMPTY_SPARSE);
        s.pan(-25.0, 5.0);
        let cell = s.on_pixel_clicked(0.0, 4.0).unwrap();
        assert_eq!(cell, Cell::new(2, -1));
        assert!(s.board().contains(Cell::new(2, -1)));
    }

    #[test]
    fn tick_steps_only_when_due() {
        let t0 = Instant::now();
        let mut s = session(EMPTY_SPARSE);
        s.place_pattern(Pattern::find("blinker").unwrap(), Cell::new(0, 0));
        assert!(!s.tick(t0 + Duration::from_secs(1)));
        s.toggle_running(t0);
        assert!(!s.tick(t0 + Duration::from_millis(50)));
        assert!(s.tick(t0 + Duration::from_millis(100)));
        assert_eq!(s.generation(), 1);
        let cells: HashSet<Cell> = s.board().live_cells().collect();
        let expected = [Cell::new(1, -1), Cell::new(1, 0), Cell::new(1, 1)];
        assert_eq!(cells, expected.into_iter().collect());
    }

    #[test]
    fn clear_and_randomize_stop_the_clock() {
        let t0 = Instant::now();
        let mut s = session(EMPTY_DENSE);
        s.toggle_running(t0);
        s.randomize();
        assert!(!s.is_running());
        s.toggle_running(t0);
        s.on_cell_clicked(Cell::new(0, 0)).unwrap();
        s.clear();
        assert!(!s.is_running());
        assert_eq!(s.population(), 0);
    }

    #[test]
    fn container_resize_reflows_dense_grid() {
        let mut s = session(EMPTY_DENSE);
        s.on_cell_clicked(Cell::new(1, 1)).unwrap();
        s.on_cell_clicked(Cell::new(4, 4)).unwrap();
        s.on_container_resized(30, 30).unwrap();
        assert_eq!(s.board().bounds(), Some(Region::of_size(3, 3)));
        s.on_container_resized(50, 50).unwrap();
        assert_eq!(s.board().bounds(), Some(Region::of_size(5, 5)));
        let cells: Vec<Cell> = s.board().live_cells().collect();
        assert_eq!(cells, vec![Cell::new(1, 1)]);
    }

    #[test]
    fn pan_keeps_dimensions_and_cell_size_changes_them() {
        let mut s = session(EMPTY_DENSE);
        s.pan(300.0, -120.0);
        assert_eq!(s.board().bounds(), Some(Region::of_size(5, 5)));
        s.on_cell_pixel_size_changed(20.0).unwrap();
        assert_eq!(s.board().bounds(), Some(Region::of_size(5, 4)));
        assert!(s.on_cell_pixel_size_changed(0.0).is_err());
        assert_eq!(s.viewport().cell_size(), 20.0);
    }

    #[test]
    fn oversized_views_are_rejected_and_the_grid_kept() {
        let mut s = session(EMPTY_DENSE);
        s.on_cell_clicked(Cell::new(3, 3)).unwrap();
        let viewport = *s.viewport();
        let board = s.snapshot();

        assert!(matches!(s.on_cell_pixel_size_changed(1e-9), Err(LifeError::InvalidConfig(_))));
        assert!(s.on_container_resized(u32::MAX, u32::MAX).is_err());
        assert!(s.on_grid_size_changed(u32::MAX, u32::MAX).is_err());
        assert_eq!(*s.viewport(), viewport);
        assert_eq!(*s.board(), *board);

        // Zooming out stops at the limit instead of growing the grid without bound.
        let mut zooms = 0;
        while s.zoom_at(0.5, 50.0, 40.0).is_ok() {
            zooms += 1;
            assert!(zooms < 64, "zooming out never hit the limit");
        }
        assert!(zooms > 0);
        assert!(s.board().contains(Cell::new(3, 3)));
    }

    #[test]
    fn clicks_at_the_edge_of_the_plane_step_safely() {
        let mut s = session(EMPTY_SPARSE);
        s.pan(-1e300, 0.0);
        let cell = s.on_pixel_clicked(5.0, 5.0).unwrap();
        assert_eq!(cell.x, i64::MAX);
        s.step_once();
        assert_eq!(s.population(), 0);
        assert_eq!(s.board().bounding_box(), None);
    }

    #[test]
    fn delay_changes_are_validated() {
        let mut s = session(EMPTY_DENSE);
        assert!(s.on_simulation_delay_changed(0).is_err());
        assert!(s.on_simulation_delay_changed(-100).is_err());
        assert_eq!(s.clock().delay(), Duration::from_millis(100));
        s.on_simulation_delay_changed(16).unwrap();
        assert_eq!(s.clock().delay(), Duration::from_millis(16));
    }

    #[test]
    fn draw_visits_each_visible_cell_once() {
        let mut s = session(EMPTY_SPARSE);
        s.on_cell_clicked(Cell::new(3, 2)).unwrap();
        s.pan(-5.0, 0.0);
        let mut seen = Vec::new();
        let painted = s.draw(&mut |v: &VisibleCell| seen.push((v.cell, v.alive, v.rect)));
        // 100x80 px, 10 px cells, shifted by half a cell: 11 columns, 8 rows.
        assert_eq!(painted, 88);
        assert_eq!(seen.len(), 88);
        let unique: HashSet<Cell> = seen.iter().map(|(c, _, _)| *c).collect();
        assert_eq!(unique.len(), 88);
        let alive: Vec<_> = seen.iter().filter(|(_, a, _)| *a).collect();
        assert_eq!(alive.len(), 1);
        assert_eq!(alive[0].0, Cell::new(3, 2));
        assert_eq!((alive[0].2.x, alive[0].2.y), (25.0, 20.0));
    }

    #[test]
    fn dense_draw_is_clipped_to_grid() {
        let mut s = session(EMPTY_DENSE);
        s.pan(-20.0, 0.0);
        let painted = s.draw(&mut |_: &VisibleCell| {});
        // Columns 2..5 of the 5x5 grid, all five rows.
        assert_eq!(painted, 15);
    }

    #[test]
    fn sparse_randomize_fills_visible_range_only() {
        let mut s = session(EMPTY_SPARSE);
        s.on_density_changed(1.0).unwrap();
        s.randomize();
        assert_eq!(s.population(), 80);
        let visible = s.viewport().visible_range();
        assert!(s.board().live_cells().all(|c| visible.contains(c)));
    }

    #[test]
    fn events_drive_the_session() {
        let t0 = Instant::now();
        let mut s = session(EMPTY_SPARSE);
        let events = [
            InputEvent::Pattern { name: "block".into(), x: 0, y: 0 },
            InputEvent::ClickCell { x: 9, y: 9 },
            InputEvent::Step,
            InputEvent::Delay { ms: 5 },
            InputEvent::ToggleRunning,
        ];
        for e in &events {
            s.handle(e, t0).unwrap();
        }
        // The lone cell dies, the block survives.
        assert_eq!(s.population(), 4);
        assert_eq!(s.generation(), 1);
        assert!(s.is_running());
        assert!(s.handle(&InputEvent::Delay { ms: 0 }, t0).is_err());
        assert!(s.handle(&InputEvent::Pattern { name: "unknown".into(), x: 0, y: 0 }, t0).is_err());
    }

    #[test]
    fn pattern_defaults_to_centre_of_grid() {
        let s = session(
            r#"
            [grid]
            width = 9
            height = 9
            [initial_conditions]
            randomize = false
            pattern = "blinker"
            "#,
        );
        let cells: Vec<Cell> = s.board().live_cells().collect();
        assert_eq!(cells, vec![Cell::new(3, 4), Cell::new(4, 4), Cell::new(5, 4)]);
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let toml = "[initial_conditions]\nseed = 99\nlive_density = 0.3";
        assert_eq!(*session(toml).board(), *session(toml).board());
    }
}
