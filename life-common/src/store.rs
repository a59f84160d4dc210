use crate::coords::{Cell, Region};
use crate::dense::DenseGrid;
use crate::error::{LifeError, LifeResult};
use crate::sparse::SparseField;
use rand::Rng;
use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};

/// The authoritative set of live cells.
///
/// Every operation that changes the population takes `&self` and returns a
/// new store, so a snapshot handed to a reader is never mutated underneath it.
pub trait CellStore: Clone + Send + Sync {
    /// Checked lookup. Dense grids report `IndexOutOfBounds` outside their
    /// bounds; sparse fields answer `false` for any absent coordinate.
    fn is_alive(&self, cell: Cell) -> LifeResult<bool>;

    /// Total lookup: anything outside the store's bounds is dead.
    fn contains(&self, cell: Cell) -> bool;

    /// A copy of this store with one cell flipped.
    fn toggle(&self, cell: Cell) -> LifeResult<Self>;

    /// Lazy iterator over live cells. Each call starts a fresh pass.
    fn live_cells(&self) -> Box<dyn Iterator<Item = Cell> + '_>;

    fn population(&self) -> usize;

    /// A store of the same kind where each cell of `region` is alive at
    /// random and every other cell is dead.
    fn randomized<R: Rng + ?Sized>(
        &self,
        density: &Density,
        region: Option<Region>,
        mode: RandomizeMode,
        rng: &mut R,
    ) -> Self;

    /// Kills every cell inside `region`, or every cell when `None`.
    fn cleared(&self, region: Option<Region>) -> Self;

    /// Reflows a bounded store to new dimensions, keeping the overlap.
    fn resized(&self, width: u32, height: u32) -> Self;

    /// The addressable rectangle, `None` for an unbounded store.
    fn bounds(&self) -> Option<Region>;

    /// Cells whose next state has to be evaluated during a step.
    fn candidates(&self) -> Vec<Cell>;

    /// A store of the same kind and bounds holding exactly `cells`.
    fn with_live<I: IntoIterator<Item = Cell>>(&self, cells: I) -> Self;

    fn bounding_box(&self) -> Option<Region> {
        Region::bounding(self.live_cells())
    }
}

/// How `randomized` decides whether a cell starts alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomizeMode {
    /// One draw per cell: alive with probability `density`.
    #[default]
    Single,
    /// Two chained draws per cell: alive with probability `density²`.
    /// Reproduces the behaviour of the earliest grid generator.
    Compound,
}

impl RandomizeMode {
    pub fn roll<R: Rng + ?Sized>(self, density: &Density, rng: &mut R) -> bool {
        match self {
            RandomizeMode::Single => rng.sample(density.dist),
            RandomizeMode::Compound => rng.sample(density.dist) && rng.sample(density.dist),
        }
    }
}

/// A validated initial-live probability in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Density {
    p: f64,
    dist: Bernoulli,
}

impl Density {
    pub fn new(p: f64) -> LifeResult<Self> {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(LifeError::invalid(format!(
                "initial_live_density must be within [0, 1], got {}",
                p
            )));
        }
        let dist = Bernoulli::new(p).map_err(|e| LifeError::invalid(e.to_string()))?;
        Ok(Density { p, dist })
    }

    pub fn value(&self) -> f64 {
        self.p
    }
}

/// Which store implementation a session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Dense,
    Sparse,
}

/// A cell store selected by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Board {
    Dense(DenseGrid),
    Sparse(SparseField),
}

impl Board {
    /// An empty board. `width`/`height` only matter for dense storage.
    pub fn empty(kind: StorageKind, width: u32, height: u32) -> Self {
        match kind {
            StorageKind::Dense => Board::Dense(DenseGrid::new(width, height)),
            StorageKind::Sparse => Board::Sparse(SparseField::new()),
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            Board::Dense(_) => StorageKind::Dense,
            Board::Sparse(_) => StorageKind::Sparse,
        }
    }
}

impl CellStore for Board {
    fn is_alive(&self, cell: Cell) -> LifeResult<bool> {
        match self {
            Board::Dense(g) => g.is_alive(cell),
            Board::Sparse(f) => f.is_alive(cell),
        }
    }

    fn contains(&self, cell: Cell) -> bool {
        match self {
            Board::Dense(g) => g.contains(cell),
            Board::Sparse(f) => f.contains(cell),
        }
    }

    fn toggle(&self, cell: Cell) -> LifeResult<Self> {
        Ok(match self {
            Board::Dense(g) => Board::Dense(g.toggle(cell)?),
            Board::Sparse(f) => Board::Sparse(f.toggle(cell)?),
        })
    }

    fn live_cells(&self) -> Box<dyn Iterator<Item = Cell> + '_> {
        match self {
            Board::Dense(g) => g.live_cells(),
            Board::Sparse(f) => f.live_cells(),
        }
    }

    fn population(&self) -> usize {
        match self {
            Board::Dense(g) => g.population(),
            Board::Sparse(f) => f.population(),
        }
    }

    fn randomized<R: Rng + ?Sized>(
        &self,
        density: &Density,
        region: Option<Region>,
        mode: RandomizeMode,
        rng: &mut R,
    ) -> Self {
        match self {
            Board::Dense(g) => Board::Dense(g.randomized(density, region, mode, rng)),
            Board::Sparse(f) => Board::Sparse(f.randomized(density, region, mode, rng)),
        }
    }

    fn cleared(&self, region: Option<Region>) -> Self {
        match self {
            Board::Dense(g) => Board::Dense(g.cleared(region)),
            Board::Sparse(f) => Board::Sparse(f.cleared(region)),
        }
    }

    fn resized(&self, width: u32, height: u32) -> Self {
        match self {
            Board::Dense(g) => Board::Dense(g.resized(width, height)),
            Board::Sparse(f) => Board::Sparse(f.resized(width, height)),
        }
    }

    fn bounds(&self) -> Option<Region> {
        match self {
            Board::Dense(g) => g.bounds(),
            Board::Sparse(f) => f.bounds(),
        }
    }

    fn candidates(&self) -> Vec<Cell> {
        match self {
            Board::Dense(g) => g.candidates(),
            Board::Sparse(f) => f.candidates(),
        }
    }

    fn with_live<I: IntoIterator<Item = Cell>>(&self, cells: I) -> Self {
        match self {
            Board::Dense(g) => Board::Dense(g.with_live(cells)),
            Board::Sparse(f) => Board::Sparse(f.with_live(cells)),
        }
    }
}
