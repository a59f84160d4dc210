//! Core of the Game of Life: cell stores, the stepping rule, the pixel/cell
//! viewport transform, the simulation clock, and the session interface the
//! UI glue calls into.

pub mod clock;
pub mod config;
pub mod coords;
pub mod dense;
pub mod engine;
pub mod error;
pub mod input;
pub mod patterns;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod sparse;
pub mod store;
pub mod viewport;

// Re-export key types for easier use by dependent crates
pub use clock::{ClockState, SimulationClock};
pub use config::{
    GameConfig, GridConfig, InitialConditions, OutputConfig, TimingConfig, ViewportConfig,
};
pub use coords::{Cell, Region};
pub use dense::DenseGrid;
pub use engine::{step, step_n};
pub use error::{LifeError, LifeResult};
pub use input::{InputEvent, ScheduledEvent};
pub use patterns::{Pattern, PATTERNS};
pub use render::{draw_cells, CellPainter, VisibleCell};
pub use session::Session;
pub use snapshot::Snapshot;
pub use sparse::SparseField;
pub use store::{Board, CellStore, Density, RandomizeMode, StorageKind};
pub use viewport::{PixelRect, Viewport};
