use serde::{Deserialize, Serialize};

/// A discrete user action, already translated from raw pointer/keyboard/resize
/// events. Pixel coordinates are relative to the drawing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer click, hit-tested through the viewport.
    Click { px: f64, py: f64 },
    /// Toggle a cell addressed directly.
    ClickCell { x: i64, y: i64 },
    /// Drag delta in pixels.
    Pan { dx: f64, dy: f64 },
    /// Wheel/pinch zoom anchored at a pixel.
    Zoom { factor: f64, px: f64, py: f64 },
    /// Container resize in pixels.
    Resize { width_px: u32, height_px: u32 },
    /// Grid-size slider: new cell size in pixels.
    CellSize { size: f64 },
    /// Speed slider.
    Delay { ms: i64 },
    /// Density slider for the next randomize.
    Density { value: f64 },
    ToggleRunning,
    Step,
    Clear,
    Randomize,
    /// Stamp a named pattern with its top-left corner at `(x, y)`.
    Pattern { name: String, x: i64, y: i64 },
}

/// An event replayed once the session reaches a given generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub at_generation: u64,
    pub event: InputEvent,
}
