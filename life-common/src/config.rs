use crate::clock::SimulationClock;
use crate::dense::DenseGrid;
use crate::error::{LifeError, LifeResult};
use crate::input::ScheduledEvent;
use crate::patterns::Pattern;
use crate::store::{Density, RandomizeMode, StorageKind};
use crate::viewport::Viewport;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Which store to run on and, for dense storage, its size in cells
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GridConfig {
    #[serde(default)]
    pub storage: StorageKind,
    /// Dense only. When absent the size follows the viewport.
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

// How the first generation is populated
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    #[serde(default = "default_randomize")]
    pub randomize: bool,
    #[serde(default = "default_live_density")]
    pub live_density: f64,
    #[serde(default)]
    pub randomize_mode: RandomizeMode,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Named pattern stamped after the optional randomization.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub pattern_origin: Option<(i64, i64)>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ViewportConfig {
    #[serde(default = "default_cell_pixel_size")]
    pub cell_pixel_size: f64,
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    #[serde(default)]
    pub pan_x: f64,
    #[serde(default)]
    pub pan_y: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_simulation_delay_ms")]
    pub simulation_delay_ms: i64,
    #[serde(default = "default_total_generations")]
    pub total_generations: u64,
    #[serde(default = "default_record_interval")]
    pub record_interval_generations: u64,
    #[serde(default = "default_start_running")]
    pub start_running: bool,
    /// Sleep between ticks instead of advancing a virtual clock.
    #[serde(default)]
    pub realtime: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_stats: bool,
    #[serde(default)]
    pub save_final_cells: bool,
    #[serde(default = "default_true")]
    pub save_live_cells_in_snapshot: bool,
    pub format: Option<String>, // "json", "bincode", "messagepack"
}

/// Top-level `config.toml` layout. Every section is optional.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

impl GameConfig {
    /// Loads and validates the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| {
                anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e)
            })?;
        Self::from_toml_str(&config_str)
            .map_err(|e| {
                anyhow::anyhow!("Failed to load config from '{}': {}", path_ref.display(), e)
            })
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the core cannot run with.
    pub fn validate(&self) -> LifeResult<()> {
        self.initial_viewport()?;
        SimulationClock::new(self.timing.simulation_delay_ms)?;
        Density::new(self.initial_conditions.live_density)?;

        if self.grid.storage == StorageKind::Dense {
            if self.grid.width == Some(0) || self.grid.height == Some(0) {
                return Err(LifeError::invalid(
                    "dense grid width and height must be greater than 0",
                ));
            }
            let (width, height) = self.grid_dimensions()?;
            DenseGrid::check_size(width, height)?;
        }
        if let Some(name) = &self.initial_conditions.pattern {
            if Pattern::find(name).is_none() {
                return Err(LifeError::invalid(format!(
                    "unknown pattern '{}', expected one of: {}",
                    name,
                    Pattern::names().collect::<Vec<_>>().join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn initial_viewport(&self) -> LifeResult<Viewport> {
        let v = &self.viewport;
        Ok(Viewport::new(v.cell_pixel_size, v.width_px, v.height_px)?.panned(v.pan_x, v.pan_y))
    }

    /// Dense grid size: explicit values win, otherwise whatever fits the viewport.
    pub fn grid_dimensions(&self) -> LifeResult<(u32, u32)> {
        let (fit_w, fit_h) = self.initial_viewport()?.grid_dimensions();
        Ok((self.grid.width.unwrap_or(fit_w), self.grid.height.unwrap_or(fit_h)))
    }
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions {
            randomize: default_randomize(),
            live_density: default_live_density(),
            randomize_mode: RandomizeMode::default(),
            seed: None,
            pattern: None,
            pattern_origin: None,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            cell_pixel_size: default_cell_pixel_size(),
            width_px: default_width_px(),
            height_px: default_height_px(),
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            simulation_delay_ms: default_simulation_delay_ms(),
            total_generations: default_total_generations(),
            record_interval_generations: default_record_interval(),
            start_running: default_start_running(),
            realtime: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: default_base_filename(),
            save_stats: true,
            save_final_cells: false,
            save_live_cells_in_snapshot: true,
            format: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_randomize() -> bool {
    true
}

fn default_live_density() -> f64 {
    0.5
}

fn default_cell_pixel_size() -> f64 {
    20.0
}

fn default_width_px() -> u32 {
    800
}

fn default_height_px() -> u32 {
    600
}

fn default_simulation_delay_ms() -> i64 {
    100
}

fn default_total_generations() -> u64 {
    100
}

fn default_record_interval() -> u64 {
    1
}

fn default_start_running() -> bool {
    true
}

fn default_base_filename() -> String {
    "life".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;

    #[test]
    fn empty_file_uses_defaults() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config.grid.storage, StorageKind::Dense);
        assert_eq!(config.timing.simulation_delay_ms, 100);
        assert_eq!(config.grid_dimensions().unwrap(), (40, 30));
        assert!(config.events.is_empty());
    }

    #[test]
    fn full_file_parses() {
        let config = GameConfig::from_toml_str(
            r#"
            [grid]
            storage = "sparse"

            [initial_conditions]
            randomize = false
            live_density = 0.25
            randomize_mode = "compound"
            seed = 42
            pattern = "Glider"
            pattern_origin = [3, -4]

            [viewport]
            cell_pixel_size = 12.5
            width_px = 320
            height_px = 200

            [timing]
            simulation_delay_ms = 50
            total_generations = 12

            [output]
            format = "bincode"

            [[events]]
            at_generation = 3
            event = { type = "pan", dx = 40.0, dy = -8.0 }

            [[events]]
            at_generation = 5
            event = { type = "toggle_running" }
            "#,
        )
        .unwrap();
        assert_eq!(config.grid.storage, StorageKind::Sparse);
        assert_eq!(config.initial_conditions.randomize_mode, RandomizeMode::Compound);
        assert_eq!(config.initial_conditions.pattern_origin, Some((3, -4)));
        assert_eq!(config.output.format.as_deref(), Some("bincode"));
        assert_eq!(config.events.len(), 2);
        assert_eq!(config.events[0].event, InputEvent::Pan { dx: 40.0, dy: -8.0 });
        assert_eq!(config.events[1].event, InputEvent::ToggleRunning);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for bad in [
            "[timing]\nsimulation_delay_ms = 0",
            "[timing]\nsimulation_delay_ms = -5",
            "[viewport]\ncell_pixel_size = 0.0",
            "[viewport]\ncell_pixel_size = -1.0",
            "[initial_conditions]\nlive_density = 1.2",
            "[initial_conditions]\npattern = \"nope\"",
            "[grid]\nwidth = 0",
            "[grid]\nwidth = 100000\nheight = 100000",
            "[viewport]\ncell_pixel_size = 1e-9",
        ] {
            assert!(GameConfig::from_toml_str(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn explicit_dimensions_override_viewport_fit() {
        let config = GameConfig::from_toml_str("[grid]\nwidth = 7").unwrap();
        assert_eq!(config.grid_dimensions().unwrap(), (7, 30));
    }
}
