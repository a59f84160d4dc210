use anyhow::Result;
use life_common::GameConfig;
use log::{debug, info};
use std::time::Instant;

mod output;
mod runner;

use runner::Runner;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Life Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = GameConfig::load(&config_path)?;
    debug!("Configuration: {:#?}", config);

    info!("Using {} Rayon threads for stepping.", rayon::current_num_threads());

    // --- Initialize Session ---
    let mut runner = Runner::new(config)?;
    info!(
        "Session initialized with {} live cells ({:?} storage).",
        runner.session().population(),
        runner.session().board().kind()
    );

    // --- Simulation Loop ---
    let start_time = Instant::now();
    runner.run()?;
    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished at generation {} in {:.3} seconds. {} live cells remain.",
        runner.session().generation(),
        total_duration.as_secs_f64(),
        runner.session().population()
    );

    // --- Save Recorded Data ---
    let output = &runner.config().output;
    if output.save_stats {
        output::save_snapshots(output, runner.get_recorded_snapshots())?;
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if output.save_final_cells {
        output::save_final_cells(output, runner.session().board())?;
    } else {
        info!("Skipping saving final cells as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
