use anyhow::{Context, Result};
use life_common::{CellStore, OutputConfig, Snapshot};
use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// On-disk encodings for recorded snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
    MessagePack,
}

impl SnapshotFormat {
    pub fn from_config(format: Option<&str>) -> Self {
        match format.unwrap_or("json") {
            "json" => SnapshotFormat::Json,
            "bincode" => SnapshotFormat::Bincode,
            "messagepack" => SnapshotFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                SnapshotFormat::Json
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
            SnapshotFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes all snapshots and returns the file they went to.
///
/// The bincode stream is a `u32` count followed by that many snapshots, which
/// is what the visualizer expects.
pub fn save_snapshots(output: &OutputConfig, snapshots: &[Snapshot]) -> Result<PathBuf> {
    let format = SnapshotFormat::from_config(output.format.as_deref());
    let filename = PathBuf::from(format!(
        "{}_snapshots.{}",
        output.base_filename,
        format.extension()
    ));
    let file = File::create(&filename)
        .with_context(|| format!("Error creating snapshot file '{}'", filename.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        SnapshotFormat::Json => {
            serde_json::to_writer(&mut writer, snapshots)
                .context("Error serializing snapshots to JSON")?;
        }
        SnapshotFormat::Bincode => {
            bincode::serialize_into(&mut writer, &(snapshots.len() as u32))
                .context("Error writing snapshot count")?;
            for snapshot in snapshots {
                bincode::serialize_into(&mut writer, snapshot)
                    .context("Error serializing snapshot to bincode")?;
            }
        }
        SnapshotFormat::MessagePack => {
            rmp_serde::encode::write(&mut writer, snapshots)
                .context("Error serializing snapshots to MessagePack")?;
        }
    }
    writer.flush()?;
    info!("{} snapshots saved to {} ({:?} format)", snapshots.len(), filename.display(), format);
    Ok(filename)
}

/// Writes the live cells of the final board as `x,y` rows.
pub fn save_final_cells<S: CellStore>(output: &OutputConfig, store: &S) -> Result<PathBuf> {
    let filename = PathBuf::from(format!("{}_final_cells.csv", output.base_filename));
    let mut writer = csv::Writer::from_path(&filename)
        .with_context(|| format!("Error saving CSV file '{}'", filename.display()))?;
    writer.write_record(["x", "y"])?;

    let mut cells: Vec<_> = store.live_cells().collect();
    cells.sort_unstable();
    for cell in cells {
        writer.write_record(&[cell.x.to_string(), cell.y.to_string()])?;
    }
    writer.flush()?;
    info!("Final live cells saved to {}", filename.display());
    Ok(filename)
}
