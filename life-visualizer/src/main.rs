use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Builder;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use life_common::{
    draw_cells, Board, CellPainter, DenseGrid, Snapshot, SparseField, Viewport, VisibleCell,
};
use log::{info, warn, LevelFilter};
use palette::Srgb;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snapshot file written by life-engine (.bin, .json or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory that receives one PNG per snapshot
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,

    /// Frame width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Frame height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Edge length of one cell in pixels
    #[arg(long, default_value_t = 20.0)]
    cell_size: f64,

    /// Horizontal pan offset in pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_x: f64,

    /// Vertical pan offset in pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_y: f64,

    /// Re-centre every frame on the live population
    #[arg(long)]
    follow: bool,

    /// Color of live cells (name or #rrggbb)
    #[arg(long, default_value = "black")]
    alive_color: String,

    /// Color of dead cells (name or #rrggbb)
    #[arg(long, default_value = "white")]
    dead_color: String,

    /// Color of the cell outlines (name or #rrggbb)
    #[arg(long, default_value = "black")]
    grid_color: String,

    /// Color outside a dense grid (name or #rrggbb)
    #[arg(long, default_value = "white")]
    background: String,

    /// Skip the cell outlines
    #[arg(long)]
    no_grid_lines: bool,

    /// Also write an animated GIF to this path
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Time each GIF frame stays on screen, in milliseconds
    #[arg(long, default_value_t = 100)]
    gif_delay_ms: u32,
}

// Color definitions for named colors (RGBA format)
const COLOR_MAP: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("gray", [128, 128, 128, 255]),
    ("lightgray", [211, 211, 211, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 255, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
];

/// Parse a color name or `#rrggbb` hex string to RGBA.
fn parse_color(color: &str) -> Rgba<u8> {
    for &(name, rgba) in COLOR_MAP {
        if name.eq_ignore_ascii_case(color) {
            return Rgba(rgba);
        }
    }
    match color.parse::<Srgb<u8>>() {
        Ok(rgb) => Rgba([rgb.red, rgb.green, rgb.blue, 255]),
        Err(_) => {
            warn!("Color '{}' not recognized, using black.", color);
            Rgba([0, 0, 0, 255])
        }
    }
}

/// Colors for one render pass.
#[derive(Debug, Clone, Copy)]
struct Style {
    alive: Rgba<u8>,
    dead: Rgba<u8>,
    grid: Option<Rgba<u8>>,
    background: Rgba<u8>,
}

/// Fills each visible cell, then outlines it, the way a canvas draw pass does.
struct RasterPainter<'a> {
    image: &'a mut RgbaImage,
    style: Style,
}

impl CellPainter for RasterPainter<'_> {
    fn set_cell_style(&mut self, cell: &VisibleCell) {
        let x = cell.rect.x.floor();
        let y = cell.rect.y.floor();
        let size = ((cell.rect.x + cell.rect.size).ceil() - x).max(1.0) as u32;
        let rect = Rect::at(x as i32, y as i32).of_size(size, size);
        let fill = if cell.alive { self.style.alive } else { self.style.dead };
        draw_filled_rect_mut(self.image, rect, fill);
        if let Some(grid) = self.style.grid {
            draw_hollow_rect_mut(self.image, rect, grid);
        }
    }
}

/// Rebuilds the store a snapshot was taken from. Snapshots recorded without
/// cells come back as an empty field.
fn board_from_snapshot(snapshot: &Snapshot) -> Board {
    let cells = snapshot.live_cells.iter().flatten().copied();
    match snapshot.grid_bounds {
        Some(bounds) if bounds.x0 == 0 && bounds.y0 == 0 => Board::Dense(DenseGrid::from_cells(
            bounds.width() as u32,
            bounds.height() as u32,
            cells,
        )),
        _ => Board::Sparse(SparseField::from_cells(cells)),
    }
}

fn frame_viewport(base: &Viewport, snapshot: &Snapshot, follow: bool) -> Viewport {
    match (follow, snapshot.bounding_box) {
        (true, Some(b)) => base.centered_on(
            (b.x0 as f64 + b.x1 as f64) / 2.0,
            (b.y0 as f64 + b.y1 as f64) / 2.0,
        ),
        _ => *base,
    }
}

fn render_frame(snapshot: &Snapshot, viewport: &Viewport, style: Style) -> RgbaImage {
    let (width, height) = viewport.size_px();
    let mut image = RgbaImage::from_pixel(width, height, style.background);
    let board = board_from_snapshot(snapshot);
    let mut painter = RasterPainter { image: &mut image, style };
    draw_cells(&board, viewport, &mut painter);
    image
}

/// Reads snapshots in the format implied by the file extension.
fn read_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    match path.extension().and_then(|e| e.to_str()) {
        Some("bin") => {
            // Count is a u32 to match how the engine writes it
            let count: u32 = bincode::deserialize_from(&mut reader)
                .context("Failed to read snapshot count from header")?;
            let mut snapshots = Vec::with_capacity(count as usize);
            for i in 0..count {
                let snapshot: Snapshot = bincode::deserialize_from(&mut reader)
                    .with_context(|| format!("Error deserializing snapshot {}", i))?;
                snapshots.push(snapshot);
            }
            Ok(snapshots)
        }
        Some("json") => serde_json::from_reader(reader).context("Failed to parse JSON snapshots"),
        Some("msgpack") => {
            rmp_serde::from_read(reader).context("Failed to parse MessagePack snapshots")
        }
        other => bail!("Unsupported snapshot file extension: {:?}", other),
    }
}

fn write_gif(path: &Path, frames: &[RgbaImage], delay_ms: u32) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create GIF file {}", path.display()))?;
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite)?;
    for image in frames {
        let delay = Delay::from_numer_denom_ms(delay_ms, 1);
        let frame = image::Frame::from_parts(image.clone(), 0, 0, delay);
        encoder.encode_frame(frame).context("Failed to encode GIF frame")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    Builder::from_default_env().filter(None, LevelFilter::Info).init();

    info!("Starting Life Visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Frame dimensions: {}x{} px, {} px cells", args.width, args.height, args.cell_size);

    let base_viewport =
        Viewport::new(args.cell_size, args.width, args.height)?.panned(args.pan_x, args.pan_y);
    let style = Style {
        alive: parse_color(&args.alive_color),
        dead: parse_color(&args.dead_color),
        grid: (!args.no_grid_lines).then(|| parse_color(&args.grid_color)),
        background: parse_color(&args.background),
    };

    let snapshots = read_snapshots(&args.input)?;
    info!("Found {} snapshots in the file", snapshots.len());
    if snapshots.is_empty() {
        warn!("Input file contains no snapshots. Exiting.");
        return Ok(());
    }
    let without_cells = snapshots.iter().filter(|s| s.live_cells.is_none()).count();
    if without_cells > 0 {
        warn!(
            "{} snapshots were recorded without live cells and will render empty. \
             Set save_live_cells_in_snapshot = true in the engine config.",
            without_cells
        );
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;

    let progress_bar = ProgressBar::new(snapshots.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]",
            )?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();
    let frames: Vec<RgbaImage> = snapshots
        .par_iter()
        .progress_with(progress_bar.clone())
        .map(|snapshot| {
            let viewport = frame_viewport(&base_viewport, snapshot, args.follow);
            let image = render_frame(snapshot, &viewport, style);
            let path = args.output.join(format!("frame_{:06}.png", snapshot.generation));
            image
                .save(&path)
                .with_context(|| format!("Failed to write frame {}", path.display()))?;
            Ok::<_, anyhow::Error>(image)
        })
        .collect::<Result<_>>()?;
    progress_bar.finish_with_message(format!("Rendered {} frames", frames.len()));

    if let Some(gif_path) = &args.gif {
        info!("Encoding GIF to {}...", gif_path.display());
        write_gif(gif_path, &frames, args.gif_delay_ms)?;
    }

    let duration = start_time.elapsed();
    info!(
        "Rendering completed in {:.2?} ({:.1} frames per second)",
        duration,
        frames.len() as f64 / duration.as_secs_f64()
    );
    info!("Frames saved to: {}", args.output.display());
    Ok(())
}
