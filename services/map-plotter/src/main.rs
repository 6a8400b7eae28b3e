//! Temperature map plotter.
//!
//! Reads temperature and geopotential on pressure levels for a region and
//! writes one chart per level and forecast hour.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use geocoding::StaticMapClient;
use netcdf_parser::{compute_geopot_height, open_dataset, silence_hdf5_errors};
use rayon::prelude::*;
use renderer::text::load_font;
use renderer::{Boundaries, Colormap, RenderError, RenderResult};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wx_common::{Region, WxConfig};

use map_plotter::{read_options, LevelSlice, MapAssets, MapPlotter, LEVELS_HPA};

/// Steps rendered in debug mode.
const DEBUG_STEPS: usize = 2;

#[derive(Parser, Debug)]
#[command(name = "plot-t")]
#[command(about = "Plot temperature and geopotential height on pressure levels")]
struct Args {
    /// Region to plot (de, it or nord)
    #[arg(default_value = "de")]
    projection: Region,

    /// Only render the first two steps of each level, sequentially
    #[arg(long)]
    debug: bool,

    /// Draw a static map tile under the fields (needs MAPBOX_KEY)
    #[arg(long)]
    background: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let started = std::time::Instant::now();
    let region = args.projection;
    info!(region = %region, debug = args.debug, "Starting script to plot t");

    let config = WxConfig::from_env()?;
    silence_hdf5_errors();

    let options = read_options(region);
    let mut dataset = open_dataset(&config.data_folder, &options)
        .with_context(|| format!("reading model output from {}", config.data_folder.display()))?;
    compute_geopot_height(&mut dataset)?;

    let colormap = Colormap::from_rgba_file(&config.colormap_file("temp"))?;
    let assets = MapAssets {
        boundaries: optional(config.boundaries_file(region).as_path(), Boundaries::from_file)?,
        coastlines: optional(config.coastlines_file().as_path(), Boundaries::from_file)?,
        logo: optional(config.logo().as_path(), |p| Ok(image::open(p)?.to_rgba8()))?,
        background: None,
        font: match load_font(&config.font_file()) {
            Ok(font) => Some(Arc::new(font)),
            Err(e) => {
                warn!(error = %e, "No font available, text will be skipped");
                None
            }
        },
    };

    let output_dir = config.output_dir(region);
    std::fs::create_dir_all(&output_dir).with_context(|| format!("creating {}", output_dir.display()))?;
    let mut plotter = MapPlotter::new(region, colormap, assets, config.timezone, &output_dir);

    if args.background {
        let width = plotter.view().rect().width.round() as u32;
        let client = StaticMapClient::new(config.require_mapbox_key()?);
        let tile = client
            .fetch(&region.bbox(), width)
            .context("fetching map background")?;
        plotter = plotter.with_background(tile);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.processes)
        .build()?;

    let mut written = 0;
    for level in LEVELS_HPA {
        let slice = LevelSlice::select(&dataset, level)?;
        info!(level, steps = slice.dataset.ntimes(), "Pre-processing finished, launching plotting");

        if args.debug {
            written += plotter.plot_slice(&slice.head(DEBUG_STEPS))?.len();
            continue;
        }
        let chunks = slice.chunks(config.chunk_size);
        let files = pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| plotter.plot_slice(chunk))
                .collect::<Result<Vec<_>>>()
        })?;
        written += files.iter().map(Vec::len).sum::<usize>();
    }

    info!(
        images = written,
        output_dir = %output_dir.display(),
        elapsed_secs = started.elapsed().as_secs(),
        "Maps done"
    );
    Ok(())
}

/// Load a decoration, treating a missing file as absent.
fn optional<T, F>(path: &Path, load: F) -> RenderResult<Option<T>>
where
    F: FnOnce(&Path) -> RenderResult<T>,
{
    if !path.is_file() {
        warn!(path = %path.display(), "Asset not found, skipping");
        return Ok(None);
    }
    match load(path) {
        Ok(value) => Ok(Some(value)),
        Err(RenderError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
