//! Meteogram plotter.
//!
//! Reads the latest model run, locates each requested city and writes one
//! meteogram PNG per city.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use geocoding::{CityLocator, CsvCoordinateStore, MapboxGeocoder};
use netcdf_parser::{open_dataset, silence_hdf5_errors, ReadOptions};
use rayon::prelude::*;
use renderer::text::load_font;
use renderer::{Colormap, IconResolver};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wx_common::WxConfig;

use meteogram::{plot_point, select_city, MeteogramRenderer, VARIABLES};

#[derive(Parser, Debug)]
#[command(name = "plot-meteogram")]
#[command(about = "Plot forecast meteograms for one or more cities")]
struct Args {
    /// Cities to plot
    #[arg(default_value = "Hamburg")]
    cities: Vec<String>,

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
    info!(cities = ?args.cities, "Starting script to plot meteograms");

    let config = WxConfig::from_env()?;
    silence_hdf5_errors();

    let dataset = open_dataset(&config.data_folder, &ReadOptions::new(&VARIABLES[..]))
        .with_context(|| format!("reading model output from {}", config.data_folder.display()))?;

    let locator = CityLocator::new(
        CsvCoordinateStore::new(config.cities_cache()),
        MapboxGeocoder::new(config.mapbox_key.clone()),
    );
    let mut points = Vec::with_capacity(args.cities.len());
    for city in &args.cities {
        let coords = locator
            .locate(city)
            .with_context(|| format!("locating {}", city))?;
        points.push(select_city(&dataset, city, coords));
    }
    drop(dataset);

    let colormap = Colormap::from_rgba_file(&config.colormap_file("temp"))?;
    let font = match load_font(&config.font_file()) {
        Ok(font) => Some(Arc::new(font)),
        Err(e) => {
            warn!(error = %e, "No font available, text will be skipped");
            None
        }
    };
    let renderer = MeteogramRenderer::new(
        &colormap,
        IconResolver::new(config.glyph_dir(), config.timezone),
        font,
    )?;

    std::fs::create_dir_all(&config.images_folder)
        .with_context(|| format!("creating {}", config.images_folder.display()))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.processes)
        .build()?;
    let written = pool.install(|| {
        points
            .par_iter()
            .map(|point| plot_point(&renderer, point, &config))
            .collect::<Result<Vec<_>>>()
    })?;

    info!(
        images = written.len(),
        elapsed_secs = started.elapsed().as_secs(),
        "Meteograms done"
    );
    Ok(())
}
