//! Per-city meteograms.
//!
//! A meteogram combines a time/pressure cross-section of temperature,
//! humidity and wind with surface series (2 m temperature and dewpoint,
//! gusts and pressure, precipitation) for the grid cell nearest a city.

pub mod data;
pub mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use netcdf_parser::Dataset;
use tracing::info;
use wx_common::WxConfig;

pub use data::{select_city, MeteogramData, CITY_ATTR, VARIABLES};
pub use render::MeteogramRenderer;

/// Render the meteogram of one city-tagged point dataset into
/// `<images_folder>/meteogram_<city>.png`.
pub fn plot_point(renderer: &MeteogramRenderer, point: &Dataset, config: &WxConfig) -> Result<PathBuf> {
    let data = MeteogramData::from_point(point)?;
    info!(city = %data.city, lon = data.lon, lat = data.lat, "Producing meteogram");
    let canvas = renderer.render(&data)?;
    let path = config.meteogram_file(&data.city);
    canvas
        .save_png(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(city = %data.city, path = %path.display(), "Meteogram written");
    Ok(path)
}
