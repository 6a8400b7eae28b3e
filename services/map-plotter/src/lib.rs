//! Temperature and geopotential height charts on pressure levels.
//!
//! For every level in [`LEVELS_HPA`] and every forecast step the region is
//! drawn with filled temperature bands, geopotential height isolines and
//! the high/low centres of the height field.

pub mod level;
pub mod plot;

use netcdf_parser::ReadOptions;
use wx_common::Region;

pub use level::LevelSlice;
pub use plot::{output_file, MapAssets, MapPlotter};

/// Pressure levels drawn, in hPa.
pub const LEVELS_HPA: [u32; 4] = [950, 850, 700, 500];

/// File-name tokens of the variables read from disk.
pub const VARIABLES: [&str; 2] = ["t", "fi"];

/// Level selection in Pa, as passed to the reader.
pub fn levels_pa() -> Vec<f64> {
    LEVELS_HPA.iter().map(|&l| l as f64 * 100.0).collect()
}

/// What the plotter reads for `region`: both variables on the drawn levels,
/// cropped to the region and resampled to hourly steps so every chart maps
/// to one forecast hour.
pub fn read_options(region: Region) -> ReadOptions {
    ReadOptions::new(&VARIABLES[..])
        .with_levels(levels_pa())
        .with_region(region)
        .hourly(true)
}
