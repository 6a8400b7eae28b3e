//! Per-pressure-level slices and their contour levels.

use anyhow::{bail, Context, Result};
use netcdf_parser::Dataset;
use renderer::gradient::arange_levels;
use tracing::debug;

/// Names the temperature field is read under.
pub const TEMPERATURE: [&str; 2] = ["t", "temp"];
/// Derived geopotential height field.
pub const GEOPOTENTIAL_HEIGHT: &str = "geop";

/// Spacing of the geopotential height isolines (m).
pub const GEOP_INTERVAL: f32 = 25.0;
/// Width of the temperature bands (°C).
pub const TEMP_INTERVAL: f32 = 1.0;

/// One pressure level of the dataset, temperature in °C, with the levels
/// shared by every time step of the level.
#[derive(Debug, Clone)]
pub struct LevelSlice {
    /// Pressure (hPa) as requested.
    pub level: u32,
    pub dataset: Dataset,
    pub temp_levels: Vec<f32>,
    pub geop_levels: Vec<f32>,
}

impl LevelSlice {
    /// Select the level nearest to `level` hPa and derive the contour
    /// levels from the range over all time steps.
    pub fn select(dataset: &Dataset, level: u32) -> Result<Self> {
        let mut slice = dataset
            .select_level_nearest(level as f64 * 100.0)
            .with_context(|| format!("selecting {} hPa", level))?;

        let name = slice.field_any(&TEMPERATURE)?.name.clone();
        let temperature = slice.field_mut(&name)?;
        temperature.convert_units("degC")?;
        let temp_levels = band_levels(temperature.min(), temperature.max(), TEMP_INTERVAL)
            .with_context(|| format!("temperature at {} hPa", level))?;

        let geop = slice.field(GEOPOTENTIAL_HEIGHT)?;
        let geop_levels = match (geop.min(), geop.max()) {
            (Some(lo), Some(hi)) => arange_levels(lo, hi, GEOP_INTERVAL),
            _ => Vec::new(),
        };

        debug!(
            level,
            selected = slice.attrs.get("plev").map(String::as_str).unwrap_or("?"),
            bands = temp_levels.len().saturating_sub(1),
            isolines = geop_levels.len(),
            "Level prepared"
        );
        Ok(Self {
            level,
            dataset: slice,
            temp_levels,
            geop_levels,
        })
    }

    /// Consecutive chunks of at most `size` time steps.
    pub fn chunks(&self, size: usize) -> Vec<LevelSlice> {
        self.dataset
            .time_chunks(size)
            .into_iter()
            .map(|dataset| LevelSlice {
                dataset,
                ..self.without_data()
            })
            .collect()
    }

    /// The first `n` steps only.
    pub fn head(&self, n: usize) -> LevelSlice {
        LevelSlice {
            dataset: self.dataset.isel_time(0..n),
            ..self.without_data()
        }
    }

    fn without_data(&self) -> LevelSlice {
        LevelSlice {
            level: self.level,
            dataset: self.dataset.isel_time(0..0),
            temp_levels: self.temp_levels.clone(),
            geop_levels: self.geop_levels.clone(),
        }
    }
}

/// Bands every `step` from the truncated minimum up to the truncated
/// maximum. A field flatter than one step still gets a single band.
pub fn band_levels(min: Option<f32>, max: Option<f32>, step: f32) -> Result<Vec<f32>> {
    let (lo, hi) = match (min, max) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => bail!("field has no valid values"),
    };
    let levels = arange_levels(lo, hi, step);
    if levels.len() >= 2 {
        return Ok(levels);
    }
    let start = lo.trunc();
    Ok(vec![start, start + step])
}
