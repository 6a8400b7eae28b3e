//! Point time series and cross-sections extracted for one city.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use geocoding::Coordinates;
use netcdf_parser::{Dataset, Field};
use tracing::debug;

/// File-name tokens of the variables a meteogram needs.
pub const VARIABLES: [&str; 15] = [
    "t_2m", "td_2m", "t", "vmax_10m", "pmsl", "HSURF", "ww", "rain_gsp", "rain_con", "snow_gsp", "snow_con",
    "relhum", "u", "v", "clc",
];

/// Dataset attribute holding the city name.
pub const CITY_ATTR: &str = "city";

const TEMPERATURE: [&str; 2] = ["t", "temp"];
const HUMIDITY: [&str; 2] = ["r", "relhum"];
const T2M: [&str; 2] = ["2t", "t_2m"];
const TD2M: [&str; 2] = ["2d", "td_2m"];
const GUST: [&str; 2] = ["VMAX_10M", "10fg"];
const MSLP: [&str; 3] = ["prmsl", "pmsl", "msl"];
const OROGRAPHY: [&str; 2] = ["HSURF", "h"];
const WEATHER_CODE: [&str; 1] = ["WW"];
const RAIN: [&str; 1] = ["RAIN_GSP"];
const SNOW: [&str; 1] = ["SNOW_GSP"];
const WIND_U: [&str; 1] = ["u"];
const WIND_V: [&str; 1] = ["v"];

/// Reduce `dataset` to the grid cell nearest to `coords`, tagged with the
/// city name.
pub fn select_city(dataset: &Dataset, city: &str, coords: Coordinates) -> Dataset {
    let mut point = dataset.select_point_nearest(coords.lon, coords.lat);
    point.attrs.insert(CITY_ATTR.to_string(), city.to_string());
    point
}

/// Everything drawn on a meteogram, in display units.
///
/// Cross-sections are stored row-major with one row per pressure level and
/// one column per hourly step.
#[derive(Debug, Clone)]
pub struct MeteogramData {
    pub city: String,
    /// Centre of the selected grid cell.
    pub lon: f64,
    pub lat: f64,
    /// Model orography height (m).
    pub elevation: f32,
    pub run: DateTime<Utc>,
    /// Hourly axis of every series except precipitation.
    pub times: Vec<DateTime<Utc>>,
    /// Pressure levels (hPa).
    pub pressure: Vec<f64>,
    /// Temperature cross-section (°C).
    pub temperature: Vec<f32>,
    /// Relative humidity cross-section (%).
    pub humidity: Vec<f32>,
    /// Wind components cross-sections (m/s).
    pub wind_u: Vec<f32>,
    pub wind_v: Vec<f32>,
    /// 2 m temperature and dewpoint (°C).
    pub t2m: Vec<f32>,
    pub td2m: Vec<f32>,
    /// 10 m gusts (km/h).
    pub gust: Vec<f32>,
    /// Mean sea level pressure (hPa).
    pub mslp: Vec<f32>,
    pub weather_code: Vec<f32>,
    /// Native model steps, used for precipitation.
    pub precip_times: Vec<DateTime<Utc>>,
    /// Accumulated rain and snow (mm).
    pub rain_acc: Vec<f32>,
    pub snow_acc: Vec<f32>,
    /// Instantaneous rain and snow rates (mm/h).
    pub rain_rate: Vec<f32>,
    pub snow_rate: Vec<f32>,
}

impl MeteogramData {
    /// Build the display arrays from a single-cell dataset on the native
    /// time axis. Everything except precipitation is resampled to hourly
    /// steps first.
    pub fn from_point(point: &Dataset) -> Result<Self> {
        if point.grid.ny() != 1 || point.grid.nx() != 1 {
            bail!(
                "expected a single grid cell, got {}x{}",
                point.grid.ny(),
                point.grid.nx()
            );
        }
        let city = point
            .attrs
            .get(CITY_ATTR)
            .cloned()
            .context("dataset is not tagged with a city")?;
        let run = point.run.context("run timestamp is unknown")?;
        let hourly = point.resample_hourly()?;
        if hourly.ntimes() < 2 {
            bail!("{}: need at least two hourly steps, got {}", city, hourly.ntimes());
        }

        let pressure: Vec<f64> = hourly
            .levels
            .as_ref()
            .context("pressure level axis is missing")?
            .iter()
            .map(|pa| pa / 100.0)
            .collect();

        let rain = point.field_any(&RAIN)?;
        let snow = point.field_any(&SNOW)?;
        let rain_rate = rain.differentiate_time(&point.times)?;
        let snow_rate = snow.differentiate_time(&point.times)?;

        let data = Self {
            lon: point.grid.lons[0],
            lat: point.grid.lats[0],
            elevation: point.field_any(&OROGRAPHY)?.get(0, 0, 0, 0),
            run,
            times: hourly.times.clone(),
            temperature: section(&converted(&hourly, &TEMPERATURE, "degC")?),
            humidity: section(hourly.field_any(&HUMIDITY)?),
            wind_u: section(hourly.field_any(&WIND_U)?),
            wind_v: section(hourly.field_any(&WIND_V)?),
            pressure,
            t2m: converted(&hourly, &T2M, "degC")?.series(0, 0, 0),
            td2m: converted(&hourly, &TD2M, "degC")?.series(0, 0, 0),
            gust: converted(&hourly, &GUST, "km/h")?.series(0, 0, 0),
            mslp: converted(&hourly, &MSLP, "hPa")?.series(0, 0, 0),
            weather_code: hourly.field_any(&WEATHER_CODE)?.series(0, 0, 0),
            precip_times: point.times.clone(),
            rain_acc: rain.series(0, 0, 0),
            snow_acc: snow.series(0, 0, 0),
            rain_rate: rain_rate.series(0, 0, 0),
            snow_rate: snow_rate.series(0, 0, 0),
            city,
        };
        debug!(
            city = %data.city,
            steps = data.times.len(),
            levels = data.pressure.len(),
            precip_steps = data.precip_times.len(),
            "Prepared meteogram data"
        );
        Ok(data)
    }

    /// Steps on the hourly axis that carry wind barbs, every `interval`
    /// hours from the first step.
    pub fn barb_steps(&self, interval: i64) -> Vec<usize> {
        let first = match self.times.first() {
            Some(t) => *t,
            None => return Vec::new(),
        };
        self.times
            .iter()
            .enumerate()
            .filter(|(_, t)| (**t - first).num_hours() % interval.max(1) == 0)
            .map(|(i, _)| i)
            .collect()
    }
}

fn converted(dataset: &Dataset, names: &[&str], unit: &str) -> Result<Field> {
    let mut field = dataset.field_any(names)?.clone();
    field
        .convert_units(unit)
        .with_context(|| format!("converting '{}' to {}", field.name, unit))?;
    Ok(field)
}

/// Transpose a single-cell profile series into `[level][time]` rows.
fn section(field: &Field) -> Vec<f32> {
    (0..field.nz)
        .flat_map(|z| (0..field.nt).map(move |t| field.get(t, z, 0, 0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_parser::Field;

    #[test]
    fn test_section_rows_are_levels() {
        // nt = 3, nz = 2, value = 10 * t + z
        let data: Vec<f32> = (0..3).flat_map(|t| (0..2).map(move |z| (10 * t + z) as f32)).collect();
        let field = Field::new("t", None, data, [3, 2, 1, 1], true, true).unwrap();
        assert_eq!(section(&field), vec![0.0, 10.0, 20.0, 1.0, 11.0, 21.0]);
    }
}
