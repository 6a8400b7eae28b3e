//! Reading model output files with the native netCDF library.

use std::path::Path;
use std::sync::Once;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use netcdf::AttributeValue;
use tracing::{debug, warn};
use wx_common::LatLonGrid;

use crate::error::{NetCdfError, NetCdfResult};
use crate::field::Field;

const LAT_NAMES: [&str; 2] = ["lat", "latitude"];
const LON_NAMES: [&str; 2] = ["lon", "longitude"];
const LEVEL_NAMES: [&str; 5] = ["plev", "lev", "level", "pressure", "isobaricInhPa"];
const TIME_NAME: &str = "time";

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even when the Rust side handles
/// the error (e.g. probing for an optional attribute). Safe to call many
/// times; only the first call has an effect.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Everything read from one file.
#[derive(Debug)]
pub struct FileContents {
    /// Absent when the file has no time coordinate.
    pub times: Option<Vec<DateTime<Utc>>>,
    /// Pressure levels (Pa), only when the file has more than one.
    pub levels: Option<Vec<f64>>,
    pub grid: LatLonGrid,
    /// Column permutation applied to wrap longitudes into -180..180.
    pub lon_order: Option<Vec<usize>>,
    pub fields: Vec<Field>,
}

/// Role of a dimension of a data variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Time,
    Level,
    Lat,
    Lon,
    Singleton,
}

/// Read every gridded data variable of a file.
///
/// Applies packing attributes and fill values, fixes the unit metadata of
/// `VMAX_10M`, drops bounds variables and squeezes singleton dimensions.
pub fn read_file(path: &Path) -> NetCdfResult<FileContents> {
    silence_hdf5_errors();

    let lib_err = |e: netcdf::Error| NetCdfError::Library {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let file = netcdf::open(path).map_err(lib_err)?;

    let lat_var = find_variable(&file, &LAT_NAMES)
        .ok_or_else(|| NetCdfError::MissingData(format!("latitude in {}", path.display())))?;
    let lon_var = find_variable(&file, &LON_NAMES)
        .ok_or_else(|| NetCdfError::MissingData(format!("longitude in {}", path.display())))?;
    let lat_dim = first_dimension_name(&lat_var);
    let lon_dim = first_dimension_name(&lon_var);
    let lats: Vec<f64> = lat_var.get_values(..).map_err(lib_err)?;
    let lons: Vec<f64> = lon_var.get_values(..).map_err(lib_err)?;
    let mut grid = LatLonGrid::new(lats, lons)?;
    let lon_order = grid.wrap_longitudes();

    let times = match file.variable(TIME_NAME) {
        Some(var) => {
            let raw: Vec<f64> = var.get_values(..).map_err(lib_err)?;
            let units = string_attr(&var, "units").ok_or_else(|| {
                NetCdfError::MissingData(format!("time units in {}", path.display()))
            })?;
            Some(decode_times(&raw, &units)?)
        }
        None => None,
    };

    let level_var = find_variable(&file, &LEVEL_NAMES);
    let level_dim = level_var.as_ref().map(first_dimension_name);
    let levels = match &level_var {
        Some(var) => {
            let raw: Vec<f64> = var.get_values(..).map_err(lib_err)?;
            let scale = match string_attr(var, "units").as_deref() {
                Some("hPa") | Some("mbar") | Some("millibars") => 100.0,
                _ => 1.0,
            };
            Some(raw.into_iter().map(|p| p * scale).collect::<Vec<f64>>())
        }
        None => None,
    };

    let coordinate_names: Vec<String> = [lat_var.name(), lon_var.name(), TIME_NAME.to_string()]
        .into_iter()
        .chain(level_var.as_ref().map(|v| v.name()))
        .collect();

    let mut fields = Vec::new();
    for var in file.variables() {
        let name = var.name();
        if coordinate_names.contains(&name) || is_bounds(&name) {
            continue;
        }

        let mut axes = Vec::new();
        let mut skip = false;
        for dim in var.dimensions() {
            let dim_name = dim.name();
            let axis = if dim_name == TIME_NAME {
                Axis::Time
            } else if dim_name == lat_dim {
                Axis::Lat
            } else if dim_name == lon_dim {
                Axis::Lon
            } else if Some(&dim_name) == level_dim.as_ref() {
                Axis::Level
            } else if dim.len() == 1 {
                Axis::Singleton
            } else {
                skip = true;
                break;
            };
            axes.push(axis);
        }
        let layout: Vec<Axis> = axes.iter().copied().filter(|a| *a != Axis::Singleton).collect();
        let supported = matches!(
            layout.as_slice(),
            [Axis::Lat, Axis::Lon]
                | [Axis::Time, Axis::Lat, Axis::Lon]
                | [Axis::Level, Axis::Lat, Axis::Lon]
                | [Axis::Time, Axis::Level, Axis::Lat, Axis::Lon]
        );
        if skip || !supported {
            debug!(variable = %name, file = %path.display(), "Skipping non-gridded variable");
            continue;
        }

        let has_time = layout.contains(&Axis::Time);
        let has_level = layout.contains(&Axis::Level);
        let nt = if has_time { times.as_ref().map_or(1, Vec::len) } else { 1 };
        let nz = if has_level { levels.as_ref().map_or(1, Vec::len) } else { 1 };

        let raw: Vec<f32> = var.get_values(..).map_err(lib_err)?;
        let data = unpack(&var, raw);

        let units = if name.eq_ignore_ascii_case("VMAX_10M") {
            Some("m/s".to_string())
        } else {
            string_attr(&var, "units")
        };

        let mut field = Field::new(
            name.clone(),
            units,
            data,
            [nt, nz, grid.ny(), grid.nx()],
            has_time,
            has_level,
        )?;
        if let Some(order) = &lon_order {
            field.permute_columns(order);
        }
        fields.push(field.squeeze_level());
    }

    if fields.is_empty() {
        warn!(file = %path.display(), "No gridded variables in file");
    }

    // A single pressure level is squeezed away like any singleton axis.
    let levels = levels.filter(|l| l.len() > 1);

    Ok(FileContents {
        times,
        levels,
        grid,
        lon_order,
        fields,
    })
}

fn find_variable<'f>(file: &'f netcdf::File, names: &[&str]) -> Option<netcdf::Variable<'f>> {
    names.iter().find_map(|name| file.variable(name))
}

fn first_dimension_name(var: &netcdf::Variable) -> String {
    var.dimensions()
        .first()
        .map(|d| d.name())
        .unwrap_or_else(|| var.name())
}

fn is_bounds(name: &str) -> bool {
    name.ends_with("_bnds") || name.ends_with("_bounds")
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(mut s) if !s.is_empty() => Some(s.remove(0)),
        _ => None,
    }
}

fn f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Apply fill values and `scale_factor`/`add_offset` packing.
fn unpack(var: &netcdf::Variable, raw: Vec<f32>) -> Vec<f32> {
    let fill = f64_attr(var, "_FillValue").or_else(|| f64_attr(var, "missing_value"));
    let scale = f64_attr(var, "scale_factor").unwrap_or(1.0) as f32;
    let offset = f64_attr(var, "add_offset").unwrap_or(0.0) as f32;
    let fill = fill.map(|f| f as f32);
    raw.into_iter()
        .map(|v| {
            if fill.map_or(false, |f| v == f) {
                f32::NAN
            } else {
                v * scale + offset
            }
        })
        .collect()
}

/// Decode a time coordinate.
///
/// Supports CF relative units (`<unit> since <datetime>`) and the absolute
/// `day as %Y%m%d.%f` encoding written by CDO.
pub fn decode_times(values: &[f64], units: &str) -> NetCdfResult<Vec<DateTime<Utc>>> {
    let units = units.trim();
    if units.starts_with("day as") {
        return values.iter().map(|&v| decode_absolute_day(v)).collect();
    }

    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| NetCdfError::InvalidFormat(format!("time units '{}'", units)))?;
    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "s" => 1.0,
        "minutes" | "minute" | "min" => 60.0,
        "hours" | "hour" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        other => {
            return Err(NetCdfError::InvalidFormat(format!("time unit '{}'", other)));
        }
    };
    let reference = parse_reference(reference)?;
    Ok(values
        .iter()
        .map(|&v| reference + Duration::milliseconds((v * seconds_per_unit * 1000.0).round() as i64))
        .collect())
}

fn parse_reference(s: &str) -> NetCdfResult<DateTime<Utc>> {
    let s = s.trim().trim_end_matches("UTC").trim_end_matches('Z').trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }
    Err(NetCdfError::InvalidFormat(format!("reference time '{}'", s)))
}

/// `YYYYMMDD.fraction` where the fraction is a part of a day.
fn decode_absolute_day(value: f64) -> NetCdfResult<DateTime<Utc>> {
    let day = value.trunc() as i64;
    let (year, month, dom) = (day / 10000, (day / 100) % 100, day % 100);
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, dom as u32)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| NetCdfError::InvalidFormat(format!("absolute day {}", value)))?;
    let seconds = (value.fract() * 86400.0).round() as i64;
    Ok(Utc.from_utc_datetime(&date) + Duration::seconds(seconds))
}
