//! Common test fixtures: grids, model files and static plotting assets.

use std::path::{Path, PathBuf};

/// Run code embedded in fixture file names.
pub const RUN_CODE: &str = "2024011506";

/// Common grid specifications for testing.
pub mod grid {
    /// ICON-D2 regular lat/lon grid (0.02 degree resolution)
    pub const ICON_D2: GridSpec = GridSpec {
        width: 1215,
        height: 746,
        min_lon: -3.94,
        max_lon: 20.34,
        min_lat: 43.18,
        max_lat: 58.08,
    };

    /// Coarse grid over Germany, small enough for fast tests
    pub const SMALL_DE: GridSpec = GridSpec {
        width: 25,
        height: 21,
        min_lon: 4.0,
        max_lon: 16.0,
        min_lat: 46.0,
        max_lat: 56.0,
    };

    /// Grid specification for test data.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub max_lon: f64,
        pub min_lat: f64,
        pub max_lat: f64,
    }

    impl GridSpec {
        /// Total number of grid points.
        pub fn total_points(&self) -> usize {
            self.width * self.height
        }

        /// Resolution in degrees (longitude).
        pub fn lon_resolution(&self) -> f64 {
            (self.max_lon - self.min_lon) / (self.width - 1) as f64
        }

        /// Resolution in degrees (latitude).
        pub fn lat_resolution(&self) -> f64 {
            (self.max_lat - self.min_lat) / (self.height - 1) as f64
        }

        /// Ascending latitude axis.
        pub fn lats(&self) -> Vec<f64> {
            let step = self.lat_resolution();
            (0..self.height)
                .map(|i| self.min_lat + step * i as f64)
                .collect()
        }

        /// Ascending longitude axis.
        pub fn lons(&self) -> Vec<f64> {
            let step = self.lon_resolution();
            (0..self.width)
                .map(|i| self.min_lon + step * i as f64)
                .collect()
        }
    }
}

/// Colormap table in the `.rgba` CSV layout: a header row, then R,G,B,A
/// columns in 0..1. Blue to white to red.
pub const RGBA_TABLE: &str = "r,g,b,a\n\
0.0,0.0,1.0,1.0\n\
1.0,1.0,1.0,1.0\n\
1.0,0.0,0.0,1.0\n";

/// Write a colormap table `cmap_<name>.rgba` into `dir`.
pub fn write_rgba_table(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(format!("cmap_{}.rgba", name));
    std::fs::write(&path, contents).expect("Failed to write colormap table");
    path
}

/// Write a solid-color PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create PNG folder");
    }
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    img.save(path).expect("Failed to write PNG fixture");
    path.to_path_buf()
}

/// Populate a `plotting/` assets folder under `home` with weather icons
/// (given ids, each as `<id>.png`), the `temp` colormap and a logo.
pub fn write_plotting_assets(home: &Path, icons: &[&str]) -> PathBuf {
    let assets = home.join("plotting");
    let glyphs = assets.join("yrno_png");
    std::fs::create_dir_all(&glyphs).expect("Failed to create assets folder");
    for id in icons {
        write_png(&glyphs.join(format!("{}.png", id)), 8, 8, [255, 200, 0, 255]);
    }
    write_rgba_table(&assets, "temp", RGBA_TABLE);
    write_png(&assets.join("meteoindiretta_logo.png"), 20, 10, [255, 255, 255, 200]);
    assets
}

/// A variable to write into a synthetic model file.
#[derive(Debug, Clone)]
pub struct ModelVariable {
    pub name: String,
    pub units: String,
    /// Whether the variable has a pressure-level dimension.
    pub with_level: bool,
    /// Whether the variable has a time dimension.
    pub with_time: bool,
    /// Values in `[time][level][lat][lon]` order.
    pub values: Vec<f32>,
}

impl ModelVariable {
    pub fn new(name: &str, units: &str, values: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            with_level: false,
            with_time: true,
            values,
        }
    }

    pub fn on_levels(mut self) -> Self {
        self.with_level = true;
        self
    }

    pub fn invariant(mut self) -> Self {
        self.with_time = false;
        self
    }
}

/// Layout of a synthetic model file.
#[derive(Debug, Clone)]
pub struct ModelFile {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Time values in `time_units`.
    pub times: Vec<f64>,
    pub time_units: String,
    /// Pressure levels in Pa.
    pub levels: Option<Vec<f64>>,
    pub variables: Vec<ModelVariable>,
}

impl ModelFile {
    /// Hourly steps starting at the fixture run.
    pub fn hourly(lats: Vec<f64>, lons: Vec<f64>, steps: usize) -> Self {
        Self {
            lats,
            lons,
            times: (0..steps).map(|h| h as f64).collect(),
            time_units: "hours since 2024-01-15 06:00:00".to_string(),
            levels: None,
            variables: Vec::new(),
        }
    }

    pub fn with_levels(mut self, levels: Vec<f64>) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn with_variable(mut self, variable: ModelVariable) -> Self {
        self.variables.push(variable);
        self
    }
}

/// Write a CF-style NetCDF file. A `plev_bnds` variable is added when the
/// file has pressure levels.
pub fn write_model_file(path: &Path, spec: &ModelFile) -> PathBuf {
    try_write_model_file(path, spec).expect("Failed to write NetCDF fixture");
    path.to_path_buf()
}

fn try_write_model_file(path: &Path, spec: &ModelFile) -> Result<(), netcdf::Error> {
    let mut file = netcdf::create(path)?;
    file.add_attribute("Conventions", "CF-1.6")?;

    file.add_dimension("time", spec.times.len())?;
    file.add_dimension("lat", spec.lats.len())?;
    file.add_dimension("lon", spec.lons.len())?;
    if let Some(levels) = &spec.levels {
        file.add_dimension("plev", levels.len())?;
        file.add_dimension("bnds", 2)?;
    }

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("units", spec.time_units.as_str())?;
        var.put_attribute("calendar", "proleptic_gregorian")?;
        var.put_values(spec.times.as_slice(), ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_values(spec.lats.as_slice(), ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lon", &["lon"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_values(spec.lons.as_slice(), ..)?;
    }
    if let Some(levels) = &spec.levels {
        {
            let mut var = file.add_variable::<f64>("plev", &["plev"])?;
            var.put_attribute("units", "Pa")?;
            var.put_values(levels.as_slice(), ..)?;
        }
        let bounds: Vec<f64> = levels.iter().flat_map(|&p| [p + 500.0, p - 500.0]).collect();
        let mut var = file.add_variable::<f64>("plev_bnds", &["plev", "bnds"])?;
        var.put_values(bounds.as_slice(), ..)?;
    }

    for variable in &spec.variables {
        let mut dims: Vec<&str> = Vec::new();
        if variable.with_time {
            dims.push("time");
        }
        if variable.with_level {
            dims.push("plev");
        }
        dims.extend(["lat", "lon"]);
        let mut var = file.add_variable::<f32>(&variable.name, &dims)?;
        var.put_attribute("units", variable.units.as_str())?;
        var.put_values(variable.values.as_slice(), ..)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::grid::*;

    #[test]
    fn test_grid_spec_axes() {
        let lats = SMALL_DE.lats();
        let lons = SMALL_DE.lons();
        assert_eq!(lats.len(), 21);
        assert_eq!(lons.len(), 25);
        assert!((lats[20] - 56.0).abs() < 1e-9);
        assert!((SMALL_DE.lon_resolution() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_icon_d2_resolution() {
        assert!((ICON_D2.lat_resolution() - 0.02).abs() < 1e-6);
        assert!((ICON_D2.lon_resolution() - 0.02).abs() < 1e-6);
        assert_eq!(ICON_D2.total_points(), 1215 * 746);
    }
}
