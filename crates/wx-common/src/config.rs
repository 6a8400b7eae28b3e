//! Runtime configuration shared by the plotting binaries.
//!
//! Resolved once at startup from environment variables (after `.env` has
//! been loaded by the binary) and passed by reference to every component.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use tracing::debug;

use crate::{Region, WxError, WxResult};

/// Folders, credentials and worker sizing for a plotting run.
#[derive(Debug, Clone)]
pub struct WxConfig {
    /// Folder holding the model output files.
    pub data_folder: PathBuf,
    /// Project home; static assets live under `<home>/plotting/`.
    pub home_folder: PathBuf,
    /// Root folder for generated images.
    pub images_folder: PathBuf,
    /// Geocoding / static map credential. Only needed on cache misses.
    pub mapbox_key: Option<String>,
    /// Size of the worker pool.
    pub processes: usize,
    /// Number of time steps handed to one worker.
    pub chunk_size: usize,
    /// Timezone used for day/night decisions and annotations.
    pub timezone: Tz,
    /// TrueType font used for every text element.
    pub font_path: Option<PathBuf>,
}

impl Default for WxConfig {
    fn default() -> Self {
        let data_folder = PathBuf::from("/tmp/icon-d2/");
        Self {
            images_folder: data_folder.clone(),
            data_folder,
            home_folder: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            mapbox_key: None,
            processes: 9,
            chunk_size: 10,
            timezone: chrono_tz::Europe::Berlin,
            font_path: None,
        }
    }
}

impl WxConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> WxResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> WxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("MODEL_DATA_FOLDER") {
            config.data_folder = PathBuf::from(&val);
            config.images_folder = PathBuf::from(val);
        }

        if let Some(val) = lookup("HOME_FOLDER") {
            config.home_folder = PathBuf::from(val);
        }

        config.mapbox_key = lookup("MAPBOX_KEY").filter(|k| !k.trim().is_empty());

        if let Some(val) = lookup("WX_PROCESSES") {
            config.processes = val
                .parse()
                .map_err(|_| WxError::invalid("WX_PROCESSES", format!("not a count: {}", val)))?;
        }

        if let Some(val) = lookup("WX_CHUNK_SIZE") {
            config.chunk_size = val
                .parse()
                .map_err(|_| WxError::invalid("WX_CHUNK_SIZE", format!("not a count: {}", val)))?;
        }

        if let Some(val) = lookup("WX_TIMEZONE") {
            config.timezone = val
                .parse::<Tz>()
                .map_err(|e| WxError::invalid("WX_TIMEZONE", e.to_string()))?;
        }

        config.font_path = lookup("WX_FONT_PATH").map(PathBuf::from);

        config.validate()?;
        debug!(
            data_folder = %config.data_folder.display(),
            home_folder = %config.home_folder.display(),
            processes = config.processes,
            chunk_size = config.chunk_size,
            timezone = %config.timezone,
            "Resolved configuration"
        );
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> WxResult<()> {
        if self.processes == 0 {
            return Err(WxError::invalid("processes", "must be > 0"));
        }
        if self.chunk_size == 0 {
            return Err(WxError::invalid("chunk_size", "must be > 0"));
        }
        Ok(())
    }

    /// The geocoding credential, or an error naming the missing variable.
    pub fn require_mapbox_key(&self) -> WxResult<&str> {
        self.mapbox_key
            .as_deref()
            .ok_or_else(|| WxError::MissingConfig("MAPBOX_KEY".to_string()))
    }

    /// Folder with static plotting assets.
    pub fn assets_dir(&self) -> PathBuf {
        self.home_folder.join("plotting")
    }

    /// Folder with the weather icon PNGs.
    pub fn glyph_dir(&self) -> PathBuf {
        self.assets_dir().join("yrno_png")
    }

    /// Colormap table `cmap_<name>.rgba`.
    pub fn colormap_file(&self, name: &str) -> PathBuf {
        self.assets_dir().join(format!("cmap_{}.rgba", name))
    }

    /// City coordinate cache.
    pub fn cities_cache(&self) -> PathBuf {
        self.assets_dir().join("cities_coordinates.csv")
    }

    pub fn logo(&self) -> PathBuf {
        self.assets_dir().join("meteoindiretta_logo.png")
    }

    /// Administrative boundaries of a region, as GeoJSON.
    pub fn boundaries_file(&self, region: Region) -> PathBuf {
        self.shapefile(region.def().boundaries)
    }

    /// Coastlines and country borders, as GeoJSON.
    pub fn coastlines_file(&self) -> PathBuf {
        self.shapefile("coastlines")
    }

    fn shapefile(&self, name: &str) -> PathBuf {
        self.assets_dir()
            .join("shapefiles")
            .join(format!("{}.geojson", name))
    }

    /// Font file, falling back to a DejaVu copy in the assets folder.
    pub fn font_file(&self) -> PathBuf {
        self.font_path
            .clone()
            .unwrap_or_else(|| self.assets_dir().join("DejaVuSans.ttf"))
    }

    /// Output folder for map images of a region.
    pub fn output_dir(&self, region: Region) -> PathBuf {
        match region {
            Region::De => self.images_folder.clone(),
            other => suffixed(&self.images_folder, other.name()),
        }
    }

    /// Output file of a meteogram.
    pub fn meteogram_file(&self, city: &str) -> PathBuf {
        self.images_folder.join(format!("meteogram_{}.png", city))
    }
}

/// `<folder><suffix>` by plain string concatenation.
fn suffixed(folder: &Path, suffix: &str) -> PathBuf {
    let base = folder.to_string_lossy();
    PathBuf::from(format!("{}{}", base, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WxConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_folder, PathBuf::from("/tmp/icon-d2/"));
        assert_eq!(config.processes, 9);
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert!(config.mapbox_key.is_none());
    }

    #[test]
    fn test_region_output_dirs() {
        let config = WxConfig::from_lookup(lookup(&[("MODEL_DATA_FOLDER", "/data/icon/")])).unwrap();
        assert_eq!(config.output_dir(Region::De), PathBuf::from("/data/icon/"));
        assert_eq!(config.output_dir(Region::It), PathBuf::from("/data/icon/it"));
        assert_eq!(config.output_dir(Region::Nord), PathBuf::from("/data/icon/nord"));
    }

    #[test]
    fn test_asset_paths() {
        let config = WxConfig::from_lookup(lookup(&[("HOME_FOLDER", "/srv/wx")])).unwrap();
        assert_eq!(
            config.colormap_file("temp"),
            PathBuf::from("/srv/wx/plotting/cmap_temp.rgba")
        );
        assert_eq!(
            config.cities_cache(),
            PathBuf::from("/srv/wx/plotting/cities_coordinates.csv")
        );
        assert_eq!(
            config.boundaries_file(Region::It),
            PathBuf::from("/srv/wx/plotting/shapefiles/ITA_adm/ITA_adm1.geojson")
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(WxConfig::from_lookup(lookup(&[("WX_PROCESSES", "many")])).is_err());
        assert!(WxConfig::from_lookup(lookup(&[("WX_PROCESSES", "0")])).is_err());
        assert!(WxConfig::from_lookup(lookup(&[("WX_TIMEZONE", "Mars/Olympus")])).is_err());
    }

    #[test]
    fn test_missing_mapbox_key() {
        let config = WxConfig::from_lookup(lookup(&[("MAPBOX_KEY", "  ")])).unwrap();
        assert!(matches!(
            config.require_mapbox_key(),
            Err(WxError::MissingConfig(_))
        ));
    }
}
