//! Persistent city → coordinate cache.
//!
//! The on-disk format is a flat CSV with a `,lon,lat` header followed by
//! `city,lon,lat` rows. Rows are only ever appended; an existing city is
//! never updated or removed.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GeocodingError, GeocodingResult};

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Lookup and append-only insertion of city coordinates.
pub trait CoordinateStore: Send + Sync {
    fn get(&self, city: &str) -> GeocodingResult<Option<Coordinates>>;

    /// Store `coords` for `city` unless an entry already exists.
    /// Returns whether a new entry was written.
    fn put_if_absent(&self, city: &str, coords: Coordinates) -> GeocodingResult<bool>;
}

/// CSV-file backed store.
///
/// Appends from this process are serialized; other processes writing the
/// same file are not coordinated with.
#[derive(Debug)]
pub struct CsvCoordinateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvCoordinateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows in file order. A missing file is an empty cache.
    pub fn entries(&self) -> GeocodingResult<Vec<(String, Coordinates)>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| GeocodingError::CacheRead(self.path.clone(), e))?;

        let mut entries = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| GeocodingError::CacheRead(self.path.clone(), e))?;
            let bad = |message: &str| GeocodingError::CacheFormat {
                path: self.path.clone(),
                row: i + 1,
                message: message.to_string(),
            };
            if record.len() < 3 {
                return Err(bad("expected city,lon,lat"));
            }
            let lon = record[1].parse::<f64>().map_err(|_| bad("longitude is not a number"))?;
            let lat = record[2].parse::<f64>().map_err(|_| bad("latitude is not a number"))?;
            entries.push((record[0].to_string(), Coordinates::new(lon, lat)));
        }
        Ok(entries)
    }

    fn append(&self, city: &str, coords: Coordinates) -> GeocodingResult<()> {
        let exists = self.path.is_file();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        let write_err = |e| GeocodingError::CacheWrite(self.path.clone(), e);
        if !exists {
            writer.write_record(["", "lon", "lat"]).map_err(write_err)?;
        }
        writer
            .write_record([city.to_string(), coords.lon.to_string(), coords.lat.to_string()])
            .map_err(write_err)?;
        writer.flush()?;
        Ok(())
    }
}

impl CoordinateStore for CsvCoordinateStore {
    fn get(&self, city: &str) -> GeocodingResult<Option<Coordinates>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|(name, _)| name == city)
            .map(|(_, coords)| coords))
    }

    fn put_if_absent(&self, city: &str, coords: Coordinates) -> GeocodingResult<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.get(city)?.is_some() {
            return Ok(false);
        }
        self.append(city, coords)?;
        debug!(city, lon = coords.lon, lat = coords.lat, path = %self.path.display(), "Cached city coordinates");
        Ok(true)
    }
}

/// In-memory store, for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryCoordinateStore {
    entries: Mutex<HashMap<String, Coordinates>>,
}

impl MemoryCoordinateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CoordinateStore for MemoryCoordinateStore {
    fn get(&self, city: &str) -> GeocodingResult<Option<Coordinates>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(city).copied())
    }

    fn put_if_absent(&self, city: &str, coords: Coordinates) -> GeocodingResult<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(city) {
            return Ok(false);
        }
        entries.insert(city.to_string(), coords);
        Ok(true)
    }
}
