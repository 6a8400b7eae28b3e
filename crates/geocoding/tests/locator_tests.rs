//! Tests for cache-first city lookup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use geocoding::{
    CityLocator, CoordinateStore, Coordinates, CsvCoordinateStore, Geocoder, GeocodingError, GeocodingResult,
    MemoryCoordinateStore,
};
use tempfile::TempDir;

/// Answers every city with a fixed position and counts requests.
#[derive(Clone, Default)]
struct CountingGeocoder {
    calls: Arc<AtomicUsize>,
}

impl CountingGeocoder {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for CountingGeocoder {
    fn geocode(&self, city: &str) -> GeocodingResult<Coordinates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if city == "Nowhere" {
            return Err(GeocodingError::NoResult(city.to_string()));
        }
        Ok(Coordinates::new(9.99, 53.55))
    }
}

// ============================================================================
// CSV-backed cache
// ============================================================================

#[test]
fn test_miss_requests_once_then_hits_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plotting").join("cities_coordinates.csv");
    let geocoder = CountingGeocoder::default();
    let locator = CityLocator::new(CsvCoordinateStore::new(&path), geocoder.clone());

    let first = locator.locate("Hamburg").unwrap();
    let second = locator.locate("Hamburg").unwrap();

    assert_eq!(first, second);
    assert_eq!(geocoder.calls(), 1);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 2, "header plus one row: {}", contents);
}

#[test]
fn test_cache_survives_new_locator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cities_coordinates.csv");

    let geocoder = CountingGeocoder::default();
    CityLocator::new(CsvCoordinateStore::new(&path), geocoder.clone())
        .locate("Hamburg")
        .unwrap();

    let again = CountingGeocoder::default();
    let coords = CityLocator::new(CsvCoordinateStore::new(&path), again.clone())
        .locate("Hamburg")
        .unwrap();
    assert_eq!(coords, Coordinates::new(9.99, 53.55));
    assert_eq!(again.calls(), 0);
}

#[test]
fn test_new_cities_are_appended() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cities_coordinates.csv");
    std::fs::write(&path, ",lon,lat\nMilano,9.19,45.4642\n").unwrap();

    let geocoder = CountingGeocoder::default();
    let locator = CityLocator::new(CsvCoordinateStore::new(&path), geocoder.clone());
    assert_eq!(locator.locate("Milano").unwrap(), Coordinates::new(9.19, 45.4642));
    locator.locate("Hamburg").unwrap();

    assert_eq!(geocoder.calls(), 1);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, ",lon,lat\nMilano,9.19,45.4642\nHamburg,9.99,53.55\n");
}

#[test]
fn test_geocoder_failure_leaves_cache_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cities_coordinates.csv");
    let locator = CityLocator::new(CsvCoordinateStore::new(&path), CountingGeocoder::default());

    let err = locator.locate("Nowhere").unwrap_err();
    assert!(matches!(err, GeocodingError::NoResult(_)));
    assert!(!path.exists());
}

// ============================================================================
// In-memory cache
// ============================================================================

#[test]
fn test_memory_store_lookup() {
    let store = MemoryCoordinateStore::new();
    store.put_if_absent("Roma", Coordinates::new(12.5, 41.9)).unwrap();

    let geocoder = CountingGeocoder::default();
    let locator = CityLocator::new(store, geocoder.clone());
    assert_eq!(locator.locate("Roma").unwrap(), Coordinates::new(12.5, 41.9));
    locator.locate("Bonn").unwrap();
    locator.locate("Bonn").unwrap();

    assert_eq!(geocoder.calls(), 1);
    assert_eq!(locator.store().len(), 2);
}
