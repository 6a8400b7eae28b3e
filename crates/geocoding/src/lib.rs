//! City coordinates for the meteogram pipeline and static map backgrounds.
//!
//! Lookups go through a [`CoordinateStore`] first; only misses reach the
//! geocoding service, and their answers are appended to the store.

pub mod error;
pub mod locator;
pub mod mapbox;
pub mod store;

pub use error::{GeocodingError, GeocodingResult};
pub use locator::CityLocator;
pub use mapbox::{Geocoder, MapboxGeocoder, StaticMapClient};
pub use store::{CoordinateStore, Coordinates, CsvCoordinateStore, MemoryCoordinateStore};
