//! Cache-first city lookup.

use tracing::{debug, info};

use crate::error::GeocodingResult;
use crate::mapbox::Geocoder;
use crate::store::{CoordinateStore, Coordinates};

/// Resolves city names through a coordinate store, asking the geocoder
/// only on a miss and recording the answer.
#[derive(Debug)]
pub struct CityLocator<S, G> {
    store: S,
    geocoder: G,
}

impl<S: CoordinateStore, G: Geocoder> CityLocator<S, G> {
    pub fn new(store: S, geocoder: G) -> Self {
        Self { store, geocoder }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locate(&self, city: &str) -> GeocodingResult<Coordinates> {
        if let Some(coords) = self.store.get(city)? {
            debug!(city, lon = coords.lon, lat = coords.lat, "City found in cache");
            return Ok(coords);
        }
        let coords = self.geocoder.geocode(city)?;
        if self.store.put_if_absent(city, coords)? {
            info!(city, "Added city to coordinate cache");
        }
        Ok(coords)
    }
}
