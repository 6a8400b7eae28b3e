//! Mapbox geocoding and static map clients (blocking, no retries).

use image::RgbaImage;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};
use wx_common::BoundingBox;

use crate::error::{GeocodingError, GeocodingResult};
use crate::store::Coordinates;

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Resolves a place name to coordinates.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, city: &str) -> GeocodingResult<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    features: Vec<PlaceFeature>,
}

#[derive(Debug, Deserialize)]
struct PlaceFeature {
    /// `[lon, lat]`
    center: [f64; 2],
}

/// Coordinates of the best match in a places response.
pub fn parse_places_response(city: &str, body: &str) -> GeocodingResult<Coordinates> {
    let response: PlacesResponse = serde_json::from_str(body)?;
    let first = response
        .features
        .first()
        .ok_or_else(|| GeocodingError::NoResult(city.to_string()))?;
    Ok(Coordinates::new(first.center[0], first.center[1]))
}

fn send(client: &Client, endpoint: &str, url: &str) -> GeocodingResult<Response> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| GeocodingError::NetworkRequest(endpoint.to_string(), e.without_url()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(GeocodingError::HttpStatus {
            url: endpoint.to_string(),
            status,
        });
    }
    Ok(response)
}

/// Mapbox places API client. The access token is only needed when a
/// request is actually made.
#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Request endpoint for `city`, without the token.
    pub fn endpoint(&self, city: &str) -> String {
        format!("{}/geocoding/v5/mapbox.places/{}.json", self.base_url, city)
    }
}

impl Geocoder for MapboxGeocoder {
    fn geocode(&self, city: &str) -> GeocodingResult<Coordinates> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(GeocodingError::MissingCredential("MAPBOX_KEY"))?;
        let endpoint = self.endpoint(city);
        let url = format!("{}?&access_token={}", endpoint, token);
        debug!(city, endpoint = %endpoint, "Geocoding request");

        let body = send(&self.client, &endpoint, &url)?
            .text()
            .map_err(|e| GeocodingError::NetworkRequest(endpoint.clone(), e.without_url()))?;
        let coords = parse_places_response(city, &body)?;
        info!(city, lon = coords.lon, lat = coords.lat, "Geocoded city");
        Ok(coords)
    }
}

/// Dark static map tile used as a map background.
#[derive(Debug, Clone)]
pub struct StaticMapClient {
    client: Client,
    base_url: String,
    access_token: String,
    style: String,
}

impl StaticMapClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
            style: "mapbox/dark-v10".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Image height keeping the aspect of `bbox` at `width` pixels.
    pub fn height_for(bbox: &BoundingBox, width: u32) -> u32 {
        (bbox.aspect() * width as f64).round().max(1.0) as u32
    }

    /// Request endpoint for `bbox` at `width` x `height`, without the token.
    pub fn endpoint(&self, bbox: &BoundingBox, width: u32, height: u32) -> String {
        format!(
            "{}/styles/v1/{}/static/{}/{}x{}",
            self.base_url,
            self.style,
            bbox.to_bracket_string(),
            width,
            height
        )
    }

    /// Fetch and decode the tile covering `bbox`, `width` pixels wide.
    pub fn fetch(&self, bbox: &BoundingBox, width: u32) -> GeocodingResult<RgbaImage> {
        if width == 0 || bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return Err(GeocodingError::invalid("bbox", "empty map extent"));
        }
        let height = Self::height_for(bbox, width);
        let endpoint = self.endpoint(bbox, width, height);
        let url = format!("{}?access_token={}&logo=false", endpoint, self.access_token);
        debug!(endpoint = %endpoint, "Static map request");

        let bytes = send(&self.client, &endpoint, &url)?
            .bytes()
            .map_err(|e| GeocodingError::NetworkRequest(endpoint.clone(), e.without_url()))?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        info!(width = image.width(), height = image.height(), "Fetched static map background");
        Ok(image)
    }
}
