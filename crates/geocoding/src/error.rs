//! Error types for the coordinate cache and the geocoding clients.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using GeocodingError.
pub type GeocodingResult<T> = Result<T, GeocodingError>;

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Failed to read coordinate cache '{0}'")]
    CacheRead(PathBuf, #[source] csv::Error),

    #[error("Failed to write coordinate cache '{0}'")]
    CacheWrite(PathBuf, #[source] csv::Error),

    #[error("Malformed row {row} in coordinate cache '{path}': {message}")]
    CacheFormat {
        path: PathBuf,
        row: usize,
        message: String,
    },

    /// The endpoint never includes the access token.
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse geocoding response")]
    JsonParse(#[from] serde_json::Error),

    #[error("No geocoding result for '{0}'")]
    NoResult(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Failed to decode static map image")]
    Image(#[from] image::ImageError),

    #[error("Invalid value for '{param}': {message}")]
    InvalidArgument { param: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeocodingError {
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        GeocodingError::InvalidArgument {
            param: param.into(),
            message: message.into(),
        }
    }
}
