//! Error types for chart rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid value for '{param}': {message}")]
    InvalidArgument { param: String, message: String },

    /// Unknown colormap category or malformed asset
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Colormap table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Canvas error: {0}")]
    Canvas(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Common(#[from] wx_common::WxError),
}

impl RenderError {
    /// Shorthand for an invalid-argument error.
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::InvalidArgument {
            param: param.into(),
            message: message.into(),
        }
    }
}
