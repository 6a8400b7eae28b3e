//! Error types shared by the wx-charts crates.

use thiserror::Error;

/// Result type alias using WxError.
pub type WxResult<T> = Result<T, WxError>;

/// Primary error type for configuration, geometry and unit handling.
#[derive(Debug, Error)]
pub enum WxError {
    #[error("Invalid value for '{param}': {message}")]
    InvalidArgument { param: String, message: String },

    #[error("Unknown projection: {0}")]
    UnknownRegion(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Cannot convert from '{from}' to '{to}'")]
    UnitConversion { from: String, to: String },

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Empty selection: {0}")]
    EmptySelection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WxError {
    /// Shorthand for an invalid-argument error.
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        WxError::InvalidArgument {
            param: param.into(),
            message: message.into(),
        }
    }
}
