//! Error types for dataset discovery, reading and selection.

use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No file in the data folder matched the requested variables
    #[error("No files matching {variables:?} in {folder}")]
    NoMatchingFiles { folder: String, variables: Vec<String> },

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Error reported by the netCDF library
    #[error("NetCDF error in {path}: {message}")]
    Library { path: String, message: String },

    /// A selection produced no data
    #[error("Empty selection: {0}")]
    EmptySelection(String),

    /// Geometry, unit or time handling error
    #[error(transparent)]
    Common(#[from] wx_common::WxError),
}
