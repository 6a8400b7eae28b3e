//! Reading ICON-D2 style model output into an in-memory [`Dataset`].
//!
//! Files are located in the data folder by variable name and run code,
//! read with the native netCDF library, merged along time and optionally
//! resampled to hourly steps, reduced to a set of pressure levels and
//! cropped to a map region.
//!
//! ```no_run
//! use netcdf_parser::{open_dataset, ReadOptions};
//! use wx_common::Region;
//!
//! let options = ReadOptions::new(&["t", "fi"])
//!     .with_levels(vec![85000.0, 50000.0])
//!     .with_region(Region::De)
//!     .hourly(true);
//! let dataset = open_dataset("/tmp/icon-d2/".as_ref(), &options)?;
//! # Ok::<(), netcdf_parser::NetCdfError>(())
//! ```

pub mod dataset;
pub mod derived;
pub mod discovery;
pub mod error;
pub mod field;
pub mod loader;
pub mod reader;

pub use dataset::Dataset;
pub use derived::compute_geopot_height;
pub use error::{NetCdfError, NetCdfResult};
pub use field::Field;
pub use loader::{open_dataset, ReadOptions};
pub use reader::{read_file, silence_hdf5_errors};
