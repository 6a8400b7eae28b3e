//! Common types and utilities shared by the wx-charts plotters.

pub mod bbox;
pub mod config;
pub mod error;
pub mod grid;
pub mod region;
pub mod time;
pub mod units;

pub use bbox::BoundingBox;
pub use config::WxConfig;
pub use error::{WxError, WxResult};
pub use grid::LatLonGrid;
pub use region::{Region, RegionDef};
pub use time::ValidTime;
pub use units::{Unit, UnitTransform};
