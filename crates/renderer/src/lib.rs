//! Chart rendering for forecast maps and meteograms.
//!
//! Building blocks:
//! - Colormaps (continuous tables and discrete level palettes)
//! - Filled bands and contour lines (marching squares) over gridded fields
//! - Local extrema detection for pressure-centre markers
//! - Weather-code icons, wind barbs, text and boundaries
//! - Axes, colorbars and legends on an RGBA canvas, encoded as PNG

pub mod barbs;
pub mod boundaries;
pub mod canvas;
pub mod chart;
pub mod colormap;
pub mod contour;
pub mod error;
pub mod extrema;
pub mod gradient;
pub mod icons;
pub mod mapview;
pub mod png;
pub mod text;
pub mod view;

pub use boundaries::Boundaries;
pub use canvas::{Canvas, LineStyle};
pub use chart::{Axes, Rect, Scale};
pub use colormap::{Color, Colormap, ColormapCategory, DiscreteColormap};
pub use contour::ContourConfig;
pub use error::{RenderError, RenderResult};
pub use extrema::{ExtremaFinder, Extremum, ExtremumKind};
pub use gradient::{Extend, FilledLevels};
pub use icons::IconResolver;
pub use mapview::MapView;
pub use text::{Anchor, TextStyle};
pub use view::GridView;
