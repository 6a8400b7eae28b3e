//! Regular latitude/longitude grids.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, WxError, WxResult};

/// A rectilinear lat/lon grid described by its two 1-D coordinate axes.
///
/// Data laid out on this grid is row-major: row index follows `lats`,
/// column index follows `lons`. Both axes must be strictly monotonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLonGrid {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

impl LatLonGrid {
    /// Build a grid, validating that both axes are non-empty and monotonic.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>) -> WxResult<Self> {
        if lats.is_empty() || lons.is_empty() {
            return Err(WxError::EmptySelection("grid axis has no points".into()));
        }
        if !is_monotonic(&lats) {
            return Err(WxError::invalid("lat", "latitude axis is not monotonic"));
        }
        if !is_monotonic(&lons) {
            return Err(WxError::invalid("lon", "longitude axis is not monotonic"));
        }
        Ok(Self { lats, lons })
    }

    /// A single-point grid, as left behind by a nearest-point selection.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            lats: vec![lat],
            lons: vec![lon],
        }
    }

    /// Number of columns (longitudes).
    pub fn nx(&self) -> usize {
        self.lons.len()
    }

    /// Number of rows (latitudes).
    pub fn ny(&self) -> usize {
        self.lats.len()
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx() * self.ny()
    }

    pub fn is_empty(&self) -> bool {
        self.lats.is_empty() || self.lons.is_empty()
    }

    /// Geographic coordinate of a cell as `(lon, lat)`.
    pub fn coord(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        Some((*self.lons.get(col)?, *self.lats.get(row)?))
    }

    /// Bounding box spanned by the cell centres.
    pub fn bbox(&self) -> BoundingBox {
        let (lon0, lon1) = (self.lons[0], self.lons[self.nx() - 1]);
        let (lat0, lat1) = (self.lats[0], self.lats[self.ny() - 1]);
        BoundingBox::new(lon0.min(lon1), lat0.min(lat1), lon0.max(lon1), lat0.max(lat1))
    }

    /// Row/column of the cell nearest to `(lon, lat)`.
    pub fn nearest(&self, lon: f64, lat: f64) -> (usize, usize) {
        (nearest_index(&self.lats, lat), nearest_index(&self.lons, lon))
    }

    /// Index ranges of the rows and columns that fall inside `bbox`.
    ///
    /// Fails with `EmptySelection` when the box misses the grid entirely.
    pub fn crop_ranges(&self, bbox: &BoundingBox) -> WxResult<(Range<usize>, Range<usize>)> {
        let rows = axis_range(&self.lats, bbox.min_y, bbox.max_y);
        let cols = axis_range(&self.lons, bbox.min_x, bbox.max_x);
        if rows.is_empty() || cols.is_empty() {
            return Err(WxError::EmptySelection(format!(
                "bounding box {:?} does not overlap the grid {:?}",
                bbox,
                self.bbox()
            )));
        }
        Ok((rows, cols))
    }

    /// Sub-grid for the given index ranges.
    pub fn subgrid(&self, rows: Range<usize>, cols: Range<usize>) -> LatLonGrid {
        LatLonGrid {
            lats: self.lats[rows].to_vec(),
            lons: self.lons[cols].to_vec(),
        }
    }

    /// Wrap longitudes from 0..360 into -180..180.
    ///
    /// Returns the column permutation that keeps the axis ascending, or
    /// `None` when every longitude is already within range.
    pub fn wrap_longitudes(&mut self) -> Option<Vec<usize>> {
        if self.lons.iter().all(|&lon| lon <= 180.0) {
            return None;
        }
        let wrapped: Vec<f64> = self
            .lons
            .iter()
            .map(|&lon| ((lon + 180.0).rem_euclid(360.0)) - 180.0)
            .collect();
        let mut order: Vec<usize> = (0..wrapped.len()).collect();
        order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));
        self.lons = order.iter().map(|&i| wrapped[i]).collect();
        Some(order)
    }
}

/// Index of the axis value nearest to `value` (ascending or descending axis).
pub fn nearest_index(axis: &[f64], value: f64) -> usize {
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - value).abs().total_cmp(&(*b - value).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Contiguous index range of axis values inside `[lo, hi]`.
fn axis_range(axis: &[f64], lo: f64, hi: f64) -> Range<usize> {
    let inside: Vec<usize> = axis
        .iter()
        .enumerate()
        .filter(|(_, &v)| v >= lo && v <= hi)
        .map(|(i, _)| i)
        .collect();
    match (inside.first(), inside.last()) {
        (Some(&first), Some(&last)) => first..last + 1,
        _ => 0..0,
    }
}

fn is_monotonic(axis: &[f64]) -> bool {
    let ascending = axis.windows(2).all(|w| w[1] > w[0]);
    let descending = axis.windows(2).all(|w| w[1] < w[0]);
    ascending || descending
}
