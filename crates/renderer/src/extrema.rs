//! Local maxima/minima detection for marking pressure centres ("H"/"L").
//!
//! A cell is a local extremum when it equals the maximum (or minimum) of
//! the `size` x `size` window around it. The window filter is separable and
//! clamps at the edges (nearest mode). Cells on the first row or column are
//! never reported, and a connected plateau of equal qualifying values is
//! reported once, at its first cell in row-major order.
//!
//! Optionally a small normal perturbation is added to the field before
//! filtering so that flat areas do not produce clusters of detections.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use wx_common::LatLonGrid;

use crate::error::{RenderError, RenderResult};
use crate::view::GridView;

/// Standard deviation of the tie-breaking perturbation, in field units.
pub const DEFAULT_PERTURBATION: f32 = 0.2;

/// Kind of extremum to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Max,
    Min,
}

impl ExtremumKind {
    fn pick(self, a: f32, b: f32) -> f32 {
        match self {
            ExtremumKind::Max => a.max(b),
            ExtremumKind::Min => a.min(b),
        }
    }
}

impl fmt::Display for ExtremumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtremumKind::Max => f.write_str("max"),
            ExtremumKind::Min => f.write_str("min"),
        }
    }
}

impl FromStr for ExtremumKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(ExtremumKind::Max),
            "min" => Ok(ExtremumKind::Min),
            other => Err(RenderError::invalid(
                "extrema",
                format!("must be either max or min, got '{}'", other),
            )),
        }
    }
}

/// A detected extremum with its map labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremum {
    pub row: usize,
    pub col: usize,
    pub lon: f64,
    pub lat: f64,
    /// Unperturbed field value at the cell
    pub value: f32,
    /// Caller-supplied symbol, e.g. "H"
    pub symbol: String,
    /// Rounded value printed under the symbol
    pub label: String,
}

/// Sliding-window extrema detector.
#[derive(Debug, Clone)]
pub struct ExtremaFinder {
    pub kind: ExtremumKind,
    /// Window size in grid cells
    pub size: usize,
    /// Standard deviation of the perturbation, `None` to disable
    pub perturbation: Option<f32>,
}

impl ExtremaFinder {
    pub fn new(kind: ExtremumKind, size: usize) -> Self {
        Self {
            kind,
            size,
            perturbation: None,
        }
    }

    pub fn with_perturbation(mut self, sigma: f32) -> Self {
        self.perturbation = Some(sigma);
        self
    }

    /// Qualifying `(row, col)` cells, perturbing with the thread RNG.
    pub fn find(&self, grid: &GridView<'_>) -> RenderResult<Vec<(usize, usize)>> {
        self.find_with_rng(grid, &mut rand::thread_rng())
    }

    /// Qualifying `(row, col)` cells in row-major order.
    pub fn find_with_rng<R: Rng + ?Sized>(
        &self,
        grid: &GridView<'_>,
        rng: &mut R,
    ) -> RenderResult<Vec<(usize, usize)>> {
        if self.size == 0 {
            return Err(RenderError::invalid("size", "neighbourhood size must be positive"));
        }
        let values: Vec<f32> = match self.perturbation {
            Some(sigma) => {
                let noise = Normal::new(0.0f32, sigma)
                    .map_err(|e| RenderError::invalid("perturbation", e.to_string()))?;
                grid.data
                    .iter()
                    .map(|&v| if v.is_nan() { v } else { v + noise.sample(rng) })
                    .collect()
            }
            None => grid.data.to_vec(),
        };

        let filtered = window_filter(&values, grid.width, grid.height, self.size, self.kind);
        let qualifies = |r: usize, c: usize| {
            let i = r * grid.width + c;
            r != 0 && c != 0 && !values[i].is_nan() && filtered[i] == values[i]
        };

        let mut seen = vec![false; values.len()];
        let mut found = Vec::new();
        for r in 0..grid.height {
            for c in 0..grid.width {
                if seen[r * grid.width + c] || !qualifies(r, c) {
                    continue;
                }
                found.push((r, c));
                // Mark the plateau this cell belongs to.
                let value = values[r * grid.width + c];
                let mut stack = vec![(r, c)];
                seen[r * grid.width + c] = true;
                while let Some((pr, pc)) = stack.pop() {
                    for (nr, nc) in neighbours(pr, pc, grid.height, grid.width) {
                        let ni = nr * grid.width + nc;
                        if !seen[ni] && values[ni] == value && qualifies(nr, nc) {
                            seen[ni] = true;
                            stack.push((nr, nc));
                        }
                    }
                }
            }
        }
        tracing::debug!(kind = %self.kind, size = self.size, found = found.len(), "Extrema detected");
        Ok(found)
    }

    /// Detect extrema and label them with `symbol` and the rounded value.
    pub fn annotate(
        &self,
        grid: &GridView<'_>,
        coords: &LatLonGrid,
        symbol: &str,
    ) -> RenderResult<Vec<Extremum>> {
        if coords.ny() != grid.height || coords.nx() != grid.width {
            return Err(RenderError::invalid(
                "grid",
                format!(
                    "field is {}x{} but coordinates are {}x{}",
                    grid.height,
                    grid.width,
                    coords.ny(),
                    coords.nx()
                ),
            ));
        }
        let cells = self.find(grid)?;
        Ok(label_cells(grid, coords, &cells, symbol))
    }
}

/// Attach coordinates and labels to detected cells.
pub fn label_cells(
    grid: &GridView<'_>,
    coords: &LatLonGrid,
    cells: &[(usize, usize)],
    symbol: &str,
) -> Vec<Extremum> {
    cells
        .iter()
        .filter_map(|&(row, col)| {
            let (lon, lat) = coords.coord(row, col)?;
            let value = grid.get(row, col);
            Some(Extremum {
                row,
                col,
                lon,
                lat,
                value,
                symbol: symbol.to_string(),
                label: format!("{}", value.round() as i64),
            })
        })
        .collect()
}

fn neighbours(r: usize, c: usize, height: usize, width: usize) -> impl Iterator<Item = (usize, usize)> {
    let rows = r.saturating_sub(1)..=(r + 1).min(height - 1);
    rows.flat_map(move |nr| {
        let cols = c.saturating_sub(1)..=(c + 1).min(width - 1);
        cols.map(move |nc| (nr, nc))
    })
    .filter(move |&(nr, nc)| (nr, nc) != (r, c))
}

/// Separable max/min filter with nearest-edge handling. The window for
/// index `i` spans `[i - size/2, i - size/2 + size - 1]`, clamped. NaN cells
/// do not contribute.
fn window_filter(values: &[f32], width: usize, height: usize, size: usize, kind: ExtremumKind) -> Vec<f32> {
    let half = size / 2;
    let reduce = |line: &[f32], out: &mut [f32]| {
        let n = line.len();
        for (i, slot) in out.iter_mut().enumerate() {
            let lo = i.saturating_sub(half);
            let hi = (i + size).saturating_sub(half + 1).min(n - 1);
            *slot = line[lo..=hi]
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .reduce(|a, b| kind.pick(a, b))
                .unwrap_or(f32::NAN);
        }
    };

    let mut rows_done = vec![0.0f32; values.len()];
    for r in 0..height {
        let range = r * width..(r + 1) * width;
        reduce(&values[range.clone()], &mut rows_done[range]);
    }

    let mut result = vec![0.0f32; values.len()];
    let mut column = vec![0.0f32; height];
    let mut filtered = vec![0.0f32; height];
    for c in 0..width {
        for r in 0..height {
            column[r] = rows_done[r * width + c];
        }
        reduce(&column, &mut filtered);
        for r in 0..height {
            result[r * width + c] = filtered[r];
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_clamped_and_asymmetric() {
        // size 2: window is [i - 1, i]
        let line = [1.0, 5.0, 2.0, 3.0];
        let out = window_filter(&line, 4, 1, 2, ExtremumKind::Max);
        assert_eq!(out, vec![1.0, 5.0, 5.0, 3.0]);
        // size 3: window is [i - 1, i + 1]
        let out = window_filter(&line, 4, 1, 3, ExtremumKind::Min);
        assert_eq!(out, vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("max".parse::<ExtremumKind>().unwrap(), ExtremumKind::Max);
        assert_eq!("min".parse::<ExtremumKind>().unwrap(), ExtremumKind::Min);
        assert!(matches!(
            "maximum".parse::<ExtremumKind>(),
            Err(RenderError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_nan_cells_never_qualify() {
        let mut data = vec![1.0f32; 16];
        data[5] = f32::NAN;
        data[10] = 3.0;
        let grid = GridView::new(&data, 4, 4).unwrap();
        let found = ExtremaFinder::new(ExtremumKind::Max, 4).find(&grid).unwrap();
        assert_eq!(found, vec![(2, 2)]);
    }
}
