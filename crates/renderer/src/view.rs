//! Borrowed 2D views over row-major field slices and axis lookups.

use crate::error::{RenderError, RenderResult};

/// A row-major 2D grid of values borrowed from a field slice.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    pub data: &'a [f32],
    pub width: usize,
    pub height: usize,
}

impl<'a> GridView<'a> {
    pub fn new(data: &'a [f32], width: usize, height: usize) -> RenderResult<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(RenderError::invalid(
                "grid",
                format!(
                    "{} values do not fill a {}x{} grid",
                    data.len(),
                    width,
                    height
                ),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    /// Bilinear sample at a fractional position. NaN if a contributing cell
    /// is NaN or the position is outside the grid.
    pub fn sample(&self, row: f64, col: f64) -> f32 {
        if row < 0.0 || col < 0.0 {
            return f32::NAN;
        }
        let y1 = row.floor() as usize;
        let x1 = col.floor() as usize;
        if y1 >= self.height || x1 >= self.width {
            return f32::NAN;
        }
        let dx = (col - x1 as f64) as f32;
        let dy = (row - y1 as f64) as f32;
        let x2 = if dx > 0.0 { (x1 + 1).min(self.width - 1) } else { x1 };
        let y2 = if dy > 0.0 { (y1 + 1).min(self.height - 1) } else { y1 };

        let v11 = self.get(y1, x1);
        let v21 = self.get(y1, x2);
        let v12 = self.get(y2, x1);
        let v22 = self.get(y2, x2);

        let v1 = v11 * (1.0 - dx) + v21 * dx;
        let v2 = v12 * (1.0 - dx) + v22 * dx;
        v1 * (1.0 - dy) + v2 * dy
    }

    /// Smallest finite value.
    pub fn min(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f32| m.min(v))))
    }

    /// Largest finite value.
    pub fn max(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f32| m.max(v))))
    }
}

/// Fractional index of `value` on a monotonic axis, `None` outside it.
///
/// A single-point axis only matches its own value.
pub fn fractional_index(axis: &[f64], value: f64) -> Option<f64> {
    match axis.len() {
        0 => None,
        1 => ((axis[0] - value).abs() < 1e-9).then_some(0.0),
        n => {
            let ascending = axis[n - 1] > axis[0];
            let (lo, hi) = if ascending {
                (axis[0], axis[n - 1])
            } else {
                (axis[n - 1], axis[0])
            };
            if value < lo || value > hi {
                return None;
            }
            let upper = if ascending {
                axis.partition_point(|&a| a < value)
            } else {
                axis.partition_point(|&a| a > value)
            };
            if upper == 0 {
                return Some(0.0);
            }
            let (a0, a1) = (axis[upper - 1], axis[upper.min(n - 1)]);
            if a1 == a0 {
                return Some((upper - 1) as f64);
            }
            Some((upper - 1) as f64 + (value - a0) / (a1 - a0))
        }
    }
}

/// Axis value at a fractional index, linear between neighbours.
pub fn axis_value(axis: &[f64], index: f64) -> f64 {
    let n = axis.len();
    if n == 1 {
        return axis[0];
    }
    let i = (index.floor().max(0.0) as usize).min(n - 2);
    let t = index - i as f64;
    axis[i] + (axis[i + 1] - axis[i]) * t
}
