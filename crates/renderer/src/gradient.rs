//! Filled contour (banded) rendering for gridded data.
//!
//! Each output pixel is mapped back to a fractional grid position, the grid
//! is sampled bilinearly and the value is colored by the band it falls in.
//! Pixels that map outside the grid or onto NaN stay transparent.

use rayon::prelude::*;

use crate::colormap::{Color, Colormap, DiscreteColormap};
use crate::error::{RenderError, RenderResult};
use crate::view::GridView;

/// Which out-of-range values get a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extend {
    #[default]
    Neither,
    Min,
    Max,
    Both,
}

impl Extend {
    fn low(self) -> bool {
        matches!(self, Extend::Min | Extend::Both)
    }

    fn high(self) -> bool {
        matches!(self, Extend::Max | Extend::Both)
    }
}

/// Band boundaries with one color per band and optional extension colors.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledLevels {
    levels: Vec<f32>,
    colors: Vec<Color>,
    under: Option<Color>,
    over: Option<Color>,
}

impl FilledLevels {
    /// Color each band with the colormap value at its midpoint, normalized
    /// over the full level range. Extension colors are the colormap ends.
    pub fn from_colormap(cmap: &Colormap, levels: Vec<f32>, extend: Extend) -> RenderResult<Self> {
        if levels.len() < 2 {
            return Err(RenderError::invalid(
                "levels",
                format!("filled contours need at least two levels, got {}", levels.len()),
            ));
        }
        if levels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RenderError::invalid("levels", "levels must be increasing"));
        }
        let (lo, hi) = (levels[0], levels[levels.len() - 1]);
        let colors = levels
            .windows(2)
            .map(|w| cmap.sample((0.5 * (w[0] + w[1]) - lo) / (hi - lo)))
            .collect();
        Ok(Self {
            levels,
            colors,
            under: extend.low().then(|| cmap.sample(0.0)),
            over: extend.high().then(|| cmap.sample(1.0)),
        })
    }

    /// Bands of a discrete colormap; its last color becomes the upper
    /// extension and values below the first level use the first color.
    pub fn from_discrete(cmap: &DiscreteColormap) -> Self {
        let colors = cmap.colors();
        Self {
            levels: cmap.levels().to_vec(),
            colors: colors[..colors.len() - 1].to_vec(),
            under: Some(colors[0]),
            over: Some(cmap.extend_color()),
        }
    }

    /// Same bands at a uniform opacity, for drawing over a background.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        for c in self.colors.iter_mut() {
            *c = c.with_alpha(alpha);
        }
        self.under = self.under.map(|c| c.with_alpha(alpha));
        self.over = self.over.map(|c| c.with_alpha(alpha));
        self
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    /// One color per band (`levels.len() - 1`).
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn under(&self) -> Option<Color> {
        self.under
    }

    pub fn over(&self) -> Option<Color> {
        self.over
    }

    /// Band color for `value`. The top boundary belongs to the last band.
    pub fn color_for(&self, value: f32) -> Option<Color> {
        if value.is_nan() {
            return None;
        }
        let n = self.levels.len();
        if value < self.levels[0] {
            return self.under;
        }
        if value > self.levels[n - 1] {
            return self.over;
        }
        let idx = self
            .levels
            .partition_point(|&l| l <= value)
            .saturating_sub(1)
            .min(n - 2);
        Some(self.colors[idx])
    }
}

/// Integer levels `start, start + step, ...` strictly below `end`, with
/// both ends truncated toward zero first.
pub fn arange_levels(min: f32, max: f32, step: f32) -> Vec<f32> {
    if step <= 0.0 || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    let start = min.trunc();
    let end = max.trunc();
    let count = ((end - start) / step).ceil().max(0.0) as usize;
    (0..count).map(|i| start + step * i as f32).collect()
}

/// Render bands into an RGBA buffer of `out_width` x `out_height`.
///
/// `locate` maps a pixel (column, row) to a fractional grid position
/// `(row, col)`, or `None` when the pixel has no data behind it.
pub fn render_filled<F>(
    grid: &GridView<'_>,
    out_width: usize,
    out_height: usize,
    levels: &FilledLevels,
    locate: F,
) -> Vec<u8>
where
    F: Fn(usize, usize) -> Option<(f64, f64)> + Sync,
{
    let mut pixels = vec![0u8; out_width * out_height * 4];
    if out_width == 0 {
        return pixels;
    }
    pixels
        .par_chunks_mut(out_width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            for px in 0..out_width {
                let Some((gy, gx)) = locate(px, py) else {
                    continue;
                };
                if let Some(color) = levels.color_for(grid.sample(gy, gx)) {
                    let idx = px * 4;
                    row[idx] = color.r;
                    row[idx + 1] = color.g;
                    row[idx + 2] = color.b;
                    row[idx + 3] = color.a;
                }
            }
        });
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_ramp() -> Colormap {
        Colormap::from_colors("gray", &[Color::BLACK, Color::WHITE], 256).unwrap()
    }

    #[test]
    fn test_band_colors_from_midpoints() {
        let levels = FilledLevels::from_colormap(&gray_ramp(), vec![0.0, 1.0, 2.0], Extend::Neither)
            .unwrap();
        assert_eq!(levels.colors().len(), 2);
        assert!(levels.colors()[0].r < 80);
        assert!(levels.colors()[1].r > 170);
        assert_eq!(levels.color_for(-0.1), None);
        assert_eq!(levels.color_for(2.0), Some(levels.colors()[1]));
    }

    #[test]
    fn test_extend_both_uses_colormap_ends() {
        let levels =
            FilledLevels::from_colormap(&gray_ramp(), vec![0.0, 1.0], Extend::Both).unwrap();
        assert_eq!(levels.color_for(-5.0), Some(Color::BLACK));
        assert_eq!(levels.color_for(5.0), Some(Color::WHITE));
    }

    #[test]
    fn test_arange_levels_truncates() {
        assert_eq!(arange_levels(-3.7, 2.2, 1.0), vec![-3.0, -2.0, -1.0, 0.0, 1.0]);
        assert_eq!(arange_levels(1510.0, 1590.0, 25.0), vec![1510.0, 1535.0, 1560.0, 1585.0]);
        assert!(arange_levels(1.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_render_filled_leaves_nan_transparent() {
        let data = [0.5, f32::NAN, 1.5, 1.5];
        let grid = GridView::new(&data, 2, 2).unwrap();
        let levels = FilledLevels::from_colormap(&gray_ramp(), vec![0.0, 1.0, 2.0], Extend::Neither)
            .unwrap();
        let pixels = render_filled(&grid, 2, 2, &levels, |px, py| Some((py as f64, px as f64)));
        assert_eq!(pixels[3], 255);
        assert_eq!(pixels[7], 0);
        assert_eq!(&pixels[8..11], &[levels.colors()[1].r; 3]);
    }
}
