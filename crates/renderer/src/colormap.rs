//! Colors, continuous colormaps and discrete (level-based) colormaps.
//!
//! Continuous colormaps are lookup tables sampled over `[0, 1]`. They are
//! either read from `cmap_<name>.rgba` tables (CSV, one header row, then
//! R,G,B,A columns in 0..1) or built from one of the named palettes.
//!
//! Discrete colormaps pair a list of boundary levels with exactly as many
//! colors: one per bin plus the "extend" color used at and above the top
//! boundary.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{RenderError, RenderResult};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const DARK_CYAN: Color = Color::rgb(0, 139, 139);
    pub const LIGHT_CORAL: Color = Color::rgb(240, 128, 128);
    pub const MAGENTA: Color = Color::rgb(191, 0, 191);
    pub const DODGER_BLUE: Color = Color::rgb(30, 144, 255);
    pub const ORCHID: Color = Color::rgb(218, 112, 214);
    pub const ROYAL_BLUE: Color = Color::rgb(65, 105, 225);
    pub const CORAL: Color = Color::rgb(255, 127, 80);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Build from channels in 0..1, clamping out-of-range input.
    pub fn from_unit(r: f32, g: f32, b: f32, a: f32) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(q(r), q(g), q(b), q(a))
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Same color with its alpha scaled by `alpha` (0..1).
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (self.a as f32 * alpha.clamp(0.0, 1.0)).round() as u8,
            ..self
        }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Linear interpolation between two colors, `t` in 0..1.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// A continuous colormap: a lookup table sampled uniformly over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: String,
    lut: Vec<Color>,
}

/// Number of entries used for the named palettes.
const NAMED_LUT_SIZE: usize = 256;

const BLUES: [&str; 9] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];

const PURD: [&str; 9] = [
    "#f7f4f9", "#e7e1ef", "#d4b9da", "#c994c7", "#df65b0", "#e7298a", "#ce1256", "#980043",
    "#67001f",
];

/// Breakpoints of `gist_stern`. The red channel jumps at 0.25, hence the
/// repeated position.
const GIST_STERN: [(f32, [f32; 3]); 7] = [
    (0.0, [0.0, 0.0, 0.0]),
    (0.0547, [1.0, 0.0547, 0.1094]),
    (0.25, [0.027, 0.25, 0.5]),
    (0.25, [0.25, 0.25, 0.5]),
    (0.5, [0.5, 0.5, 1.0]),
    (0.735, [0.735, 0.735, 0.0]),
    (1.0, [1.0, 1.0, 1.0]),
];

impl Colormap {
    /// Build a lookup table of `n` entries from piecewise-linear stops.
    ///
    /// Stop positions must be ascending within `[0, 1]`, start at 0 and end
    /// at 1. A repeated position makes a discontinuity.
    pub fn from_stops(name: &str, stops: &[(f32, Color)], n: usize) -> RenderResult<Self> {
        if stops.len() < 2 || n == 0 {
            return Err(RenderError::invalid(
                "stops",
                format!("colormap '{}' needs at least two stops", name),
            ));
        }
        if stops.windows(2).any(|w| w[1].0 < w[0].0) {
            return Err(RenderError::invalid(
                "stops",
                format!("colormap '{}' stops are not ascending", name),
            ));
        }
        let lut = (0..n)
            .map(|i| {
                let x = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
                interpolate_stops(stops, x)
            })
            .collect();
        Ok(Self {
            name: name.to_string(),
            lut,
        })
    }

    /// Evenly spaced colors, as `LinearSegmentedColormap.from_list` does.
    pub fn from_colors(name: &str, colors: &[Color], n: usize) -> RenderResult<Self> {
        if colors.len() == 1 {
            return Ok(Self {
                name: name.to_string(),
                lut: vec![colors[0]; n.max(1)],
            });
        }
        let last = colors.len().saturating_sub(1).max(1) as f32;
        let stops: Vec<(f32, Color)> = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (i as f32 / last, *c))
            .collect();
        Self::from_stops(name, &stops, n)
    }

    /// Read a `.rgba` table. The lookup table has as many entries as rows.
    pub fn from_rgba_reader<R: Read>(name: &str, reader: R) -> RenderResult<Self> {
        let colors = read_rgba_rows(reader)?;
        if colors.is_empty() {
            return Err(RenderError::Config(format!(
                "colormap table '{}' has no rows",
                name
            )));
        }
        Self::from_colors(name, &colors, colors.len())
    }

    /// Read `cmap_<name>.rgba`; the colormap is named after the file.
    pub fn from_rgba_file(path: &Path) -> RenderResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RenderError::NotFound(path.to_path_buf()),
            _ => RenderError::Io(e),
        })?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let name = stem.strip_prefix("cmap_").unwrap_or(stem);
        Self::from_rgba_reader(name, file)
    }

    /// One of the named palettes, optionally reversed with an `_r` suffix.
    pub fn named(name: &str) -> RenderResult<Self> {
        if let Some(base) = name.strip_suffix("_r") {
            let mut cmap = Self::named(base)?.reversed();
            cmap.name = name.to_string();
            return Ok(cmap);
        }
        let hex = |list: &[&str]| -> Vec<Color> {
            list.iter().filter_map(|h| Color::from_hex(h)).collect()
        };
        match name {
            "Blues" => Self::from_colors(name, &hex(&BLUES), NAMED_LUT_SIZE),
            "PuRd" => Self::from_colors(name, &hex(&PURD), NAMED_LUT_SIZE),
            "gist_stern" => {
                let stops: Vec<(f32, Color)> = GIST_STERN
                    .iter()
                    .map(|(x, [r, g, b])| (*x, Color::from_unit(*r, *g, *b, 1.0)))
                    .collect();
                Self::from_stops(name, &stops, NAMED_LUT_SIZE)
            }
            other => Err(RenderError::Config(format!("unknown palette '{}'", other))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.lut.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lut.is_empty()
    }

    pub fn reversed(&self) -> Self {
        Self {
            name: format!("{}_r", self.name),
            lut: self.lut.iter().rev().copied().collect(),
        }
    }

    /// Color at `t` in `[0, 1]`; out-of-range input clamps, NaN is transparent.
    pub fn sample(&self, t: f32) -> Color {
        if t.is_nan() || self.lut.is_empty() {
            return Color::transparent();
        }
        let n = self.lut.len();
        let idx = (t * n as f32).floor().clamp(0.0, (n - 1) as f32) as usize;
        self.lut[idx]
    }

    /// New colormap covering only `[min, max]` of this one, in `n` entries.
    pub fn truncate(&self, min: f32, max: f32, n: usize) -> RenderResult<Self> {
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min >= max {
            return Err(RenderError::invalid(
                "truncate",
                format!("range [{}, {}] is not inside [0, 1]", min, max),
            ));
        }
        let colors: Vec<Color> = (0..n)
            .map(|i| {
                let x = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 };
                self.sample(min + (max - min) * x)
            })
            .collect();
        Self::from_colors(
            &format!("trunc({},{:.2},{:.2})", self.name, min, max),
            &colors,
            n,
        )
    }

    /// `n` colors drawn from the interior of the map, skipping both ends.
    pub fn palette(&self, n: usize) -> Vec<Color> {
        (1..=n)
            .map(|i| self.sample(i as f32 / (n + 1) as f32))
            .collect()
    }
}

fn interpolate_stops(stops: &[(f32, Color)], x: f32) -> Color {
    let last = stops.len() - 1;
    if x <= stops[0].0 {
        return stops[0].1;
    }
    if x >= stops[last].0 {
        return stops[last].1;
    }
    for w in stops.windows(2) {
        let ((x0, c0), (x1, c1)) = (w[0], w[1]);
        if x >= x0 && x < x1 {
            return c0.lerp(c1, (x - x0) / (x1 - x0));
        }
    }
    stops[last].1
}

/// Parse the R,G,B,A rows (0..1) of a colormap table.
pub fn read_rgba_rows<R: Read>(reader: R) -> RenderResult<Vec<Color>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut colors = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .take(4)
            .map(|v| v.parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RenderError::Config(format!("row {}: {}", line + 1, e)))?;
        match values.as_slice() {
            [r, g, b, a] => colors.push(Color::from_unit(*r, *g, *b, *a)),
            [r, g, b] => colors.push(Color::from_unit(*r, *g, *b, 1.0)),
            _ => {
                return Err(RenderError::Config(format!(
                    "row {}: expected R,G,B[,A] columns",
                    line + 1
                )))
            }
        }
    }
    Ok(colors)
}

/// Discrete mapping from boundary levels to colors.
///
/// Values in `[levels[i], levels[i + 1])` take `colors[i]`; values at or
/// above the last level take the extend color (the last one). Values below
/// the first level take the first color.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteColormap {
    levels: Vec<f32>,
    colors: Vec<Color>,
}

impl DiscreteColormap {
    pub fn new(levels: Vec<f32>, colors: Vec<Color>) -> RenderResult<Self> {
        if levels.len() < 2 {
            return Err(RenderError::invalid("levels", "need at least two levels"));
        }
        if levels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RenderError::invalid("levels", "levels must be increasing"));
        }
        if colors.len() != levels.len() {
            return Err(RenderError::invalid(
                "colors",
                format!(
                    "{} levels with extend=max need {} colors, got {}",
                    levels.len(),
                    levels.len(),
                    colors.len()
                ),
            ));
        }
        Ok(Self { levels, colors })
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color used at and above the top boundary.
    pub fn extend_color(&self) -> Color {
        self.colors[self.colors.len() - 1]
    }

    /// Bin of `value`: `0..len-1` for the bins, `len-1` for the extension.
    pub fn bin(&self, value: f32) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let above = self.levels.partition_point(|&l| l <= value);
        Some(above.saturating_sub(1))
    }

    pub fn color_for(&self, value: f32) -> Option<Color> {
        self.bin(value).map(|i| self.colors[i])
    }
}

/// Named discrete color schemes for precipitation, snow and wind maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColormapCategory {
    Rain,
    Snow,
    SnowDiscrete,
    RainAcc,
    RainNew,
    Winds,
    RainAccWxcharts,
    SnowWxcharts,
}

const SNOW_DISCRETE: [&str; 11] = [
    "#DBF069", "#5AE463", "#E3BE45", "#65F8CA", "#32B8EB", "#1D64DE", "#E97BE4", "#F4F476",
    "#E78340", "#D73782", "#702072",
];

impl ColormapCategory {
    pub const ALL: [ColormapCategory; 8] = [
        ColormapCategory::Rain,
        ColormapCategory::Snow,
        ColormapCategory::SnowDiscrete,
        ColormapCategory::RainAcc,
        ColormapCategory::RainNew,
        ColormapCategory::Winds,
        ColormapCategory::RainAccWxcharts,
        ColormapCategory::SnowWxcharts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColormapCategory::Rain => "rain",
            ColormapCategory::Snow => "snow",
            ColormapCategory::SnowDiscrete => "snow_discrete",
            ColormapCategory::RainAcc => "rain_acc",
            ColormapCategory::RainNew => "rain_new",
            ColormapCategory::Winds => "winds",
            ColormapCategory::RainAccWxcharts => "rain_acc_wxcharts",
            ColormapCategory::SnowWxcharts => "snow_wxcharts",
        }
    }

    /// Table under the assets folder that holds the palette, if any.
    pub fn table_name(&self) -> Option<&'static str> {
        match self {
            ColormapCategory::RainNew => Some("prec"),
            ColormapCategory::Winds => Some("winds"),
            ColormapCategory::RainAccWxcharts => Some("rain_acc_wxcharts"),
            ColormapCategory::SnowWxcharts => Some("snow_wxcharts"),
            _ => None,
        }
    }

    /// Build the discrete colormap for `levels`.
    ///
    /// Table-backed categories read `cmap_<table>.rgba` from `assets_dir`
    /// and cycle its rows to the required length.
    pub fn colormap(&self, levels: &[f32], assets_dir: &Path) -> RenderResult<DiscreteColormap> {
        let n = levels.len();
        let colors = match self {
            ColormapCategory::Rain => Colormap::named("Blues")?.palette(n),
            ColormapCategory::Snow => Colormap::named("PuRd")?.palette(n),
            ColormapCategory::RainAcc => Colormap::named("gist_stern_r")?.palette(n),
            ColormapCategory::SnowDiscrete => SNOW_DISCRETE
                .iter()
                .filter_map(|h| Color::from_hex(h))
                .collect(),
            _ => {
                let table = self.table_name().unwrap_or_default();
                let path = assets_dir.join(format!("cmap_{}.rgba", table));
                let file = std::fs::File::open(&path)
                    .map_err(|_| RenderError::NotFound(path.clone()))?;
                let rows = read_rgba_rows(file)?;
                if rows.is_empty() {
                    return Err(RenderError::Config(format!(
                        "{} has no rows",
                        path.display()
                    )));
                }
                rows.iter()
                    .cycle()
                    .take(n)
                    .map(|c| Color { a: 255, ..*c })
                    .collect()
            }
        };
        DiscreteColormap::new(levels.to_vec(), colors)
    }
}

impl fmt::Display for ColormapCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColormapCategory {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColormapCategory::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| RenderError::Config(format!("unknown colormap category '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#DBF069"), Some(Color::rgb(0xDB, 0xF0, 0x69)));
        assert_eq!(Color::from_hex("00000080").map(|c| c.a), Some(128));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#GG0000"), None);
    }

    #[test]
    fn test_lut_matches_row_count() {
        let colors = [Color::BLACK, Color::WHITE];
        let cmap = Colormap::from_colors("bw", &colors, 2).unwrap();
        assert_eq!(cmap.len(), 2);
        assert_eq!(cmap.sample(0.0), Color::BLACK);
        assert_eq!(cmap.sample(0.49), Color::BLACK);
        assert_eq!(cmap.sample(0.5), Color::WHITE);
        assert_eq!(cmap.sample(1.0), Color::WHITE);
        assert_eq!(cmap.sample(f32::NAN), Color::transparent());
    }

    #[test]
    fn test_named_palettes_run_light_to_dark() {
        let blues = Colormap::named("Blues").unwrap();
        assert_eq!(blues.sample(0.0), Color::from_hex("#f7fbff").unwrap());
        assert_eq!(blues.sample(1.0), Color::from_hex("#08306b").unwrap());

        let stern_r = Colormap::named("gist_stern_r").unwrap();
        assert_eq!(stern_r.sample(0.0), Color::WHITE);
        assert_eq!(stern_r.sample(1.0), Color::BLACK);
        assert!(Colormap::named("viridis").is_err());
    }

    #[test]
    fn test_palette_skips_ends() {
        let cmap = Colormap::from_colors("bw", &[Color::BLACK, Color::WHITE], 256).unwrap();
        let palette = cmap.palette(3);
        assert_eq!(palette.len(), 3);
        assert_ne!(palette[0], Color::BLACK);
        assert_ne!(palette[2], Color::WHITE);
        assert!(palette[0].r < palette[1].r && palette[1].r < palette[2].r);
    }

    #[test]
    fn test_truncate() {
        let cmap = Colormap::from_colors("bw", &[Color::BLACK, Color::WHITE], 256).unwrap();
        let upper = cmap.truncate(0.5, 1.0, 64).unwrap();
        assert_eq!(upper.len(), 64);
        assert!(upper.sample(0.0).r >= 126);
        assert_eq!(upper.sample(1.0), Color::WHITE);
        assert!(cmap.truncate(0.8, 0.2, 10).is_err());
    }

    #[test]
    fn test_discrete_bins_and_extend() {
        let colors: Vec<Color> = (0..5).map(|i| Color::rgb(i * 10, 0, 0)).collect();
        let cmap = DiscreteColormap::new(vec![0.0, 1.0, 5.0, 10.0, 20.0], colors).unwrap();
        assert_eq!(cmap.bin(-1.0), Some(0));
        assert_eq!(cmap.bin(0.5), Some(0));
        assert_eq!(cmap.bin(1.0), Some(1));
        assert_eq!(cmap.bin(19.9), Some(3));
        assert_eq!(cmap.bin(20.0), Some(4));
        assert_eq!(cmap.color_for(25.0), Some(cmap.extend_color()));
        assert_eq!(cmap.color_for(f32::NAN), None);
    }

    #[test]
    fn test_discrete_requires_matching_colors() {
        let err = DiscreteColormap::new(vec![0.0, 1.0, 2.0], vec![Color::BLACK; 2]).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument { .. }));
    }

    #[test]
    fn test_category_names() {
        for category in ColormapCategory::ALL {
            assert_eq!(category.name().parse::<ColormapCategory>().unwrap(), category);
        }
        assert!(matches!(
            "hail".parse::<ColormapCategory>(),
            Err(RenderError::Config(_))
        ));
    }
}
