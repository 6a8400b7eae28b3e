//! Temperature and geopotential chart of one time step.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use renderer::chart::{self, Orientation};
use renderer::extrema::DEFAULT_PERTURBATION;
use renderer::{
    Anchor, Boundaries, Canvas, Color, Colormap, ContourConfig, Extend, ExtremaFinder, ExtremumKind, FilledLevels,
    GridView, LineStyle, MapView, Rect,
};
use rusttype::Font;
use tracing::{debug, info};
use wx_common::{Region, ValidTime};

use crate::level::{LevelSlice, GEOPOTENTIAL_HEIGHT, TEMPERATURE};

pub const WIDTH: u32 = 1100;
pub const HEIGHT: u32 = 900;

/// Prefix of every output file.
pub const VARIABLE_NAME: &str = "t";

/// Area available to the map; the map keeps the region's aspect inside it.
const MAP_AREA: Rect = Rect {
    left: 30.0,
    top: 20.0,
    width: 1040.0,
    height: 780.0,
};
const COLORBAR_HEIGHT: f32 = 16.0;
const COLORBAR_GAP: f32 = 28.0;

/// Extrema search window in grid cells.
const EXTREMA_WINDOW: usize = 100;
const GRID_SPACING: f64 = 2.0;
const ANNOTATION_SIZE: f32 = 11.0;
const TITLE_SIZE: f32 = 9.0;
const LOGO_ZOOM: f32 = 0.1;
const LOGO_POS: (f32, f32) = (0.95, 0.08);
/// Opacity of the temperature bands over a map background.
const BACKGROUND_ALPHA: f32 = 0.6;

/// Static inputs shared by every chart of a run.
#[derive(Default)]
pub struct MapAssets {
    pub boundaries: Option<Boundaries>,
    pub coastlines: Option<Boundaries>,
    pub logo: Option<RgbaImage>,
    pub background: Option<RgbaImage>,
    pub font: Option<Arc<Font<'static>>>,
}

/// Output file `<dir>/t_<level>_<forecast hour>.png`.
pub fn output_file(dir: &Path, level: u32, forecast_hour: i64) -> PathBuf {
    dir.join(format!("{}_{}_{}.png", VARIABLE_NAME, level, forecast_hour))
}

/// Largest rectangle with height/width `aspect` centred in `area`.
pub fn fit_map_rect(area: Rect, aspect: f64) -> Rect {
    let aspect = aspect as f32;
    let (width, height) = if area.width * aspect <= area.height {
        (area.width, area.width * aspect)
    } else {
        (area.height / aspect, area.height)
    };
    Rect::new(
        area.left + (area.width - width) / 2.0,
        area.top + (area.height - height) / 2.0,
        width,
        height,
    )
}

/// Draws the temperature charts of one region.
pub struct MapPlotter {
    region: Region,
    view: MapView,
    colormap: Colormap,
    assets: MapAssets,
    timezone: chrono_tz::Tz,
    output_dir: PathBuf,
}

impl MapPlotter {
    pub fn new(
        region: Region,
        colormap: Colormap,
        assets: MapAssets,
        timezone: chrono_tz::Tz,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let bbox = region.bbox();
        Self {
            region,
            view: MapView::new(fit_map_rect(MAP_AREA, bbox.aspect()), bbox),
            colormap,
            assets,
            timezone,
            output_dir: output_dir.into(),
        }
    }

    /// Draw every chart over `image`, stretched to the map area.
    pub fn with_background(mut self, image: RgbaImage) -> Self {
        self.assets.background = Some(image);
        self
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    fn filled_levels(&self, levels: &[f32]) -> Result<FilledLevels> {
        let filled = FilledLevels::from_colormap(&self.colormap, levels.to_vec(), Extend::Both)?;
        Ok(match self.assets.background {
            Some(_) => filled.with_alpha(BACKGROUND_ALPHA),
            None => filled,
        })
    }

    /// Draw time step `t` of `slice`.
    pub fn render_step(&self, slice: &LevelSlice, t: usize, valid: &ValidTime) -> Result<Canvas> {
        let dataset = &slice.dataset;
        let grid = &dataset.grid;
        let (ny, nx) = (grid.ny(), grid.nx());
        let temperature = dataset.field_any(&TEMPERATURE)?;
        let geop = dataset.field(GEOPOTENTIAL_HEIGHT)?;
        let temp_view = GridView::new(temperature.slice2d(t, 0), nx, ny)?;
        let geop_view = GridView::new(geop.slice2d(t, 0), nx, ny)?;

        let mut canvas = Canvas::new(WIDTH, HEIGHT, Color::WHITE)?.with_font(self.assets.font.clone());
        let view = &self.view;

        if let Some(background) = &self.assets.background {
            view.background(&mut canvas, background);
        }
        let levels = self.filled_levels(&slice.temp_levels)?;
        view.filled(&mut canvas, &temp_view, grid, &levels)?;

        let isolines = ContourConfig {
            levels: slice.geop_levels.clone(),
            line_color: Color::WHITE,
            line_width: 1.0,
            labels_enabled: true,
            ..ContourConfig::default()
        };
        view.contours(&mut canvas, &geop_view, grid, &isolines)?;

        let highs = ExtremaFinder::new(ExtremumKind::Max, EXTREMA_WINDOW)
            .with_perturbation(DEFAULT_PERTURBATION)
            .annotate(&geop_view, grid, "H")?;
        let lows = ExtremaFinder::new(ExtremumKind::Min, EXTREMA_WINDOW)
            .with_perturbation(DEFAULT_PERTURBATION)
            .annotate(&geop_view, grid, "L")?;
        view.extrema(&mut canvas, &highs, Color::ROYAL_BLUE);
        view.extrema(&mut canvas, &lows, Color::CORAL);

        if let Some(boundaries) = &self.assets.boundaries {
            view.boundaries(&mut canvas, boundaries, &LineStyle::solid(Color::BLACK, 0.2))?;
        }
        if let Some(coastlines) = &self.assets.coastlines {
            view.boundaries(&mut canvas, coastlines, &LineStyle::solid(Color::BLACK, 0.5))?;
        }
        view.gridlines(&mut canvas, GRID_SPACING, &LineStyle::solid(Color::WHITE, 0.2))?;
        view.frame(&mut canvas)?;

        let rect = view.rect();
        chart::annotate(
            &mut canvas,
            &rect,
            Anchor::TopLeft,
            ANNOTATION_SIZE,
            &valid.valid_label(self.timezone),
        );
        chart::annotate(
            &mut canvas,
            &rect,
            Anchor::BottomLeft,
            TITLE_SIZE,
            &format!("Temperature and Geopotential at {} hPa", slice.level),
        );
        chart::annotate(&mut canvas, &rect, Anchor::TopRight, ANNOTATION_SIZE, &valid.run_label());
        if let Some(logo) = &self.assets.logo {
            view.logo(&mut canvas, logo, LOGO_ZOOM, LOGO_POS);
        }

        let bar = Rect::new(
            rect.left + rect.width * 0.1,
            rect.bottom() + COLORBAR_GAP,
            rect.width * 0.8,
            COLORBAR_HEIGHT,
        );
        let tick_every = (levels.levels().len() / 10).max(1);
        chart::colorbar(&mut canvas, bar, &levels, Orientation::Horizontal, tick_every, "Temperature")?;

        debug!(
            region = %self.region,
            level = slice.level,
            hour = valid.forecast_hour,
            highs = highs.len(),
            lows = lows.len(),
            "Map rendered"
        );
        Ok(canvas)
    }

    /// Render and save every step of `slice`, in order.
    pub fn plot_slice(&self, slice: &LevelSlice) -> Result<Vec<PathBuf>> {
        let valid_times = slice.dataset.valid_times()?;
        let mut written = Vec::with_capacity(valid_times.len());
        for (t, valid) in valid_times.iter().enumerate() {
            let canvas = self.render_step(slice, t, valid)?;
            let path = output_file(&self.output_dir, slice.level, valid.forecast_hour);
            canvas
                .save_png(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            written.push(path);
        }
        if let (Some(first), Some(last)) = (valid_times.first(), valid_times.last()) {
            info!(
                level = slice.level,
                from_hour = first.forecast_hour,
                to_hour = last.forecast_hour,
                "Chunk plotted"
            );
        }
        Ok(written)
    }
}
