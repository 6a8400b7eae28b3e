//! Four-panel meteogram figure.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use renderer::barbs::{draw_barb, BarbConfig};
use renderer::chart::{self, time_value, LegendEntry, Orientation, Side};
use renderer::gradient::arange_levels;
use renderer::{
    Anchor, Axes, Canvas, Color, Colormap, ContourConfig, Extend, FilledLevels, GridView, IconResolver, LineStyle,
    Rect, Scale,
};
use rusttype::Font;
use tracing::debug;
use wx_common::time::run_label;

use crate::data::MeteogramData;

pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 1200;

const PLOT_AREA: Rect = Rect {
    left: 80.0,
    top: 30.0,
    width: 780.0,
    height: 1060.0,
};
const PANEL_RATIOS: [f32; 4] = [3.0, 1.0, 1.0, 1.0];
const PANEL_GAP: f32 = 24.0;
const COLORBAR: Rect = Rect {
    left: 920.0,
    top: 180.0,
    width: 20.0,
    height: 360.0,
};

const ANNOTATION_SIZE: f32 = 11.0;
const LEGEND_SIZE: f32 = 10.0;
/// Icon width in pixels.
const ICON_SIZE: f32 = 24.0;
const TICK_HOURS: u32 = 6;
const BARB_HOURS: i64 = 3;
const Y_LABEL_OFFSET: f32 = 42.0;

/// Temperature bands of the cross-section (°C).
pub fn temperature_levels(colormap: &Colormap) -> Result<FilledLevels> {
    Ok(FilledLevels::from_colormap(
        colormap,
        arange_levels(-70.0, 35.0, 2.5),
        Extend::Both,
    )?)
}

/// Draws meteograms with a shared colormap, icon set and font.
pub struct MeteogramRenderer {
    levels: FilledLevels,
    icons: IconResolver,
    font: Option<Arc<Font<'static>>>,
}

impl MeteogramRenderer {
    pub fn new(colormap: &Colormap, icons: IconResolver, font: Option<Arc<Font<'static>>>) -> Result<Self> {
        Ok(Self {
            levels: temperature_levels(colormap)?,
            icons,
            font,
        })
    }

    pub fn render(&self, data: &MeteogramData) -> Result<Canvas> {
        let icons = self
            .icons
            .weather_icons(&data.weather_code, &data.times)
            .with_context(|| format!("loading weather icons for {}", data.city))?;

        let mut canvas = Canvas::new(WIDTH, HEIGHT, Color::WHITE)?.with_font(self.font.clone());
        let panels = PLOT_AREA.split_rows(&PANEL_RATIOS, PANEL_GAP);

        let hourly_x: Vec<f64> = data.times.iter().map(|t| time_value(*t)).collect();
        let hourly_scale = Scale::new(hourly_x[0], hourly_x[hourly_x.len() - 1]);
        let hourly_ticks = chart::hour_ticks(data.times[0], data.times[data.times.len() - 1], TICK_HOURS);

        self.cross_section(&mut canvas, panels[0], hourly_scale, &hourly_x, &hourly_ticks, data)?;
        self.surface_temperature(&mut canvas, panels[1], hourly_scale, &hourly_x, &hourly_ticks, data, &icons)?;
        wind_and_pressure(&mut canvas, panels[2], hourly_scale, &hourly_x, &hourly_ticks, data)?;
        precipitation(&mut canvas, panels[3], data)?;

        debug!(city = %data.city, "Meteogram rendered");
        Ok(canvas)
    }

    fn cross_section(
        &self,
        canvas: &mut Canvas,
        rect: Rect,
        x: Scale,
        xs: &[f64],
        ticks: &[DateTime<Utc>],
        data: &MeteogramData,
    ) -> Result<()> {
        let axes = Axes::new(rect, x, Scale::new(1000.0, 200.0));
        let (nt, nz) = (data.times.len(), data.pressure.len());

        let temperature = GridView::new(&data.temperature, nt, nz)?;
        chart::filled_contour(canvas, &axes, xs, &data.pressure, &temperature, &self.levels)?;

        let humidity = GridView::new(&data.humidity, nt, nz)?;
        let rh = ContourConfig {
            levels: vec![0.0, 25.0, 50.0, 75.0, 100.0],
            line_color: Color::WHITE.with_alpha(0.7),
            line_width: 1.0,
            ..ContourConfig::default()
        };
        chart::contour_lines(canvas, &axes, xs, &data.pressure, &humidity, &rh)?;

        let barbs = BarbConfig {
            alpha: 0.3,
            ..BarbConfig::default()
        };
        {
            let mut pixmap = canvas.pixmap()?;
            for t in data.barb_steps(BARB_HOURS) {
                for (z, &p) in data.pressure.iter().enumerate() {
                    if !axes.y.contains(p) {
                        continue;
                    }
                    let at = axes.to_pixel(xs[t], p);
                    let i = z * nt + t;
                    draw_barb(&mut pixmap, at.x, at.y, data.wind_u[i], data.wind_v[i], &barbs);
                }
            }
        }

        time_grid(canvas, &axes, ticks, None)?;
        let pressure_ticks = chart::nice_ticks(200.0, 1000.0, 9);
        chart::draw_y_ticks(canvas, &axes, &pressure_ticks, Side::Left, chart::tick_label)?;
        chart::draw_y_label(canvas, &axes, Side::Left, Y_LABEL_OFFSET, "Pressure [hPa]");

        chart::annotate(canvas, &rect, Anchor::TopRight, ANNOTATION_SIZE, &run_label(data.run));
        chart::annotate(
            canvas,
            &rect,
            Anchor::TopLeft,
            ANNOTATION_SIZE,
            &location_label(data.lat, data.lon, data.elevation),
        );
        chart::annotate(canvas, &rect, Anchor::TopCenter, ANNOTATION_SIZE, &data.city);

        chart::colorbar(canvas, COLORBAR, &self.levels, Orientation::Vertical, 4, "Temperature [C]")?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn surface_temperature(
        &self,
        canvas: &mut Canvas,
        rect: Rect,
        x: Scale,
        xs: &[f64],
        ticks: &[DateTime<Utc>],
        data: &MeteogramData,
        icons: &[image::RgbaImage],
    ) -> Result<()> {
        let t2m = widen(&data.t2m);
        let td2m = widen(&data.td2m);
        let y = Scale::fit(t2m.iter().chain(&td2m).copied()).padded(0.15);
        let axes = Axes::new(rect, x, y);

        time_grid(canvas, &axes, ticks, None)?;
        let t_style = LineStyle::solid(Color::DARK_CYAN, 1.5);
        let td_style = LineStyle::dashed(Color::DARK_CYAN, 1.5);
        chart::plot_line(canvas, &axes, xs, &t2m, &t_style)?;
        chart::plot_line(canvas, &axes, xs, &td2m, &td_style)?;

        for ((&tx, &ty), icon) in xs.iter().zip(&t2m).zip(icons) {
            if !ty.is_finite() || icon.width() == 0 {
                continue;
            }
            let at = axes.to_pixel(tx, ty);
            canvas.overlay_centered(icon, at.x, at.y, ICON_SIZE / icon.width() as f32);
        }

        y_axis(canvas, &axes, Side::Left, "2m T, Td [°C]")?;
        chart::legend(
            canvas,
            &axes,
            &[LegendEntry::new("2m T", t_style), LegendEntry::new("2m Td", td_style)],
            LEGEND_SIZE,
        )?;
        Ok(())
    }
}

fn wind_and_pressure(
    canvas: &mut Canvas,
    rect: Rect,
    x: Scale,
    xs: &[f64],
    ticks: &[DateTime<Utc>],
    data: &MeteogramData,
) -> Result<()> {
    let gust = widen(&data.gust);
    let mslp = widen(&data.mslp);
    let axes = Axes::new(rect, x, Scale::fit(gust.iter().copied()).padded(0.1));
    let twin = axes.twin(Scale::fit(mslp.iter().copied()).padded(0.1));

    time_grid(canvas, &axes, ticks, None)?;
    let gust_style = LineStyle::solid(Color::LIGHT_CORAL, 1.5);
    let mslp_style = LineStyle::solid(Color::MAGENTA, 1.5);
    chart::plot_line(canvas, &axes, xs, &gust, &gust_style)?;
    chart::plot_line(canvas, &twin, xs, &mslp, &mslp_style)?;

    y_axis(canvas, &axes, Side::Left, "Wind gust [km/h]")?;
    y_axis(canvas, &twin, Side::Right, "MSLP [hPa]")?;
    chart::legend(
        canvas,
        &axes,
        &[LegendEntry::new("Gusts", gust_style), LegendEntry::new("MSLP", mslp_style)],
        LEGEND_SIZE,
    )?;
    Ok(())
}

fn precipitation(canvas: &mut Canvas, rect: Rect, data: &MeteogramData) -> Result<()> {
    let times = &data.precip_times;
    let xs: Vec<f64> = times.iter().map(|t| time_value(*t)).collect();
    let (first, last) = match (times.first(), times.last()) {
        (Some(first), Some(last)) if first < last => (*first, *last),
        _ => return Ok(()),
    };
    let rain_acc = widen(&data.rain_acc);
    let snow_acc = widen(&data.snow_acc);
    let rain_rate = widen(&data.rain_rate);
    let snow_rate = widen(&data.snow_rate);

    let x = Scale::new(xs[0], xs[xs.len() - 1]);
    let axes = Axes::new(
        rect,
        x,
        Scale::fit(rain_acc.iter().chain(&snow_acc).copied())
            .padded(0.05)
            .with_start(0.0),
    );
    let twin = axes.twin(
        Scale::fit(rain_rate.iter().chain(&snow_rate).copied())
            .padded(0.05)
            .with_start(0.0),
    );

    let ticks = chart::hour_ticks(first, last, TICK_HOURS);
    time_grid(canvas, &axes, &ticks, Some("%d %b %HZ"))?;

    chart::fill_between(canvas, &axes, &xs, &rain_acc, 0.0, Color::DODGER_BLUE.with_alpha(0.2))?;
    chart::fill_between(canvas, &axes, &xs, &snow_acc, 0.0, Color::ORCHID.with_alpha(0.2))?;
    chart::plot_line(canvas, &axes, &xs, &rain_acc, &LineStyle::solid(Color::DODGER_BLUE, 0.5))?;
    chart::plot_line(canvas, &axes, &xs, &snow_acc, &LineStyle::solid(Color::ORCHID, 0.5))?;

    let rain_style = LineStyle::solid(Color::DODGER_BLUE, 1.5);
    let snow_style = LineStyle::solid(Color::ORCHID, 1.5);
    chart::plot_line(canvas, &twin, &xs, &rain_rate, &rain_style)?;
    chart::plot_line(canvas, &twin, &xs, &snow_rate, &snow_style)?;

    y_axis(canvas, &axes, Side::Left, "Accum. [mm]")?;
    y_axis(canvas, &twin, Side::Right, "Inst. [mm h-1]")?;
    chart::legend(
        canvas,
        &axes,
        &[LegendEntry::new("Rain", rain_style), LegendEntry::new("Snow", snow_style)],
        LEGEND_SIZE,
    )?;
    Ok(())
}

/// Frame, vertical grid lines and tick marks at `ticks`.
fn time_grid(canvas: &mut Canvas, axes: &Axes, ticks: &[DateTime<Utc>], format: Option<&str>) -> Result<()> {
    let tick_xs: Vec<f64> = ticks.iter().map(|t| time_value(*t)).collect();
    chart::draw_grid(canvas, axes, &tick_xs, &[])?;
    chart::draw_time_ticks(canvas, axes, ticks, format)?;
    chart::draw_frame(canvas, axes)?;
    Ok(())
}

fn y_axis(canvas: &mut Canvas, axes: &Axes, side: Side, label: &str) -> Result<()> {
    let ticks = chart::nice_ticks(axes.y.start, axes.y.end, 5);
    chart::draw_y_ticks(canvas, axes, &ticks, side, chart::tick_label)?;
    chart::draw_y_label(canvas, axes, side, Y_LABEL_OFFSET, label);
    Ok(())
}

fn widen(values: &[f32]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

/// "RH, T and winds @(53.6N, 10.0E, 12 m)"
pub fn location_label(lat: f64, lon: f64, elevation: f32) -> String {
    let height = if elevation.is_finite() {
        format!("{}", elevation.trunc() as i64)
    } else {
        "?".to_string()
    };
    format!("RH, T and winds @({:3.1}N, {:3.1}E, {} m)", lat, lon, height)
}
