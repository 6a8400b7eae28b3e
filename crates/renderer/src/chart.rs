//! Plot axes: data-to-pixel mapping, ticks, gridlines, line and band
//! plots, colorbars and legends drawn onto a [`Canvas`].

use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::debug;

use crate::canvas::{Canvas, LineStyle};
use crate::colormap::Color;
use crate::contour::{generate_all_contours, label_positions, project_contours, stroke_contours, ContourConfig, Point};
use crate::error::RenderResult;
use crate::gradient::{render_filled, FilledLevels};
use crate::text::{Anchor, TextStyle};
use crate::view::{axis_value, fractional_index, GridView};

/// Gridline color and opacity.
const GRID_COLOR: Color = Color::new(176, 176, 176, 128);
const TICK_LENGTH: f32 = 3.5;
pub const TICK_FONT_SIZE: f32 = 11.0;
pub const LABEL_FONT_SIZE: f32 = 12.0;

/// Linear mapping from data values onto a pixel span. `start` maps to the
/// left (x) or bottom (y) edge; a reversed range flips the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub start: f64,
    pub end: f64,
}

impl Scale {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Span of `values` ignoring NaN; a flat or empty series gets a unit
    /// wide range so the mapping stays defined.
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Self {
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in values.into_iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if !lo.is_finite() {
            return Self::new(0.0, 1.0);
        }
        if hi - lo < 1e-9 {
            return Self::new(lo - 0.5, hi + 0.5);
        }
        Self::new(lo, hi)
    }

    /// Widen both ends by `fraction` of the span.
    pub fn padded(self, fraction: f64) -> Self {
        let pad = (self.end - self.start) * fraction;
        Self::new(self.start - pad, self.end + pad)
    }

    /// Keep the upper end and move the lower one to `start`.
    pub fn with_start(self, start: f64) -> Self {
        Self::new(start, self.end.max(start + 1e-9))
    }

    pub fn fraction(&self, value: f64) -> f64 {
        (value - self.start) / (self.end - self.start)
    }

    pub fn value_at(&self, fraction: f64) -> f64 {
        self.start + fraction * (self.end - self.start)
    }

    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        value >= lo && value <= hi
    }
}

/// Seconds since the epoch, the x coordinate of time axes.
pub fn time_value(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64
}

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Split vertically into panels with the given height ratios, leaving
    /// `gap` pixels between them.
    pub fn split_rows(&self, ratios: &[f32], gap: f32) -> Vec<Rect> {
        let total: f32 = ratios.iter().sum();
        let usable = self.height - gap * (ratios.len().saturating_sub(1)) as f32;
        let mut top = self.top;
        ratios
            .iter()
            .map(|r| {
                let h = usable * r / total;
                let rect = Rect::new(self.left, top, self.width, h);
                top += h + gap;
                rect
            })
            .collect()
    }
}

/// A plotting area with its x and y scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes {
    pub rect: Rect,
    pub x: Scale,
    pub y: Scale,
}

impl Axes {
    pub fn new(rect: Rect, x: Scale, y: Scale) -> Self {
        Self { rect, x, y }
    }

    /// Same area and x scale with an independent y scale.
    pub fn twin(&self, y: Scale) -> Self {
        Self { y, ..*self }
    }

    pub fn x_pixel(&self, x: f64) -> f32 {
        self.rect.left + (self.x.fraction(x) as f32) * self.rect.width
    }

    pub fn y_pixel(&self, y: f64) -> f32 {
        self.rect.bottom() - (self.y.fraction(y) as f32) * self.rect.height
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> Point {
        Point::new(self.x_pixel(x), self.y_pixel(y))
    }

    /// Data coordinates at the centre of pixel `(px, py)`.
    pub fn from_pixel(&self, px: f32, py: f32) -> (f64, f64) {
        let fx = ((px - self.rect.left) / self.rect.width) as f64;
        let fy = ((self.rect.bottom() - py) / self.rect.height) as f64;
        (self.x.value_at(fx), self.y.value_at(fy))
    }
}

/// Which side of the axes a tick column sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Tick positions at every multiple of `interval_hours` (counted from
/// midnight UTC) within `[start, end]`.
pub fn hour_ticks(start: DateTime<Utc>, end: DateTime<Utc>, interval_hours: u32) -> Vec<DateTime<Utc>> {
    if interval_hours == 0 || end < start {
        return Vec::new();
    }
    let floor = start
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(start);
    let mut tick = floor - Duration::hours((floor.hour() % interval_hours) as i64);
    let mut ticks = Vec::new();
    while tick <= end {
        if tick >= start {
            ticks.push(tick);
        }
        tick += Duration::hours(interval_hours as i64);
    }
    ticks
}

/// Round tick positions over `[min, max]` using 1, 2, 2.5 and 5 steps,
/// at most `max_ticks` of them.
pub fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if !lo.is_finite() || !hi.is_finite() || max_ticks < 2 || hi - lo <= 0.0 {
        return Vec::new();
    }
    let raw = (hi - lo) / (max_ticks - 1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    let first = (lo / step).ceil() * step;
    let mut ticks = Vec::new();
    let mut i = 0;
    loop {
        let t = first + step * i as f64;
        if t > hi + step * 1e-9 {
            break;
        }
        // Clean up accumulated float noise around zero.
        ticks.push(if t.abs() < step * 1e-9 { 0.0 } else { t });
        i += 1;
    }
    ticks
}

/// Shortest decimal label for a tick value.
pub fn tick_label(value: f64) -> String {
    if (value - value.round()).abs() < 1e-6 {
        format!("{}", value.round() as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub fn draw_frame(canvas: &mut Canvas, axes: &Axes) -> RenderResult<()> {
    let r = axes.rect;
    canvas.stroke_rect(r.left, r.top, r.width, r.height, &LineStyle::solid(Color::BLACK, 0.8))
}

/// Light gridlines at the given x and y positions.
pub fn draw_grid(canvas: &mut Canvas, axes: &Axes, xs: &[f64], ys: &[f64]) -> RenderResult<()> {
    let style = LineStyle::solid(GRID_COLOR, 0.8);
    let r = axes.rect;
    for &x in xs {
        let px = axes.x_pixel(x);
        canvas.stroke_polyline(&[Point::new(px, r.top), Point::new(px, r.bottom())], &style, false)?;
    }
    for &y in ys {
        let py = axes.y_pixel(y);
        canvas.stroke_polyline(&[Point::new(r.left, py), Point::new(r.right(), py)], &style, false)?;
    }
    Ok(())
}

/// Tick marks and labels along one vertical side.
pub fn draw_y_ticks<F>(canvas: &mut Canvas, axes: &Axes, ticks: &[f64], side: Side, label: F) -> RenderResult<()>
where
    F: Fn(f64) -> String,
{
    let style = LineStyle::solid(Color::BLACK, 0.8);
    let text = TextStyle::new(TICK_FONT_SIZE, Color::BLACK);
    for &t in ticks.iter().filter(|t| axes.y.contains(**t)) {
        let py = axes.y_pixel(t);
        let (x0, x1, anchor, tx) = match side {
            Side::Left => {
                let x = axes.rect.left;
                (x - TICK_LENGTH, x, Anchor::CenterRight, x - TICK_LENGTH - 2.0)
            }
            Side::Right => {
                let x = axes.rect.right();
                (x, x + TICK_LENGTH, Anchor::CenterLeft, x + TICK_LENGTH + 2.0)
            }
        };
        canvas.stroke_polyline(&[Point::new(x0, py), Point::new(x1, py)], &style, false)?;
        canvas.draw_text(tx, py, anchor, &text, &label(t));
    }
    Ok(())
}

/// Tick marks under the axes at each time; labels, when requested, use
/// `format` and are slanted 45 degrees and right-aligned.
pub fn draw_time_ticks(
    canvas: &mut Canvas,
    axes: &Axes,
    ticks: &[DateTime<Utc>],
    format: Option<&str>,
) -> RenderResult<()> {
    let style = LineStyle::solid(Color::BLACK, 0.8);
    let text = TextStyle::new(TICK_FONT_SIZE, Color::BLACK);
    let y = axes.rect.bottom();
    for &t in ticks {
        let x = axes.x_pixel(time_value(t));
        canvas.stroke_polyline(&[Point::new(x, y), Point::new(x, y + TICK_LENGTH)], &style, false)?;
        if let Some(fmt) = format {
            canvas.draw_text_rotated(x, y + TICK_LENGTH + 2.0, &text, &t.format(fmt).to_string(), 45.0);
        }
    }
    Ok(())
}

/// Axis title rotated along a vertical side, `offset` pixels outside it.
pub fn draw_y_label(canvas: &mut Canvas, axes: &Axes, side: Side, offset: f32, label: &str) {
    let style = TextStyle::new(LABEL_FONT_SIZE, Color::BLACK);
    let cy = axes.rect.top + axes.rect.height / 2.0;
    match side {
        Side::Left => canvas.draw_text_vertical(axes.rect.left - offset, cy, Anchor::CenterRight, &style, label),
        Side::Right => canvas.draw_text_vertical(axes.rect.right() + offset, cy, Anchor::CenterLeft, &style, label),
    }
}

/// Boxed annotation inside the axes at the position named by `anchor`
/// (e.g. `TopRight` for the upper right corner).
pub fn annotate(canvas: &mut Canvas, rect: &Rect, anchor: Anchor, font_size: f32, text: &str) {
    let inset = 4.0;
    let x = match anchor {
        Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => rect.left + inset,
        Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => rect.left + rect.width / 2.0,
        Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => rect.right() - inset,
    };
    let y = match anchor {
        Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => rect.top + inset,
        Anchor::CenterLeft | Anchor::Center | Anchor::CenterRight => rect.top + rect.height / 2.0,
        Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => rect.bottom() - inset,
    };
    canvas.draw_boxed_text(x, y, anchor, &TextStyle::new(font_size, Color::BLACK), text);
}

/// Line plot; NaN values break the line.
pub fn plot_line(canvas: &mut Canvas, axes: &Axes, xs: &[f64], ys: &[f64], style: &LineStyle) -> RenderResult<()> {
    let mut run: Vec<Point> = Vec::new();
    for (&x, &y) in xs.iter().zip(ys) {
        if x.is_finite() && y.is_finite() {
            run.push(axes.to_pixel(x, y));
        } else if !run.is_empty() {
            canvas.stroke_polyline(&run, style, false)?;
            run.clear();
        }
    }
    canvas.stroke_polyline(&run, style, false)
}

/// Fill between a series and a constant baseline. NaN values are treated
/// as the baseline.
pub fn fill_between(
    canvas: &mut Canvas,
    axes: &Axes,
    xs: &[f64],
    ys: &[f64],
    baseline: f64,
    color: Color,
) -> RenderResult<()> {
    if xs.len() < 2 {
        return Ok(());
    }
    let mut polygon: Vec<Point> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| axes.to_pixel(x, if y.is_finite() { y } else { baseline }))
        .collect();
    for &x in xs.iter().rev() {
        polygon.push(axes.to_pixel(x, baseline));
    }
    canvas.fill_polygon(&polygon, color)
}

/// Filled bands of `grid` laid out on the `xs` (columns) by `ys` (rows)
/// coordinate axes. Pixels outside the data extent are left untouched.
pub fn filled_contour(
    canvas: &mut Canvas,
    axes: &Axes,
    xs: &[f64],
    ys: &[f64],
    grid: &GridView<'_>,
    levels: &FilledLevels,
) -> RenderResult<()> {
    let left = axes.rect.left.round().max(0.0) as i64;
    let top = axes.rect.top.round().max(0.0) as i64;
    let w = (axes.rect.width.round() as i64).min(canvas.width() as i64 - left).max(0) as usize;
    let h = (axes.rect.height.round() as i64).min(canvas.height() as i64 - top).max(0) as usize;
    if w == 0 || h == 0 {
        return Ok(());
    }
    let layer = render_filled(grid, w, h, levels, |px, py| {
        let (x, y) = axes.from_pixel((left as usize + px) as f32 + 0.5, (top as usize + py) as f32 + 0.5);
        Some((fractional_index(ys, y)?, fractional_index(xs, x)?))
    });
    canvas.composite_at(&layer, w as u32, left, top);
    debug!(width = w, height = h, bands = levels.colors().len(), "Filled contours drawn");
    Ok(())
}

/// Contour lines of `grid` on the `xs` by `ys` axes, with level labels
/// when enabled in `config`.
pub fn contour_lines(
    canvas: &mut Canvas,
    axes: &Axes,
    xs: &[f64],
    ys: &[f64],
    grid: &GridView<'_>,
    config: &ContourConfig,
) -> RenderResult<()> {
    let contours = generate_all_contours(grid, config);
    let projected = project_contours(&contours, |p| {
        let x = axis_value(xs, p.x as f64);
        let y = axis_value(ys, p.y as f64);
        let pixel = axes.to_pixel(x, y);
        (pixel.x.is_finite() && pixel.y.is_finite()).then_some(pixel)
    });
    {
        let mut pixmap = canvas.pixmap()?;
        stroke_contours(&mut pixmap, &projected, config);
    }
    if config.labels_enabled {
        let style = TextStyle::new(config.label_font_size, config.line_color);
        for label in label_positions(&projected, config, canvas.width() as f32, canvas.height() as f32) {
            canvas.draw_text(label.x, label.y, Anchor::Center, &style, &label.text);
        }
    }
    Ok(())
}

/// Colorbar orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Draw a colorbar for `levels` in `rect`, with triangular ends for the
/// extension colors, ticks at every `tick_every`-th level and a title.
pub fn colorbar(
    canvas: &mut Canvas,
    rect: Rect,
    levels: &FilledLevels,
    orientation: Orientation,
    tick_every: usize,
    label: &str,
) -> RenderResult<()> {
    let bounds = levels.levels();
    let bands = levels.colors();
    if bands.is_empty() {
        return Ok(());
    }
    let (lo, hi) = (bounds[0] as f64, bounds[bounds.len() - 1] as f64);
    let along = |v: f64| ((v - lo) / (hi - lo)) as f32;
    let frame = LineStyle::solid(Color::BLACK, 0.8);
    let text = TextStyle::new(TICK_FONT_SIZE, Color::BLACK);
    let title = TextStyle::new(LABEL_FONT_SIZE, Color::BLACK);

    match orientation {
        Orientation::Vertical => {
            let pos = |v: f64| rect.bottom() - along(v) * rect.height;
            for (i, color) in bands.iter().enumerate() {
                let (y0, y1) = (pos(bounds[i + 1] as f64), pos(bounds[i] as f64));
                canvas.fill_rect(rect.left, y0, rect.width, y1 - y0 + 0.5, *color)?;
            }
            let tip = rect.width;
            if let Some(c) = levels.over() {
                let tri = [
                    Point::new(rect.left, rect.top),
                    Point::new(rect.left + rect.width / 2.0, rect.top - tip),
                    Point::new(rect.right(), rect.top),
                ];
                canvas.fill_polygon(&tri, c)?;
                canvas.stroke_polyline(&tri, &frame, false)?;
            }
            if let Some(c) = levels.under() {
                let tri = [
                    Point::new(rect.left, rect.bottom()),
                    Point::new(rect.left + rect.width / 2.0, rect.bottom() + tip),
                    Point::new(rect.right(), rect.bottom()),
                ];
                canvas.fill_polygon(&tri, c)?;
                canvas.stroke_polyline(&tri, &frame, false)?;
            }
            canvas.stroke_rect(rect.left, rect.top, rect.width, rect.height, &frame)?;
            for &v in bounds.iter().step_by(tick_every.max(1)) {
                let y = pos(v as f64);
                let x = rect.right();
                canvas.stroke_polyline(&[Point::new(x, y), Point::new(x + TICK_LENGTH, y)], &frame, false)?;
                canvas.draw_text(x + TICK_LENGTH + 2.0, y, Anchor::CenterLeft, &text, &tick_label(v as f64));
            }
            let (tw, _) = canvas.text_extent(TICK_FONT_SIZE, &tick_label(lo));
            canvas.draw_text_vertical(
                rect.right() + TICK_LENGTH + tw.max(16) as f32 + 8.0,
                rect.top + rect.height / 2.0,
                Anchor::CenterLeft,
                &title,
                label,
            );
        }
        Orientation::Horizontal => {
            let pos = |v: f64| rect.left + along(v) * rect.width;
            for (i, color) in bands.iter().enumerate() {
                let (x0, x1) = (pos(bounds[i] as f64), pos(bounds[i + 1] as f64));
                canvas.fill_rect(x0, rect.top, x1 - x0 + 0.5, rect.height, *color)?;
            }
            let tip = rect.height;
            if let Some(c) = levels.under() {
                let tri = [
                    Point::new(rect.left, rect.top),
                    Point::new(rect.left - tip, rect.top + rect.height / 2.0),
                    Point::new(rect.left, rect.bottom()),
                ];
                canvas.fill_polygon(&tri, c)?;
                canvas.stroke_polyline(&tri, &frame, false)?;
            }
            if let Some(c) = levels.over() {
                let tri = [
                    Point::new(rect.right(), rect.top),
                    Point::new(rect.right() + tip, rect.top + rect.height / 2.0),
                    Point::new(rect.right(), rect.bottom()),
                ];
                canvas.fill_polygon(&tri, c)?;
                canvas.stroke_polyline(&tri, &frame, false)?;
            }
            canvas.stroke_rect(rect.left, rect.top, rect.width, rect.height, &frame)?;
            for &v in bounds.iter().step_by(tick_every.max(1)) {
                let x = pos(v as f64);
                let y = rect.bottom();
                canvas.stroke_polyline(&[Point::new(x, y), Point::new(x, y + TICK_LENGTH)], &frame, false)?;
                canvas.draw_text(x, y + TICK_LENGTH + 1.0, Anchor::TopCenter, &text, &tick_label(v as f64));
            }
            canvas.draw_text(
                rect.left + rect.width / 2.0,
                rect.bottom() + TICK_LENGTH + TICK_FONT_SIZE + 6.0,
                Anchor::TopCenter,
                &title,
                label,
            );
        }
    }
    Ok(())
}

/// One legend row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub style: LineStyle,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, style: LineStyle) -> Self {
        Self {
            label: label.into(),
            style,
        }
    }
}

/// Boxed legend in the upper right corner of the axes.
pub fn legend(canvas: &mut Canvas, axes: &Axes, entries: &[LegendEntry], font_size: f32) -> RenderResult<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let line_len = 2.0 * font_size;
    let row_h = font_size * 1.4;
    let pad = font_size * 0.5;
    let text_w = entries
        .iter()
        .map(|e| canvas.text_extent(font_size, &e.label).0)
        .max()
        .unwrap_or(0) as f32;
    let box_w = pad * 3.0 + line_len + text_w;
    let box_h = pad * 2.0 + row_h * entries.len() as f32;
    let left = axes.rect.right() - box_w - 4.0;
    let top = axes.rect.top + 4.0;

    canvas.fill_rect(left, top, box_w, box_h, Color::WHITE.with_alpha(0.8))?;
    canvas.stroke_rect(left, top, box_w, box_h, &LineStyle::solid(Color::new(204, 204, 204, 255), 0.8))?;
    let text = TextStyle::new(font_size, Color::BLACK);
    for (i, entry) in entries.iter().enumerate() {
        let cy = top + pad + row_h * (i as f32 + 0.5);
        let x0 = left + pad;
        canvas.stroke_polyline(&[Point::new(x0, cy), Point::new(x0 + line_len, cy)], &entry.style, false)?;
        canvas.draw_text(x0 + line_len + pad, cy, Anchor::CenterLeft, &text, &entry.label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_axes_round_trip_with_reversed_y() {
        let axes = Axes::new(
            Rect::new(10.0, 20.0, 100.0, 80.0),
            Scale::new(0.0, 10.0),
            Scale::new(1000.0, 200.0),
        );
        let p = axes.to_pixel(5.0, 1000.0);
        assert_eq!((p.x, p.y), (60.0, 100.0));
        assert_eq!(axes.y_pixel(200.0), 20.0);
        let (x, y) = axes.from_pixel(60.0, 60.0);
        assert!((x - 5.0).abs() < 1e-9);
        assert!((y - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_hour_ticks_align_to_interval() {
        let ticks = hour_ticks(utc(15, 2), utc(16, 1), 6);
        let hours: Vec<u32> = ticks.iter().map(|t| t.hour()).collect();
        assert_eq!(hours, vec![6, 12, 18, 0]);
        assert_eq!(hour_ticks(utc(15, 6), utc(15, 6), 6), vec![utc(15, 6)]);
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(0.0, 10.0, 6), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(993.0, 1012.0, 5), vec![995.0, 1000.0, 1005.0, 1010.0]);
        assert!(nice_ticks(1.0, 1.0, 5).is_empty());
    }

    #[test]
    fn test_scale_fit_handles_flat_and_nan() {
        assert_eq!(Scale::fit([f64::NAN, 2.0, 2.0]), Scale::new(1.5, 2.5));
        assert_eq!(Scale::fit([f64::NAN]), Scale::new(0.0, 1.0));
        assert_eq!(Scale::fit([3.0, -1.0]), Scale::new(-1.0, 3.0));
    }

    #[test]
    fn test_split_rows_ratios() {
        let rows = Rect::new(0.0, 0.0, 100.0, 630.0).split_rows(&[3.0, 1.0, 1.0, 1.0], 10.0);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].height, 300.0);
        assert_eq!(rows[1].top, 310.0);
        assert_eq!(rows[3].bottom(), 630.0);
    }

    #[test]
    fn test_tick_label() {
        assert_eq!(tick_label(1000.0), "1000");
        assert_eq!(tick_label(2.5), "2.5");
        assert_eq!(tick_label(-67.5), "-67.5");
    }

    #[test]
    fn test_plot_line_draws_inside_axes() {
        let mut canvas = Canvas::new(50, 50, Color::WHITE).unwrap();
        let axes = Axes::new(Rect::new(0.0, 0.0, 50.0, 50.0), Scale::new(0.0, 1.0), Scale::new(0.0, 1.0));
        plot_line(
            &mut canvas,
            &axes,
            &[0.0, 1.0],
            &[0.51, 0.51],
            &LineStyle::solid(Color::BLACK, 2.0),
        )
        .unwrap();
        let row = (50.0 - 0.51 * 50.0) as u32;
        assert!(canvas.image().get_pixel(25, row)[0] < 128);
        assert_eq!(canvas.image().get_pixel(25, 5)[0], 255);
    }
}
