//! Equirectangular map view of a region: fields, contours, pressure
//! centres, boundaries and decorations placed by longitude/latitude.

use image::{imageops, RgbaImage};
use wx_common::{BoundingBox, LatLonGrid};

use crate::boundaries::Boundaries;
use crate::canvas::{Canvas, LineStyle};
use crate::chart::{self, Axes, Rect, Scale};
use crate::colormap::Color;
use crate::contour::{ContourConfig, Point};
use crate::error::{RenderError, RenderResult};
use crate::extrema::Extremum;
use crate::gradient::FilledLevels;
use crate::text::{Anchor, TextStyle, ValueLabel};
use crate::view::GridView;

/// Pixel sizes of the pressure-centre symbol and its value.
pub const EXTREMA_SYMBOL_SIZE: f32 = 21.0;
pub const EXTREMA_VALUE_SIZE: f32 = 14.0;

/// A region's bounding box mapped onto a pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub axes: Axes,
    pub bbox: BoundingBox,
}

impl MapView {
    pub fn new(rect: Rect, bbox: BoundingBox) -> Self {
        Self {
            axes: Axes::new(
                rect,
                Scale::new(bbox.min_x, bbox.max_x),
                Scale::new(bbox.min_y, bbox.max_y),
            ),
            bbox,
        }
    }

    pub fn rect(&self) -> Rect {
        self.axes.rect
    }

    pub fn to_pixel(&self, lon: f64, lat: f64) -> Point {
        self.axes.to_pixel(lon, lat)
    }

    fn check_grid(field: &GridView<'_>, coords: &LatLonGrid) -> RenderResult<()> {
        if coords.ny() != field.height || coords.nx() != field.width {
            return Err(RenderError::invalid(
                "grid",
                format!(
                    "field is {}x{} but coordinates are {}x{}",
                    field.height,
                    field.width,
                    coords.ny(),
                    coords.nx()
                ),
            ));
        }
        Ok(())
    }

    /// Stretch a background image over the map area.
    pub fn background(&self, canvas: &mut Canvas, image: &RgbaImage) {
        let r = self.rect();
        let (w, h) = (r.width.round().max(1.0) as u32, r.height.round().max(1.0) as u32);
        let resized = imageops::resize(image, w, h, imageops::FilterType::Triangle);
        canvas.overlay_centered(&resized, r.left + w as f32 / 2.0, r.top + h as f32 / 2.0, 1.0);
    }

    /// Filled bands of a field on the lat/lon grid.
    pub fn filled(
        &self,
        canvas: &mut Canvas,
        field: &GridView<'_>,
        coords: &LatLonGrid,
        levels: &FilledLevels,
    ) -> RenderResult<()> {
        Self::check_grid(field, coords)?;
        chart::filled_contour(canvas, &self.axes, &coords.lons, &coords.lats, field, levels)
    }

    /// Contour lines, with inline level labels when enabled.
    pub fn contours(
        &self,
        canvas: &mut Canvas,
        field: &GridView<'_>,
        coords: &LatLonGrid,
        config: &ContourConfig,
    ) -> RenderResult<()> {
        Self::check_grid(field, coords)?;
        chart::contour_lines(canvas, &self.axes, &coords.lons, &coords.lats, field, config)
    }

    /// Pressure-centre symbols with their rounded value underneath.
    /// Points outside the map are skipped.
    pub fn extrema(&self, canvas: &mut Canvas, extrema: &[Extremum], color: Color) {
        let symbol_style = TextStyle::new(EXTREMA_SYMBOL_SIZE, color)
            .with_halo(Color::BLACK)
            .bold();
        let value_style = TextStyle::new(EXTREMA_VALUE_SIZE, Color::GRAY).bold();
        for e in extrema {
            if !self.bbox.contains_point(e.lon, e.lat) {
                continue;
            }
            let p = self.to_pixel(e.lon, e.lat);
            canvas.draw_text(p.x, p.y, Anchor::Center, &symbol_style, &e.symbol);
            let below = p.y + EXTREMA_SYMBOL_SIZE / 2.0 + 2.0;
            canvas.draw_text(p.x, below, Anchor::TopCenter, &value_style, &e.label);
        }
    }

    /// Numeric labels colored by `color_for`, with a white halo.
    pub fn values<F>(&self, canvas: &mut Canvas, labels: &[ValueLabel], font_size: f32, color_for: F)
    where
        F: Fn(f32) -> Color,
    {
        for label in labels {
            let p = self.to_pixel(label.lon, label.lat);
            let style = TextStyle::new(font_size, color_for(label.value))
                .with_halo(Color::WHITE)
                .bold();
            canvas.draw_text(p.x, p.y, Anchor::BottomLeft, &style, &label.text);
        }
    }

    /// Polylines of `boundaries` clipped to the map.
    pub fn boundaries(&self, canvas: &mut Canvas, boundaries: &Boundaries, style: &LineStyle) -> RenderResult<()> {
        for line in boundaries.clipped_to(&self.bbox).lines {
            let points: Vec<Point> = line.iter().map(|&(lon, lat)| self.to_pixel(lon, lat)).collect();
            canvas.stroke_polyline(&points, style, false)?;
        }
        Ok(())
    }

    /// Parallels and meridians at multiples of `spacing` degrees.
    pub fn gridlines(&self, canvas: &mut Canvas, spacing: f64, style: &LineStyle) -> RenderResult<()> {
        if spacing <= 0.0 {
            return Err(RenderError::invalid("spacing", "must be positive"));
        }
        let r = self.rect();
        let mut lon = (self.bbox.min_x / spacing).ceil() * spacing;
        while lon <= self.bbox.max_x {
            let x = self.axes.x_pixel(lon);
            canvas.stroke_polyline(&[Point::new(x, r.top), Point::new(x, r.bottom())], style, false)?;
            lon += spacing;
        }
        let mut lat = (self.bbox.min_y / spacing).ceil() * spacing;
        while lat <= self.bbox.max_y {
            let y = self.axes.y_pixel(lat);
            canvas.stroke_polyline(&[Point::new(r.left, y), Point::new(r.right(), y)], style, false)?;
            lat += spacing;
        }
        Ok(())
    }

    /// Logo scaled by `zoom` and centred at a fraction of the map area
    /// (`(0, 0)` is the lower left corner).
    pub fn logo(&self, canvas: &mut Canvas, logo: &RgbaImage, zoom: f32, pos: (f32, f32)) {
        let r = self.rect();
        let x = r.left + pos.0 * r.width;
        let y = r.bottom() - pos.1 * r.height;
        canvas.overlay_centered(logo, x, y, zoom);
    }

    pub fn frame(&self, canvas: &mut Canvas) -> RenderResult<()> {
        chart::draw_frame(canvas, &self.axes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> MapView {
        MapView::new(Rect::new(0.0, 0.0, 100.0, 50.0), BoundingBox::new(0.0, 40.0, 10.0, 45.0))
    }

    #[test]
    fn test_corners_map_to_rect() {
        let v = view();
        let p = v.to_pixel(0.0, 45.0);
        assert_eq!((p.x, p.y), (0.0, 0.0));
        let p = v.to_pixel(10.0, 40.0);
        assert_eq!((p.x, p.y), (100.0, 50.0));
    }

    #[test]
    fn test_filled_rejects_mismatched_grid() {
        let v = view();
        let mut canvas = Canvas::new(100, 50, Color::WHITE).unwrap();
        let data = [1.0f32; 4];
        let field = GridView::new(&data, 2, 2).unwrap();
        let coords = LatLonGrid::new(vec![40.0, 42.0, 45.0], vec![0.0, 10.0]).unwrap();
        let levels = FilledLevels::from_discrete(
            &crate::colormap::DiscreteColormap::new(vec![0.0, 2.0], vec![Color::BLACK, Color::WHITE]).unwrap(),
        );
        assert!(v.filled(&mut canvas, &field, &coords, &levels).is_err());
    }

    #[test]
    fn test_gridlines_draw_at_multiples() {
        let v = view();
        let mut canvas = Canvas::new(100, 50, Color::WHITE).unwrap();
        v.gridlines(&mut canvas, 2.0, &LineStyle::solid(Color::BLACK, 1.0)).unwrap();
        // lon 2 is at x = 20
        assert!(canvas.image().get_pixel(20, 25)[0] < 255);
        // Between lon 0/2 and lat 42/44
        assert_eq!(canvas.image().get_pixel(15, 25)[0], 255);
    }
}
