//! Opaque drawing surface shared by the chart renderers.
//!
//! Vector work goes through a borrowed tiny-skia pixmap over the same
//! buffer that text and raster overlays use. The surface is always
//! opaque, so premultiplied and straight RGBA coincide.

use std::path::Path;
use std::sync::Arc;

use image::{imageops, Rgba, RgbaImage};
use rusttype::Font;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, PixmapMut, Rect, Stroke, StrokeDash, Transform};
use tracing::debug;

use crate::colormap::Color;
use crate::contour::Point;
use crate::error::{RenderError, RenderResult};
use crate::png;
use crate::text::{self, Anchor, TextStyle};

/// Stroke settings for polylines.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub width: f32,
    /// On/off dash lengths in pixels
    pub dash: Option<[f32; 2]>,
}

impl LineStyle {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: Some([3.7 * width.max(1.0), 1.6 * width.max(1.0)]),
        }
    }

    fn paint(&self) -> Paint<'static> {
        solid_paint(self.color)
    }

    fn stroke(&self) -> Stroke {
        Stroke {
            width: self.width,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Round,
            dash: self.dash.and_then(|[on, off]| StrokeDash::new(vec![on, off], 0.0)),
            ..Stroke::default()
        }
    }
}

pub(crate) fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

/// RGBA drawing surface with an optional font for text.
#[derive(Clone)]
pub struct Canvas {
    image: RgbaImage,
    font: Option<Arc<Font<'static>>>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl Canvas {
    /// A canvas filled with `background`; its alpha is forced to opaque.
    pub fn new(width: u32, height: u32, background: Color) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::Canvas(format!("invalid size {}x{}", width, height)));
        }
        let bg = Rgba([background.r, background.g, background.b, 255]);
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, bg),
            font: None,
        })
    }

    pub fn with_font(mut self, font: Option<Arc<Font<'static>>>) -> Self {
        self.font = font;
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn font(&self) -> Option<&Font<'static>> {
        self.font.as_deref()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Borrow the buffer as a tiny-skia pixmap.
    pub fn pixmap(&mut self) -> RenderResult<PixmapMut<'_>> {
        let (w, h) = (self.image.width(), self.image.height());
        PixmapMut::from_bytes(self.image.as_mut(), w, h)
            .ok_or_else(|| RenderError::Canvas(format!("cannot wrap {}x{} buffer", w, h)))
    }

    /// Stroke a polyline. Fewer than two points draw nothing.
    pub fn stroke_polyline(&mut self, points: &[Point], style: &LineStyle, closed: bool) -> RenderResult<()> {
        let Some(path) = polyline_path(points, closed) else {
            return Ok(());
        };
        let paint = style.paint();
        let stroke = style.stroke();
        self.pixmap()?
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }

    /// Fill a closed polygon.
    pub fn fill_polygon(&mut self, points: &[Point], color: Color) -> RenderResult<()> {
        let Some(path) = polyline_path(points, true) else {
            return Ok(());
        };
        let paint = solid_paint(color);
        self.pixmap()?
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        Ok(())
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) -> RenderResult<()> {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let paint = solid_paint(color);
            self.pixmap()?.fill_rect(rect, &paint, Transform::identity(), None);
        }
        Ok(())
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, style: &LineStyle) -> RenderResult<()> {
        let corners = [
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ];
        self.stroke_polyline(&corners, style, true)
    }

    /// Blend a straight-alpha RGBA layer of the canvas size over the canvas.
    pub fn composite_layer(&mut self, layer: &[u8]) -> RenderResult<()> {
        if layer.len() != self.image.as_raw().len() {
            return Err(RenderError::Canvas(format!(
                "layer has {} bytes, canvas needs {}",
                layer.len(),
                self.image.as_raw().len()
            )));
        }
        for (dst, src) in self.image.as_mut().chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
            blend_over(dst, src);
        }
        Ok(())
    }

    /// Blend `layer` into the rectangle at `(x, y)`.
    pub fn composite_at(&mut self, layer: &[u8], layer_width: u32, x: i64, y: i64) {
        if layer_width == 0 {
            return;
        }
        let (cw, ch) = (self.image.width() as i64, self.image.height() as i64);
        for (row, line) in layer.chunks_exact(layer_width as usize * 4).enumerate() {
            let py = y + row as i64;
            if py < 0 || py >= ch {
                continue;
            }
            for (col, src) in line.chunks_exact(4).enumerate() {
                let px = x + col as i64;
                if px < 0 || px >= cw || src[3] == 0 {
                    continue;
                }
                let dst = self.image.get_pixel_mut(px as u32, py as u32);
                blend_over(&mut dst.0, src);
            }
        }
    }

    /// Overlay an image centred on `(x, y)`, scaled by `zoom` first.
    pub fn overlay_centered(&mut self, overlay: &RgbaImage, x: f32, y: f32, zoom: f32) {
        let w = ((overlay.width() as f32 * zoom).round() as u32).max(1);
        let h = ((overlay.height() as f32 * zoom).round() as u32).max(1);
        let scaled;
        let top = if (w, h) == overlay.dimensions() {
            overlay
        } else {
            scaled = imageops::resize(overlay, w, h, imageops::FilterType::Triangle);
            &scaled
        };
        let left = (x - w as f32 / 2.0).round() as i64;
        let upper = (y - h as f32 / 2.0).round() as i64;
        imageops::overlay(&mut self.image, top, left, upper);
        self.force_opaque();
    }

    /// Draw text when a font is loaded; without one the call is a no-op.
    pub fn draw_text(&mut self, x: f32, y: f32, anchor: Anchor, style: &TextStyle, text: &str) {
        let Some(font) = self.font.clone() else {
            debug!(text, "No font loaded, skipping text");
            return;
        };
        text::draw_text(&mut self.image, &font, x.round() as i32, y.round() as i32, anchor, style, text);
    }

    pub fn draw_text_vertical(&mut self, x: f32, y: f32, anchor: Anchor, style: &TextStyle, text: &str) {
        let Some(font) = self.font.clone() else {
            debug!(text, "No font loaded, skipping text");
            return;
        };
        text::draw_text_vertical(&mut self.image, &font, x.round() as i32, y.round() as i32, anchor, style, text);
        self.force_opaque();
    }

    /// Slanted text whose rotated box has its top-right corner at `(x, y)`.
    pub fn draw_text_rotated(&mut self, x: f32, y: f32, style: &TextStyle, text: &str, degrees: f32) {
        let Some(font) = self.font.clone() else {
            debug!(text, "No font loaded, skipping text");
            return;
        };
        text::draw_text_rotated(&mut self.image, &font, x.round() as i32, y.round() as i32, style, text, degrees);
        self.force_opaque();
    }

    pub fn draw_boxed_text(&mut self, x: f32, y: f32, anchor: Anchor, style: &TextStyle, text: &str) {
        let Some(font) = self.font.clone() else {
            debug!(text, "No font loaded, skipping text");
            return;
        };
        let padding = (style.size * 0.3).round().max(2.0) as i32;
        text::draw_boxed_text(
            &mut self.image,
            &font,
            x.round() as i32,
            y.round() as i32,
            anchor,
            style,
            text,
            padding,
        );
    }

    /// Size of `text` in pixels, zero without a font.
    pub fn text_extent(&self, size: f32, text: &str) -> (i32, i32) {
        match &self.font {
            Some(font) => text::text_extent(font, size, text),
            None => (0, 0),
        }
    }

    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        png::create_png_auto(
            self.image.as_raw(),
            self.image.width() as usize,
            self.image.height() as usize,
        )
    }

    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        png::write_png(
            path,
            self.image.as_raw(),
            self.image.width() as usize,
            self.image.height() as usize,
        )
    }

    fn force_opaque(&mut self) {
        for px in self.image.pixels_mut() {
            px[3] = 255;
        }
    }
}

fn polyline_path(points: &[Point], closed: bool) -> Option<tiny_skia::Path> {
    let mut iter = points.iter().filter(|p| p.x.is_finite() && p.y.is_finite());
    let first = iter.next()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    let mut count = 1;
    for p in iter {
        pb.line_to(p.x, p.y);
        count += 1;
    }
    if count < 2 {
        return None;
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

/// Source-over blend of a straight-alpha pixel onto an opaque one.
fn blend_over(dst: &mut [u8], src: &[u8]) {
    let a = src[3] as u32;
    if a == 0 {
        return;
    }
    if a == 255 {
        dst[..3].copy_from_slice(&src[..3]);
        dst[3] = 255;
        return;
    }
    for i in 0..3 {
        dst[i] = ((src[i] as u32 * a + dst[i] as u32 * (255 - a) + 127) / 255) as u8;
    }
    dst[3] = 255;
}
