//! Text drawing on RGBA images: anchored labels, halos, boxed annotations
//! and numeric value labels sampled from a field.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use tracing::debug;
use wx_common::{BoundingBox, LatLonGrid};

use crate::colormap::Color;
use crate::error::{RenderError, RenderResult};
use crate::view::GridView;

/// Load a TrueType font from disk.
pub fn load_font(path: &Path) -> RenderResult<Font<'static>> {
    if !path.is_file() {
        return Err(RenderError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let font = Font::try_from_vec(bytes)
        .ok_or_else(|| RenderError::Font(format!("{} is not a usable font", path.display())))?;
    debug!(path = %path.display(), "Loaded font");
    Ok(font)
}

/// Where the reference point sits on the text's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// Top-left corner of a `width` x `height` box anchored at `(x, y)`.
    pub fn origin(self, x: i32, y: i32, width: i32, height: i32) -> (i32, i32) {
        let dx = match self {
            Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => 0,
            Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => width / 2,
            Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => width,
        };
        let dy = match self {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => 0,
            Anchor::CenterLeft | Anchor::Center | Anchor::CenterRight => height / 2,
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => height,
        };
        (x - dx, y - dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Pixel height of the font
    pub size: f32,
    pub color: Color,
    /// One-pixel outline drawn beneath the glyphs
    pub halo: Option<Color>,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            halo: None,
            bold: false,
        }
    }

    pub fn with_halo(mut self, color: Color) -> Self {
        self.halo = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Pixel width and height of `text` at `size`.
pub fn text_extent(font: &Font<'_>, size: f32, text: &str) -> (i32, i32) {
    text_size(Scale::uniform(size), font, text)
}

/// Draw `text` anchored at `(x, y)`. Returns the drawn box as
/// `(left, top, width, height)`.
pub fn draw_text(
    img: &mut RgbaImage,
    font: &Font<'_>,
    x: i32,
    y: i32,
    anchor: Anchor,
    style: &TextStyle,
    text: &str,
) -> (i32, i32, i32, i32) {
    let scale = Scale::uniform(style.size);
    let (w, h) = text_size(scale, font, text);
    let (left, top) = anchor.origin(x, y, w, h);

    if let Some(halo) = style.halo {
        let rgba = halo.to_rgba();
        for (ox, oy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
            draw_text_mut(img, rgba, left + ox, top + oy, scale, font, text);
        }
    }
    let rgba = style.color.to_rgba();
    draw_text_mut(img, rgba, left, top, scale, font, text);
    if style.bold {
        draw_text_mut(img, rgba, left + 1, top, scale, font, text);
    }
    (left, top, w, h)
}

/// Draw `text` rotated a quarter turn counter-clockwise, as used for
/// vertical axis labels.
pub fn draw_text_vertical(
    img: &mut RgbaImage,
    font: &Font<'_>,
    x: i32,
    y: i32,
    anchor: Anchor,
    style: &TextStyle,
    text: &str,
) {
    let (w, h) = text_extent(font, style.size, text);
    if w <= 0 || h <= 0 {
        return;
    }
    let layer = text_layer(font, style, text, w as u32 + 2, h as u32 + 2, 1, 1);
    let rotated = imageops::rotate270(&layer);
    let (left, top) = anchor.origin(x, y, rotated.width() as i32, rotated.height() as i32);
    imageops::overlay(img, &rotated, left as i64, top as i64);
}

/// `text` alone on a transparent `width` x `height` layer, top-left at `(left, top)`.
fn text_layer(font: &Font<'_>, style: &TextStyle, text: &str, width: u32, height: u32, left: i32, top: i32) -> RgbaImage {
    let mut layer = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let rgba = style.color.to_rgba();
    draw_text_mut(&mut layer, rgba, left, top, Scale::uniform(style.size), font, text);
    // Text drawn on a transparent layer carries coverage in every channel;
    // restore the color and keep coverage in alpha only.
    for px in layer.pixels_mut() {
        let coverage = px[3];
        *px = Rgba([rgba[0], rgba[1], rgba[2], coverage]);
    }
    layer
}

/// Draw `text` rotated `degrees` counter-clockwise with the top-right
/// corner of its rotated bounding box at `(x, y)`, like right-aligned
/// slanted tick labels.
pub fn draw_text_rotated(
    img: &mut RgbaImage,
    font: &Font<'_>,
    x: i32,
    y: i32,
    style: &TextStyle,
    text: &str,
    degrees: f32,
) {
    let (w, h) = text_extent(font, style.size, text);
    if w <= 0 || h <= 0 {
        return;
    }
    let (wf, hf) = (w as f32, h as f32);
    let side = (wf.hypot(hf).ceil() as u32) + 4;
    let layer = text_layer(font, style, text, side, side, (side as i32 - w) / 2, (side as i32 - h) / 2);
    let theta = degrees.to_radians();
    let rotated = rotate_about_center(&layer, -theta, Interpolation::Bilinear, Rgba([0, 0, 0, 0]));

    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let bbox_w = wf * cos + hf * sin;
    let bbox_h = wf * sin + hf * cos;
    let centre = side as f32 / 2.0;
    let left = x as f32 - (centre + bbox_w / 2.0);
    let top = y as f32 - (centre - bbox_h / 2.0);
    imageops::overlay(img, &rotated, left.round() as i64, top.round() as i64);
}

/// Text in a white box with a thin black frame, anchored at `(x, y)`.
pub fn draw_boxed_text(
    img: &mut RgbaImage,
    font: &Font<'_>,
    x: i32,
    y: i32,
    anchor: Anchor,
    style: &TextStyle,
    text: &str,
    padding: i32,
) {
    let (w, h) = text_extent(font, style.size, text);
    let (box_w, box_h) = (w + 2 * padding, h + 2 * padding);
    if box_w <= 0 || box_h <= 0 {
        return;
    }
    let (left, top) = anchor.origin(x, y, box_w, box_h);
    let rect = Rect::at(left, top).of_size(box_w as u32, box_h as u32);
    draw_filled_rect_mut(img, rect, Color::WHITE.to_rgba());
    draw_hollow_rect_mut(img, rect, Color::BLACK.to_rgba());
    draw_text(
        img,
        font,
        left + padding,
        top + padding,
        Anchor::TopLeft,
        style,
        text,
    );
}

/// Integer label with C `%d` semantics (truncation toward zero).
pub fn format_value(value: f32) -> String {
    format!("{}", value.trunc() as i64)
}

/// A numeric label placed at a geographic position.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabel {
    pub lon: f64,
    pub lat: f64,
    pub value: f32,
    pub text: String,
}

/// Labels for every `density`-th cell of `field` whose coordinate lies
/// inside `bbox` shrunk by `margin` degrees. NaN cells are skipped.
pub fn value_labels(
    field: &GridView<'_>,
    coords: &LatLonGrid,
    bbox: &BoundingBox,
    margin: f64,
    density: usize,
) -> RenderResult<Vec<ValueLabel>> {
    if density == 0 {
        return Err(RenderError::invalid("density", "must be at least 1"));
    }
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
    let inner = bbox.shrink(margin);
    let rows: Vec<usize> = (0..field.height)
        .filter(|&r| coords.lats[r] >= inner.min_y && coords.lats[r] <= inner.max_y)
        .collect();
    let cols: Vec<usize> = (0..field.width)
        .filter(|&c| coords.lons[c] >= inner.min_x && coords.lons[c] <= inner.max_x)
        .collect();

    let mut labels = Vec::new();
    for &r in rows.iter().step_by(density) {
        for &c in cols.iter().step_by(density) {
            let value = field.get(r, c);
            if value.is_nan() {
                continue;
            }
            labels.push(ValueLabel {
                lon: coords.lons[c],
                lat: coords.lats[r],
                value,
                text: format_value(value),
            });
        }
    }
    debug!(count = labels.len(), density, "Value labels selected");
    Ok(labels)
}
