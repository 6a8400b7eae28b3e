//! Wind barbs drawn as vector paths.
//!
//! Speeds are rounded to the nearest half barb (5 units) and decomposed
//! into flags (50), full barbs (10) and half barbs (5). The barb's tip sits
//! at the anchor point and the staff points toward where the wind blows
//! from, with feathers on the clockwise side.

use std::f64::consts::PI;

use tiny_skia::{FillRule, LineCap, Paint, PathBuilder, PixmapMut, Stroke, Transform};

use crate::colormap::Color;

const FLAG: f64 = 50.0;
const FULL: f64 = 10.0;
const HALF: f64 = 5.0;

/// Feather geometry as fractions of the staff length.
const SPACING: f32 = 0.125;
const HEIGHT: f32 = 0.4;
const WIDTH: f32 = 0.25;
const EMPTY_RADIUS: f32 = 0.15;

/// Barb drawing parameters.
#[derive(Debug, Clone)]
pub struct BarbConfig {
    /// Staff length in pixels
    pub length: f32,
    pub color: Color,
    pub line_width: f32,
    /// Opacity applied on top of the color's own alpha
    pub alpha: f32,
}

impl Default for BarbConfig {
    fn default() -> Self {
        Self {
            length: 22.0,
            color: Color::BLACK,
            line_width: 1.0,
            alpha: 1.0,
        }
    }
}

/// Convert U and V wind components to speed and the direction the wind
/// blows FROM, in radians, math convention (0 = from east, π/2 = from north).
pub fn uv_to_speed_direction(u: f32, v: f32) -> (f64, f64) {
    let u = u as f64;
    let v = v as f64;
    let speed = (u * u + v * v).sqrt();
    let mut direction = (-v).atan2(-u);
    if direction < 0.0 {
        direction += 2.0 * PI;
    }
    (speed, direction)
}

/// Feather counts for one speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarbShape {
    pub flags: u32,
    pub full: u32,
    pub half: bool,
    /// Nothing to draw on the staff: rendered as a small circle
    pub calm: bool,
}

impl BarbShape {
    pub fn from_speed(speed: f64) -> Self {
        let rounded = HALF * (speed / HALF).round();
        let flags = (rounded / FLAG).floor() as u32;
        let rest = rounded % FLAG;
        let full = (rest / FULL).floor() as u32;
        let half = rest % FULL >= HALF;
        Self {
            flags,
            full,
            half,
            calm: flags == 0 && full == 0 && !half,
        }
    }
}

/// Draw one barb with its tip at pixel `(x, y)`. NaN components are skipped.
pub fn draw_barb(pixmap: &mut PixmapMut<'_>, x: f32, y: f32, u: f32, v: f32, config: &BarbConfig) {
    if u.is_nan() || v.is_nan() {
        return;
    }
    let (speed, direction) = uv_to_speed_direction(u, v);
    let shape = BarbShape::from_speed(speed);

    let mut paint = Paint::default();
    paint.set_color(config.color.with_alpha(config.alpha).to_skia());
    paint.anti_alias = true;
    let stroke = Stroke {
        width: config.line_width,
        line_cap: LineCap::Round,
        ..Stroke::default()
    };

    let len = config.length;
    if shape.calm {
        if let Some(circle) = PathBuilder::from_circle(x, y, EMPTY_RADIUS * len) {
            pixmap.stroke_path(&circle, &paint, &stroke, Transform::identity(), None);
        }
        return;
    }

    // Unit vector along the staff (screen y grows downward) and the
    // feather side perpendicular to it.
    let (dx, dy) = (direction.cos() as f32, -(direction.sin() as f32));
    let (px, py) = (-dy, dx);
    let at = |dist: f32, out: f32| (x + dx * dist + px * out, y + dy * dist + py * out);

    let mut lines = PathBuilder::new();
    let (ex, ey) = at(len, 0.0);
    lines.move_to(x, y);
    lines.line_to(ex, ey);

    let mut flags = PathBuilder::new();
    let mut offset = len;
    for _ in 0..shape.flags {
        let (ax, ay) = at(offset, 0.0);
        let (bx, by) = at(offset - WIDTH * len / 2.0, HEIGHT * len);
        let (cx, cy) = at(offset - WIDTH * len, 0.0);
        flags.move_to(ax, ay);
        flags.line_to(bx, by);
        flags.line_to(cx, cy);
        flags.close();
        offset -= WIDTH * len + SPACING * len;
    }
    for _ in 0..shape.full {
        let (ax, ay) = at(offset, 0.0);
        let (bx, by) = at(offset + WIDTH * len / 2.0, HEIGHT * len);
        lines.move_to(ax, ay);
        lines.line_to(bx, by);
        offset -= SPACING * len;
    }
    if shape.half {
        // A lone half barb is set in from the end of the staff.
        if shape.flags == 0 && shape.full == 0 {
            offset -= 1.5 * SPACING * len;
        }
        let (ax, ay) = at(offset, 0.0);
        let (bx, by) = at(offset + WIDTH * len / 4.0, HEIGHT * len / 2.0);
        lines.move_to(ax, ay);
        lines.line_to(bx, by);
    }

    if let Some(path) = lines.finish() {
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
    if let Some(path) = flags.finish() {
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}
