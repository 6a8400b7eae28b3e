//! Isolines via marching squares.
//!
//! Contours are traced in grid index space (`x` = column, `y` = row) and
//! only mapped to pixels when stroked, so the same tracing works for map
//! grids and for time/pressure cross-sections with irregular axes.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, PixmapMut, Stroke, Transform};

use crate::colormap::Color;
use crate::view::GridView;

/// A point in grid index space or pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A traced contour line
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Configuration for contour rendering
#[derive(Debug, Clone)]
pub struct ContourConfig {
    /// Contour levels to draw
    pub levels: Vec<f32>,
    /// Line width in pixels
    pub line_width: f32,
    pub line_color: Color,
    /// Number of Chaikin smoothing passes (0 = none)
    pub smoothing_passes: u32,
    pub labels_enabled: bool,
    /// Label font size in pixels
    pub label_font_size: f32,
    /// Distance between labels along a line, in pixels
    pub label_spacing: f32,
    /// Decimals in labels; labels are right-aligned to four characters
    pub label_decimals: usize,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            levels: vec![],
            line_width: 1.0,
            line_color: Color::BLACK,
            smoothing_passes: 1,
            labels_enabled: false,
            label_font_size: 8.0,
            label_spacing: 200.0,
            label_decimals: 0,
        }
    }
}

impl ContourConfig {
    /// Label text for a level, `%4.0f` style by default.
    pub fn level_label(&self, level: f32) -> String {
        format!("{:4.prec$}", level, prec = self.label_decimals)
    }
}

/// Generate contour levels at multiples of `interval` within the data range.
pub fn generate_contour_levels(min_value: f32, max_value: f32, interval: f32) -> Vec<f32> {
    if interval <= 0.0 || max_value <= min_value {
        return vec![];
    }
    let first = (min_value / interval).ceil() as i64;
    let last = (max_value / interval).floor() as i64;
    (first..=last).map(|k| k as f32 * interval).collect()
}

/// Segments of the `level` isoline over the whole grid. Cells touching a
/// NaN are skipped.
pub fn march_squares(grid: &GridView<'_>, level: f32) -> Vec<Segment> {
    let (width, height) = (grid.width, grid.height);
    if width < 2 || height < 2 {
        return vec![];
    }

    let mut segments = Vec::new();
    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let tl = grid.get(y, x);
            let tr = grid.get(y, x + 1);
            let bl = grid.get(y + 1, x);
            let br = grid.get(y + 1, x + 1);
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let case = (tl >= level) as u8
                | ((tr >= level) as u8) << 1
                | ((br >= level) as u8) << 2
                | ((bl >= level) as u8) << 3;
            if case == 0 || case == 15 {
                continue;
            }
            let cell = Cell {
                x: x as f32,
                y: y as f32,
                tl,
                tr,
                br,
                bl,
                level,
            };
            cell.segments(case, &mut segments);
        }
    }
    segments
}

/// One marching-squares cell with its corner values.
struct Cell {
    x: f32,
    y: f32,
    tl: f32,
    tr: f32,
    br: f32,
    bl: f32,
    level: f32,
}

impl Cell {
    fn top(&self) -> Point {
        crossing(self.x, self.y, self.x + 1.0, self.y, self.tl, self.tr, self.level)
    }

    fn right(&self) -> Point {
        let x = self.x + 1.0;
        crossing(x, self.y, x, self.y + 1.0, self.tr, self.br, self.level)
    }

    fn bottom(&self) -> Point {
        let y = self.y + 1.0;
        crossing(self.x, y, self.x + 1.0, y, self.bl, self.br, self.level)
    }

    fn left(&self) -> Point {
        crossing(self.x, self.y, self.x, self.y + 1.0, self.tl, self.bl, self.level)
    }

    /// Corner bits: top-left 1, top-right 2, bottom-right 4, bottom-left 8.
    /// Saddles (5 and 10) produce two disconnected segments.
    fn segments(&self, case: u8, out: &mut Vec<Segment>) {
        let mut push = |start: Point, end: Point| out.push(Segment { start, end });
        match case {
            1 | 14 => push(self.left(), self.top()),
            2 | 13 => push(self.top(), self.right()),
            3 | 12 => push(self.left(), self.right()),
            4 | 11 => push(self.right(), self.bottom()),
            6 | 9 => push(self.top(), self.bottom()),
            7 | 8 => push(self.left(), self.bottom()),
            5 => {
                push(self.left(), self.top());
                push(self.right(), self.bottom());
            }
            10 => {
                push(self.top(), self.right());
                push(self.left(), self.bottom());
            }
            _ => {}
        }
    }
}

/// Point on the edge `(x1, y1)-(x2, y2)` where the linear interpolation of
/// the corner values reaches `level`.
fn crossing(x1: f32, y1: f32, x2: f32, y2: f32, v1: f32, v2: f32, level: f32) -> Point {
    if (v2 - v1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

const JOIN_EPSILON: f32 = 1e-3;

/// Chain unordered segments into polylines, growing each line from both
/// ends until no segment attaches.
pub fn connect_segments(segments: Vec<Segment>, level: f32) -> Vec<Contour> {
    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let mut points = std::collections::VecDeque::from([
            segments[first].start,
            segments[first].end,
        ]);

        loop {
            let (Some(&head), Some(&tail)) = (points.front(), points.back()) else {
                break;
            };
            let next = segments.iter().enumerate().find_map(|(i, seg)| {
                if used[i] {
                    return None;
                }
                if seg.start.distance(&tail) < JOIN_EPSILON {
                    Some((i, seg.end, true))
                } else if seg.end.distance(&tail) < JOIN_EPSILON {
                    Some((i, seg.start, true))
                } else if seg.end.distance(&head) < JOIN_EPSILON {
                    Some((i, seg.start, false))
                } else if seg.start.distance(&head) < JOIN_EPSILON {
                    Some((i, seg.end, false))
                } else {
                    None
                }
            });
            match next {
                Some((i, point, at_tail)) => {
                    used[i] = true;
                    if at_tail {
                        points.push_back(point);
                    } else {
                        points.push_front(point);
                    }
                }
                None => break,
            }
        }

        let points: Vec<Point> = points.into_iter().collect();
        let closed = points.len() > 2 && points[0].distance(&points[points.len() - 1]) < JOIN_EPSILON;
        contours.push(Contour {
            level,
            points,
            closed,
        });
    }
    contours
}

/// Chaikin corner cutting.
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();
    for _ in 0..iterations {
        let n = points.len();
        let pairs = if contour.closed { n } else { n - 1 };
        let mut cut = Vec::with_capacity(pairs * 2 + 2);
        if !contour.closed {
            cut.push(points[0]);
        }
        for i in 0..pairs {
            let (p, q) = (points[i], points[(i + 1) % n]);
            cut.push(Point::new(0.75 * p.x + 0.25 * q.x, 0.75 * p.y + 0.25 * q.y));
            cut.push(Point::new(0.25 * p.x + 0.75 * q.x, 0.25 * p.y + 0.75 * q.y));
        }
        if !contour.closed {
            cut.push(points[n - 1]);
        }
        points = cut;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Trace every configured level.
pub fn generate_all_contours(grid: &GridView<'_>, config: &ContourConfig) -> Vec<Contour> {
    let mut all = Vec::new();
    for &level in &config.levels {
        for contour in connect_segments(march_squares(grid, level), level) {
            all.push(smooth_contour(&contour, config.smoothing_passes));
        }
    }
    tracing::debug!(
        levels = config.levels.len(),
        contours = all.len(),
        points = all.iter().map(|c| c.points.len()).sum::<usize>(),
        "Generated contours"
    );
    all
}

/// Map contour points through `to_pixel`, dropping points that map to
/// non-finite coordinates.
pub fn project_contours<F>(contours: &[Contour], to_pixel: F) -> Vec<Contour>
where
    F: Fn(Point) -> Option<Point>,
{
    contours
        .iter()
        .map(|c| Contour {
            level: c.level,
            points: c.points.iter().filter_map(|&p| to_pixel(p)).collect(),
            closed: c.closed,
        })
        .filter(|c| c.points.len() >= 2)
        .collect()
}

/// Stroke pixel-space contours onto the pixmap.
pub fn stroke_contours(pixmap: &mut PixmapMut<'_>, contours: &[Contour], config: &ContourConfig) {
    let mut paint = Paint::default();
    let c = config.line_color;
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: config.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for contour in contours {
        let mut pb = PathBuilder::new();
        let mut points = contour.points.iter();
        let Some(first) = points.next() else {
            continue;
        };
        pb.move_to(first.x, first.y);
        for p in points {
            pb.line_to(p.x, p.y);
        }
        if contour.closed {
            pb.close();
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

/// Where to print a level label along a pixel-space contour.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPosition {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

fn contour_length(contour: &Contour) -> f32 {
    contour
        .points
        .windows(2)
        .map(|w| w[0].distance(&w[1]))
        .sum()
}

/// Evenly spaced label positions along pixel-space contours, kept away from
/// the image border and from each other.
pub fn label_positions(
    contours: &[Contour],
    config: &ContourConfig,
    width: f32,
    height: f32,
) -> Vec<LabelPosition> {
    let mut positions: Vec<LabelPosition> = Vec::new();
    if !config.labels_enabled {
        return positions;
    }
    let margin = config.label_font_size * 2.0;
    let min_distance = config.label_font_size * 4.0;

    for contour in contours {
        let total = contour_length(contour);
        if total < config.label_spacing * 0.5 {
            continue;
        }
        let count = ((total / config.label_spacing).floor() as usize).max(1);
        let spacing = total / (count as f32 + 1.0);
        let text = config.level_label(contour.level).trim().to_string();

        let mut walked = 0.0;
        let mut next_at = spacing;
        let mut placed = 0;
        for w in contour.points.windows(2) {
            let (p1, p2) = (w[0], w[1]);
            let seg = p1.distance(&p2);
            while placed < count && walked + seg >= next_at && seg > 0.0 {
                let t = (next_at - walked) / seg;
                let x = p1.x + t * (p2.x - p1.x);
                let y = p1.y + t * (p2.y - p1.y);
                let inside = x > margin && x < width - margin && y > margin && y < height - margin;
                let crowded = positions
                    .iter()
                    .any(|p| (p.x - x).powi(2) + (p.y - y).powi(2) < min_distance.powi(2));
                if inside && !crowded {
                    positions.push(LabelPosition {
                        x,
                        y,
                        text: text.clone(),
                    });
                }
                next_at += spacing;
                placed += 1;
            }
            walked += seg;
        }
    }
    positions
}
