//! Tests for contour tracing, projection and labelling.

use renderer::contour::{
    connect_segments, generate_all_contours, generate_contour_levels, label_positions, march_squares,
    project_contours, smooth_contour, stroke_contours, Contour, Point,
};
use renderer::{Canvas, Color, ContourConfig, GridView};
use test_utils::{create_constant_grid, create_gaussian_bump};

fn bump() -> Vec<f32> {
    create_gaussian_bump(20, 20, 10, 10, 10.0, 3.0, 0.0)
}

// ============================================================================
// Level generation
// ============================================================================

#[test]
fn test_levels_at_multiples_of_interval() {
    assert_eq!(generate_contour_levels(1480.0, 1560.0, 25.0), vec![1500.0, 1525.0, 1550.0]);
    assert_eq!(generate_contour_levels(-7.0, 7.0, 5.0), vec![-5.0, 0.0, 5.0]);
}

#[test]
fn test_levels_for_empty_range() {
    assert!(generate_contour_levels(5.0, 5.0, 1.0).is_empty());
    assert!(generate_contour_levels(0.0, 10.0, 0.0).is_empty());
}

// ============================================================================
// Marching squares
// ============================================================================

#[test]
fn test_constant_field_has_no_segments() {
    let data = create_constant_grid(6, 6, 3.0);
    let grid = GridView::new(&data, 6, 6).unwrap();
    assert!(march_squares(&grid, 3.5).is_empty());
    assert!(march_squares(&grid, 2.5).is_empty());
}

#[test]
fn test_bump_gives_one_closed_ring() {
    let data = bump();
    let grid = GridView::new(&data, 20, 20).unwrap();
    let contours = connect_segments(march_squares(&grid, 5.0), 5.0);
    assert_eq!(contours.len(), 1);
    let ring = &contours[0];
    assert!(ring.closed);
    assert_eq!(ring.level, 5.0);
    // Every point sits inside the grid around the peak
    for p in &ring.points {
        assert!(p.x > 5.0 && p.x < 15.0 && p.y > 5.0 && p.y < 15.0, "{:?}", p);
    }
}

#[test]
fn test_crossings_are_interpolated() {
    // Single cell: left column 0, right column 10; level 2.5 is a quarter across
    let data = vec![0.0, 10.0, 0.0, 10.0];
    let grid = GridView::new(&data, 2, 2).unwrap();
    let segments = march_squares(&grid, 2.5);
    assert_eq!(segments.len(), 1);
    assert!((segments[0].start.x - 0.25).abs() < 1e-6);
    assert!((segments[0].end.x - 0.25).abs() < 1e-6);
}

#[test]
fn test_cells_touching_nan_are_skipped() {
    let mut data = bump();
    data[10 * 20 + 10] = f32::NAN;
    let grid = GridView::new(&data, 20, 20).unwrap();
    // Only the cells around the peak reach this level
    assert!(march_squares(&grid, 9.9).is_empty());
}

// ============================================================================
// Smoothing and projection
// ============================================================================

#[test]
fn test_smoothing_keeps_open_ends() {
    let line = Contour {
        level: 0.0,
        points: vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(4.0, 4.0)],
        closed: false,
    };
    let smooth = smooth_contour(&line, 1);
    assert_eq!(smooth.points.len(), 6);
    assert_eq!(smooth.points[0], Point::new(0.0, 0.0));
    assert_eq!(smooth.points[5], Point::new(4.0, 4.0));
    assert_eq!(smooth_contour(&line, 0), line);
}

#[test]
fn test_projection_drops_unmapped_points() {
    let line = Contour {
        level: 1.0,
        points: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)],
        closed: false,
    };
    let projected = project_contours(&[line], |p| (p.x < 1.5).then(|| Point::new(p.x * 10.0, 5.0)));
    assert_eq!(projected.len(), 1);
    assert_eq!(projected[0].points, vec![Point::new(0.0, 5.0), Point::new(10.0, 5.0)]);

    let single = Contour {
        level: 1.0,
        points: vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0)],
        closed: false,
    };
    assert!(project_contours(&[single], |p| (p.x < 1.0).then_some(p)).is_empty());
}

// ============================================================================
// Labels and stroking
// ============================================================================

#[test]
fn test_level_label_format() {
    let config = ContourConfig::default();
    assert_eq!(config.level_label(1525.0), "1525");
    assert_eq!(config.level_label(25.0), "  25");
}

#[test]
fn test_no_labels_when_disabled() {
    let data = bump();
    let grid = GridView::new(&data, 20, 20).unwrap();
    let config = ContourConfig {
        levels: vec![5.0],
        ..ContourConfig::default()
    };
    let contours = generate_all_contours(&grid, &config);
    assert!(label_positions(&contours, &config, 20.0, 20.0).is_empty());
}

#[test]
fn test_labels_spread_along_long_contour() {
    let line = Contour {
        level: 1500.0,
        points: vec![Point::new(20.0, 100.0), Point::new(380.0, 100.0)],
        closed: false,
    };
    let config = ContourConfig {
        levels: vec![1500.0],
        labels_enabled: true,
        label_spacing: 100.0,
        ..ContourConfig::default()
    };
    let labels = label_positions(&[line], &config, 400.0, 200.0);
    assert_eq!(labels.len(), 3);
    assert!(labels.iter().all(|l| l.text == "1500" && l.y == 100.0));
    assert!(labels.windows(2).all(|w| w[1].x > w[0].x));
}

#[test]
fn test_stroke_marks_pixels() {
    let mut canvas = Canvas::new(40, 40, Color::WHITE).unwrap();
    let line = Contour {
        level: 0.0,
        points: vec![Point::new(0.0, 20.5), Point::new(40.0, 20.5)],
        closed: false,
    };
    let config = ContourConfig {
        line_width: 2.0,
        ..ContourConfig::default()
    };
    stroke_contours(&mut canvas.pixmap().unwrap(), &[line], &config);
    assert!(canvas.image().get_pixel(20, 20)[0] < 128);
    assert_eq!(canvas.image().get_pixel(20, 5)[0], 255);
}
