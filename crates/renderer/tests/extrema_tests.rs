//! Tests for local extrema detection and labelling.

use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::extrema::{label_cells, DEFAULT_PERTURBATION};
use renderer::{ExtremaFinder, ExtremumKind, GridView};
use test_utils::{create_constant_grid, create_gaussian_bump, create_grid_with_nans, create_height_field_with_centres};
use wx_common::LatLonGrid;

fn coords(width: usize, height: usize) -> LatLonGrid {
    let lats = (0..height).map(|i| 45.0 + i as f64 * 0.5).collect();
    let lons = (0..width).map(|i| 5.0 + i as f64 * 0.5).collect();
    LatLonGrid::new(lats, lons).unwrap()
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn test_flat_field_reports_single_plateau() {
    let data = create_constant_grid(3, 3, 5.0);
    let grid = GridView::new(&data, 3, 3).unwrap();
    let found = ExtremaFinder::new(ExtremumKind::Max, 3).find(&grid).unwrap();
    assert_eq!(found, vec![(1, 1)]);
}

#[test]
fn test_single_peak_with_large_window() {
    let data = create_gaussian_bump(12, 10, 5, 6, 40.0, 2.0, 1000.0);
    let grid = GridView::new(&data, 12, 10).unwrap();
    let found = ExtremaFinder::new(ExtremumKind::Max, 25).find(&grid).unwrap();
    assert_eq!(found, vec![(5, 6)]);
}

#[test]
fn test_minimum_of_inverted_peak() {
    let data = create_gaussian_bump(12, 10, 4, 3, -40.0, 2.0, 1000.0);
    let grid = GridView::new(&data, 12, 10).unwrap();
    let found = ExtremaFinder::new(ExtremumKind::Min, 25).find(&grid).unwrap();
    assert_eq!(found, vec![(4, 3)]);
}

#[test]
fn test_high_and_low_centres() {
    let (w, h) = (40, 20);
    let data = create_height_field_with_centres(w, h);
    let grid = GridView::new(&data, w, h).unwrap();

    let highs = ExtremaFinder::new(ExtremumKind::Max, 15).find(&grid).unwrap();
    assert!(highs.contains(&(h / 2, w / 4)), "highs: {:?}", highs);
    assert!(!highs.contains(&(h / 2, 3 * w / 4)));

    let lows = ExtremaFinder::new(ExtremumKind::Min, 15).find(&grid).unwrap();
    assert!(lows.contains(&(h / 2, 3 * w / 4)), "lows: {:?}", lows);
}

#[test]
fn test_edges_are_never_reported() {
    // Peak on the first row
    let data = create_gaussian_bump(8, 8, 0, 4, 40.0, 1.5, 0.0);
    let grid = GridView::new(&data, 8, 8).unwrap();
    let found = ExtremaFinder::new(ExtremumKind::Max, 3).find(&grid).unwrap();
    assert!(found.iter().all(|&(r, c)| r != 0 && c != 0));
    assert!(!found.contains(&(0, 4)));
}

#[test]
fn test_nan_cells_are_skipped() {
    let data = create_grid_with_nans(5, 5, &[(2, 2)]);
    let grid = GridView::new(&data, 5, 5).unwrap();
    let found = ExtremaFinder::new(ExtremumKind::Max, 3).find(&grid).unwrap();
    assert!(!found.contains(&(2, 2)));
}

#[test]
fn test_perturbation_is_reproducible_with_seed() {
    let data = create_constant_grid(10, 10, 1000.0);
    let grid = GridView::new(&data, 10, 10).unwrap();
    let finder = ExtremaFinder::new(ExtremumKind::Max, 5).with_perturbation(DEFAULT_PERTURBATION);

    let a = finder.find_with_rng(&grid, &mut StdRng::seed_from_u64(7)).unwrap();
    let b = finder.find_with_rng(&grid, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a, b);
    // Noise breaks the plateau up; nothing lands on the excluded edges
    assert!(a.iter().all(|&(r, c)| r != 0 && c != 0));
}

#[test]
fn test_zero_window_is_rejected() {
    let data = create_constant_grid(3, 3, 1.0);
    let grid = GridView::new(&data, 3, 3).unwrap();
    assert!(ExtremaFinder::new(ExtremumKind::Min, 0).find(&grid).is_err());
}

// ============================================================================
// Mode parsing
// ============================================================================

#[test]
fn test_mode_parsing() {
    assert_eq!("max".parse::<ExtremumKind>().unwrap(), ExtremumKind::Max);
    assert_eq!("min".parse::<ExtremumKind>().unwrap(), ExtremumKind::Min);

    let err = "wrong".parse::<ExtremumKind>().unwrap_err();
    assert!(err.to_string().contains("max or min"));
}

// ============================================================================
// Labelling
// ============================================================================

#[test]
fn test_annotate_attaches_coordinates_and_labels() {
    let data = create_gaussian_bump(12, 10, 5, 6, 12.6, 2.0, 1000.0);
    let grid = GridView::new(&data, 12, 10).unwrap();
    let extrema = ExtremaFinder::new(ExtremumKind::Max, 25)
        .annotate(&grid, &coords(12, 10), "H")
        .unwrap();

    assert_eq!(extrema.len(), 1);
    let e = &extrema[0];
    assert_eq!((e.row, e.col), (5, 6));
    assert_eq!((e.lon, e.lat), (8.0, 47.5));
    assert_eq!(e.symbol, "H");
    assert_eq!(e.label, "1013");
}

#[test]
fn test_annotate_rejects_mismatched_coordinates() {
    let data = create_constant_grid(4, 4, 1.0);
    let grid = GridView::new(&data, 4, 4).unwrap();
    let result = ExtremaFinder::new(ExtremumKind::Max, 3).annotate(&grid, &coords(5, 4), "H");
    assert!(result.is_err());
}

#[test]
fn test_label_rounds_negative_values() {
    let data = vec![-3.6f32; 4];
    let grid = GridView::new(&data, 2, 2).unwrap();
    let labelled = label_cells(&grid, &coords(2, 2), &[(1, 1)], "L");
    assert_eq!(labelled[0].label, "-4");
}
