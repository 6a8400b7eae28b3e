//! Tests for weather-code icon resolution.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use renderer::icons::{icon_id, icon_key, EMPTY_ICON};
use renderer::{IconResolver, RenderError};
use tempfile::TempDir;
use test_utils::write_plotting_assets;

fn winter(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
}

fn resolver(icons: &[&str]) -> (TempDir, IconResolver) {
    let home = TempDir::new().unwrap();
    let assets = write_plotting_assets(home.path(), icons);
    let resolver = IconResolver::new(assets.join("yrno_png"), Berlin);
    (home, resolver)
}

// ============================================================================
// Code table
// ============================================================================

#[test]
fn test_codes_map_to_glyph_ids() {
    assert_eq!(icon_id(0.0), "01");
    assert_eq!(icon_id(1.0), "02");
    assert_eq!(icon_id(2.0), "02");
    assert_eq!(icon_id(45.0), "15");
    assert_eq!(icon_id(71.0), "49");
    assert_eq!(icon_id(95.0), "25");
}

#[test]
fn test_unknown_code_uses_empty_icon() {
    assert_eq!(icon_id(4.0), EMPTY_ICON);
    assert_eq!(icon_id(96.0), EMPTY_ICON);
    assert_eq!(icon_id(-1.0), EMPTY_ICON);
}

#[test]
fn test_summer_day_night_boundary() {
    // CEST: 16 UTC is 18 local
    let day = Utc.with_ymd_and_hms(2024, 7, 1, 16, 0, 0).unwrap();
    let night = Utc.with_ymd_and_hms(2024, 7, 1, 17, 0, 0).unwrap();
    assert_eq!(icon_key(0.0, day, Berlin), "01d");
    assert_eq!(icon_key(0.0, night, Berlin), "01n");
}

// ============================================================================
// Resolution from the glyph folder
// ============================================================================

#[test]
fn test_resolves_day_variant() {
    let (_home, resolver) = resolver(&["01d", "01n"]);
    let path = resolver.resolve_path(0.0, winter(11)).unwrap();
    assert!(path.ends_with("01d.png"));
    let path = resolver.resolve_path(0.0, winter(22)).unwrap();
    assert!(path.ends_with("01n.png"));
}

#[test]
fn test_falls_back_to_plain_icon() {
    let (_home, resolver) = resolver(&["04"]);
    let path = resolver.resolve_path(3.0, winter(11)).unwrap();
    assert!(path.ends_with("04.png"));
}

#[test]
fn test_missing_icon_is_not_found() {
    let (_home, resolver) = resolver(&["01d"]);
    let err = resolver.resolve_path(95.0, winter(11)).unwrap_err();
    assert!(matches!(err, RenderError::NotFound(_)));
}

#[test]
fn test_weather_icons_in_input_order() {
    let (_home, resolver) = resolver(&["01d", "04"]);
    let icons = resolver
        .weather_icons(&[0.0, 3.0, 0.0], &[winter(9), winter(10), winter(11)])
        .unwrap();
    assert_eq!(icons.len(), 3);
    assert!(icons.iter().all(|i| i.dimensions() == (8, 8)));
}

#[test]
fn test_weather_icons_length_mismatch() {
    let (_home, resolver) = resolver(&["01d"]);
    let err = resolver.weather_icons(&[0.0, 0.0], &[winter(11)]).unwrap_err();
    assert!(matches!(err, RenderError::InvalidArgument { .. }));
}
