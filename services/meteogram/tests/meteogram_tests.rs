//! Meteogram data preparation and rendering on a synthetic point dataset.

use chrono::{DateTime, Duration, TimeZone, Utc};
use geocoding::Coordinates;
use meteogram::{plot_point, select_city, MeteogramData, MeteogramRenderer};
use netcdf_parser::{Dataset, Field};
use renderer::{Colormap, IconResolver};
use tempfile::TempDir;
use test_utils::{assert_approx_eq, chart_dirs, write_plotting_assets};
use wx_common::{LatLonGrid, WxConfig};

const STEPS: usize = 13;
const LEVELS: [f64; 5] = [100000.0, 85000.0, 70000.0, 50000.0, 30000.0];
const CELLS: usize = 4;

fn run() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap()
}

fn levelled(name: &str, units: &str, value: impl Fn(usize, usize) -> f32) -> Field {
    let data: Vec<f32> = (0..STEPS)
        .flat_map(|t| (0..LEVELS.len()).map(move |z| (t, z)))
        .flat_map(|(t, z)| std::iter::repeat(value(t, z)).take(CELLS))
        .collect();
    Field::new(name, Some(units.into()), data, [STEPS, LEVELS.len(), 2, 2], true, true).unwrap()
}

fn surface(name: &str, units: &str, value: impl Fn(usize) -> f32) -> Field {
    let data: Vec<f32> = (0..STEPS)
        .flat_map(|t| std::iter::repeat(value(t)).take(CELLS))
        .collect();
    Field::new(name, Some(units.into()), data, [STEPS, 1, 2, 2], true, false).unwrap()
}

/// Hourly 2x2 dataset around Hamburg with simple, known values.
fn model_dataset() -> Dataset {
    let times = (0..STEPS).map(|h| run() + Duration::hours(h as i64)).collect();
    let grid = LatLonGrid::new(vec![53.5, 53.6], vec![9.9, 10.0]).unwrap();
    let mut ds = Dataset::new(times, Some(LEVELS.to_vec()), grid);
    ds.run = Some(run());

    let fields = vec![
        levelled("t", "K", |_, z| 283.15 - 15.0 * z as f32),
        levelled("r", "%", |_, _| 60.0),
        levelled("u", "m s-1", |_, _| 10.0),
        levelled("v", "m s-1", |_, _| 0.0),
        surface("2t", "K", |t| 280.15 + t as f32 * 0.5),
        surface("2d", "K", |_| 275.15),
        surface("VMAX_10M", "m s-1", |_| 10.0),
        surface("prmsl", "Pa", |_| 101300.0),
        surface("WW", "1", |_| 0.0),
        surface("RAIN_GSP", "kg m-2", |t| t as f32 * 0.5),
        surface("SNOW_GSP", "kg m-2", |_| 0.0),
        Field::surface("HSURF", Some("m".into()), vec![12.0; CELLS], 2, 2).unwrap(),
    ];
    for field in fields {
        ds.insert_field(field).unwrap();
    }
    ds
}

fn hamburg() -> Dataset {
    select_city(&model_dataset(), "Hamburg", Coordinates::new(9.99, 53.58))
}

// ============================================================================
// Data preparation
// ============================================================================

#[test]
fn test_point_selection_tags_city() {
    let point = hamburg();
    assert_eq!(point.grid.ny(), 1);
    assert_eq!(point.grid.nx(), 1);
    assert_eq!(point.attrs.get("city").map(String::as_str), Some("Hamburg"));
    assert_eq!((point.grid.lons[0], point.grid.lats[0]), (10.0, 53.6));
}

#[test]
fn test_display_units() {
    let data = MeteogramData::from_point(&hamburg()).unwrap();

    assert_eq!(data.city, "Hamburg");
    assert_eq!(data.times.len(), STEPS);
    assert_eq!(data.pressure, vec![1000.0, 850.0, 700.0, 500.0, 300.0]);
    assert_eq!(data.elevation, 12.0);

    // Cross-section rows are levels: 10 °C at 1000 hPa, -5 °C at 850 hPa
    assert_approx_eq!(data.temperature[0], 10.0, 1e-3);
    assert_approx_eq!(data.temperature[STEPS], -5.0, 1e-3);
    assert_eq!(data.temperature.len(), STEPS * LEVELS.len());

    assert_approx_eq!(data.t2m[0], 7.0, 1e-3);
    assert_approx_eq!(data.td2m[4], 2.0, 1e-3);
    assert_approx_eq!(data.gust[0], 36.0, 1e-3);
    assert_approx_eq!(data.mslp[0], 1013.0, 1e-2);
}

#[test]
fn test_precipitation_rate_from_accumulation() {
    let data = MeteogramData::from_point(&hamburg()).unwrap();
    assert_eq!(data.precip_times.len(), STEPS);
    assert_eq!(data.rain_acc[4], 2.0);
    assert!(data.rain_rate.iter().all(|r| (r - 0.5).abs() < 1e-4));
    assert!(data.snow_rate.iter().all(|r| r.abs() < 1e-6));
}

#[test]
fn test_barbs_every_three_hours() {
    let data = MeteogramData::from_point(&hamburg()).unwrap();
    assert_eq!(data.barb_steps(3), vec![0, 3, 6, 9, 12]);
}

#[test]
fn test_rejects_untagged_or_gridded_input() {
    let mut point = hamburg();
    point.attrs.clear();
    assert!(MeteogramData::from_point(&point).is_err());

    let mut gridded = model_dataset();
    gridded.attrs.insert("city".into(), "Hamburg".into());
    assert!(MeteogramData::from_point(&gridded).is_err());
}

#[test]
fn test_missing_variable_is_an_error() {
    let mut point = hamburg();
    point.fields.remove("prmsl");
    let err = MeteogramData::from_point(&point).unwrap_err();
    assert!(err.to_string().contains("prmsl"), "{}", err);
}

// ============================================================================
// Rendering
// ============================================================================

fn renderer_for(home: &std::path::Path) -> MeteogramRenderer {
    let assets = write_plotting_assets(home, &["01"]);
    let colormap = Colormap::from_rgba_file(&assets.join("cmap_temp.rgba")).unwrap();
    let icons = IconResolver::new(assets.join("yrno_png"), chrono_tz::Europe::Berlin);
    MeteogramRenderer::new(&colormap, icons, None).unwrap()
}

#[test]
fn test_render_cross_section_colors() {
    let dir = TempDir::new().unwrap();
    let renderer = renderer_for(dir.path());
    let data = MeteogramData::from_point(&hamburg()).unwrap();

    let canvas = renderer.render(&data).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (1000, 1200));

    // Warm air near the ground on a blue-white-red map
    let low = canvas.image().get_pixel(400, 515);
    assert!(low[0] > low[2], "{:?}", low);
    // Above the highest level there is no data
    assert_eq!(canvas.image().get_pixel(400, 40).0, [255, 255, 255, 255]);
}

#[test]
fn test_render_fails_without_icons() {
    let dir = TempDir::new().unwrap();
    let renderer = renderer_for(dir.path());
    let mut data = MeteogramData::from_point(&hamburg()).unwrap();
    // Thunderstorm glyph is not among the fixtures
    data.weather_code[2] = 95.0;
    assert!(renderer.render(&data).is_err());
}

#[test]
fn test_plot_point_writes_named_png() {
    let dir = TempDir::new().unwrap();
    let (data, home) = chart_dirs(dir.path());
    let config = WxConfig::from_lookup(|key| match key {
        "HOME_FOLDER" => Some(home.to_string_lossy().to_string()),
        "MODEL_DATA_FOLDER" => Some(data.to_string_lossy().to_string()),
        _ => None,
    })
    .unwrap();

    let renderer = renderer_for(&home);
    let path = plot_point(&renderer, &hamburg(), &config).unwrap();

    // Images are written into the model data folder
    assert_eq!(path, data.join("meteogram_Hamburg.png"));
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1000, 1200));
}
