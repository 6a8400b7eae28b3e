//! Level selection and chart output on a synthetic pressure-level dataset.

use chrono::{DateTime, Duration, TimeZone, Utc};
use map_plotter::plot::fit_map_rect;
use map_plotter::{levels_pa, output_file, read_options, LevelSlice, MapAssets, MapPlotter, VARIABLES};
use netcdf_parser::{compute_geopot_height, Dataset, Field};
use renderer::{Colormap, Rect};
use tempfile::TempDir;
use test_utils::fixtures::RGBA_TABLE;
use wx_common::{LatLonGrid, Region, ValidTime};

const STEPS: usize = 3;

fn run() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap()
}

fn lats() -> Vec<f64> {
    (0..17).map(|i| 47.0 + i as f64 * 0.5).collect()
}

fn lons() -> Vec<f64> {
    (0..21).map(|i| 5.0 + i as f64 * 0.5).collect()
}

/// Temperature rising eastwards from -9.5 °C to 10.5 °C on every level;
/// geopotential height flat in space, 1500 m rising 10 m per step.
fn level_dataset() -> Dataset {
    dataset_with_steps(STEPS, Duration::hours(1))
}

fn dataset_with_steps(steps: usize, interval: Duration) -> Dataset {
    let levels = levels_pa();
    let (lats, lons) = (lats(), lons());
    let (ny, nx, nz) = (lats.len(), lons.len(), levels.len());
    let times = (0..steps).map(|i| run() + interval * i as i32).collect();

    let mut t = Vec::new();
    let mut fi = Vec::new();
    for step in 0..steps {
        for _ in 0..nz {
            for _ in 0..ny {
                for lon in &lons {
                    t.push(263.65 + (*lon as f32 - 5.0) * 2.0);
                    fi.push(9.80665 * (1500.0 + 10.0 * step as f32));
                }
            }
        }
    }

    let mut ds = Dataset::new(times, Some(levels), LatLonGrid::new(lats, lons).unwrap());
    ds.run = Some(run());
    ds.insert_field(Field::new("t", Some("K".into()), t, [steps, nz, ny, nx], true, true).unwrap())
        .unwrap();
    ds.insert_field(Field::new("fi", Some("m2 s-2".into()), fi, [steps, nz, ny, nx], true, true).unwrap())
        .unwrap();
    compute_geopot_height(&mut ds).unwrap();
    ds
}

fn colormap(dir: &std::path::Path) -> Colormap {
    let path = test_utils::write_rgba_table(dir, "temp", RGBA_TABLE);
    Colormap::from_rgba_file(&path).unwrap()
}

// ============================================================================
// Level selection
// ============================================================================

#[test]
fn test_select_level_converts_and_derives_levels() {
    let slice = LevelSlice::select(&level_dataset(), 850).unwrap();

    assert_eq!(slice.level, 850);
    assert_eq!(slice.dataset.attrs.get("plev").map(String::as_str), Some("85000"));
    let t = slice.dataset.field("t").unwrap();
    assert_eq!(t.units.as_deref(), Some("degC"));
    assert!(!t.has_level);

    assert_eq!(slice.temp_levels.first(), Some(&-9.0));
    assert_eq!(slice.temp_levels.last(), Some(&9.0));
    assert_eq!(slice.temp_levels.len(), 19);
    // Heights span 1500..1520 m: only one isoline below the maximum
    assert_eq!(slice.geop_levels, vec![1500.0]);
}

#[test]
fn test_chunks_keep_levels() {
    let slice = LevelSlice::select(&level_dataset(), 500).unwrap();
    let chunks = slice.chunks(2);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].dataset.ntimes(), 2);
    assert_eq!(chunks[1].dataset.ntimes(), 1);
    assert!(chunks.iter().all(|c| c.temp_levels == slice.temp_levels && c.level == 500));
    assert_eq!(chunks[1].dataset.times[0], run() + Duration::hours(2));

    assert_eq!(slice.head(2).dataset.ntimes(), 2);
}

#[test]
fn test_read_options_resample_hourly() {
    let options = read_options(Region::It);
    assert!(options.hourly);
    assert_eq!(options.region, Some(Region::It));
    assert_eq!(options.levels, Some(levels_pa()));
    assert_eq!(options.variables, VARIABLES.to_vec());
}

#[test]
fn test_quarter_hourly_steps_give_one_chart_per_hour() {
    // 06:00 .. 07:45 every 15 minutes
    let raw = dataset_with_steps(8, Duration::minutes(15));
    let hourly = raw.resample_hourly().unwrap();
    assert_eq!(hourly.times, vec![run(), run() + Duration::hours(1)]);

    let dir = TempDir::new().unwrap();
    let plotter = MapPlotter::new(
        Region::De,
        colormap(dir.path()),
        MapAssets::default(),
        chrono_tz::Europe::Berlin,
        dir.path(),
    );
    let slice = LevelSlice::select(&hourly, 700).unwrap();
    let written = plotter.plot_slice(&slice).unwrap();

    assert_eq!(written, vec![output_file(dir.path(), 700, 0), output_file(dir.path(), 700, 1)]);
}

#[test]
fn test_missing_geopotential_height() {
    let mut ds = level_dataset();
    ds.fields.remove("geop");
    assert!(LevelSlice::select(&ds, 700).is_err());
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_map_rect_for_germany() {
    let rect = fit_map_rect(Rect::new(30.0, 20.0, 1040.0, 780.0), Region::De.bbox().aspect());
    assert_eq!(rect.top, 20.0);
    assert_eq!(rect.height, 780.0);
    assert!(rect.width < 1040.0);
}

#[test]
fn test_render_step_without_font() {
    let dir = TempDir::new().unwrap();
    let plotter = MapPlotter::new(
        Region::De,
        colormap(dir.path()),
        MapAssets::default(),
        chrono_tz::Europe::Berlin,
        dir.path(),
    );
    let slice = LevelSlice::select(&level_dataset(), 850).unwrap();
    let canvas = plotter
        .render_step(&slice, 0, &ValidTime::new(run(), 0))
        .unwrap();
    assert_eq!((canvas.width(), canvas.height()), (1100, 900));

    // Cold western edge on a blue-white-red colormap
    let west = plotter.view().to_pixel(5.5, 51.25);
    let px = canvas.image().get_pixel(west.x as u32, west.y as u32);
    assert!(px[2] > px[0], "{:?}", px);
    // Left margin outside the map stays blank
    assert_eq!(canvas.image().get_pixel(10, 400).0, [255, 255, 255, 255]);
}

#[test]
fn test_plot_slice_writes_one_file_per_hour() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("it");
    std::fs::create_dir_all(&out).unwrap();
    let plotter = MapPlotter::new(
        Region::De,
        colormap(dir.path()),
        MapAssets::default(),
        chrono_tz::Europe::Berlin,
        &out,
    );
    let slice = LevelSlice::select(&level_dataset(), 950).unwrap();

    let written = plotter.plot_slice(&slice).unwrap();

    let expected: Vec<_> = (0..STEPS as i64).map(|h| output_file(&out, 950, h)).collect();
    assert_eq!(written, expected);
    assert!(out.join("t_950_2.png").is_file());
    let decoded = image::open(&written[0]).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1100, 900));
}
