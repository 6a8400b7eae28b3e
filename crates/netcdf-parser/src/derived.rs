//! Quantities derived from the fields read from disk.

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::NetCdfResult;

/// Mean earth radius (m).
pub const EARTH_RADIUS: f64 = 6_371_008.7714;

/// Standard gravity (m s⁻²).
pub const GRAVITY: f64 = 9.806_65;

/// Names under which geopotential appears in model output.
pub const GEOPOTENTIAL_NAMES: [&str; 3] = ["z", "fi", "FI"];

/// Height (m) of a geopotential value (m² s⁻²) above a spherical earth.
pub fn geopotential_to_height(geopotential: f32) -> f32 {
    let phi = geopotential as f64;
    (phi * EARTH_RADIUS / (GRAVITY * EARTH_RADIUS - phi)) as f32
}

/// Add the geopotential height field `geop` (m) to the dataset.
pub fn compute_geopot_height(dataset: &mut Dataset) -> NetCdfResult<()> {
    let mut field = dataset.field_any(&GEOPOTENTIAL_NAMES)?.clone();
    debug!(source = %field.name, "Computing geopotential height");
    for v in field.data.iter_mut() {
        *v = geopotential_to_height(*v);
    }
    field.name = "geop".to_string();
    field.units = Some("m".to_string());
    dataset.insert_field(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use wx_common::LatLonGrid;

    #[test]
    fn test_height_of_500hpa_geopotential() {
        // ~5500 gpm at 500 hPa
        let h = geopotential_to_height(5500.0 * GRAVITY as f32);
        assert!((h - 5504.75).abs() < 1.0, "height = {}", h);
        assert_eq!(geopotential_to_height(0.0), 0.0);
    }

    #[test]
    fn test_compute_geopot_height_adds_field() {
        let grid = LatLonGrid::new(vec![50.0], vec![8.0, 9.0]).unwrap();
        let mut ds = Dataset::new(vec![], None, grid);
        ds.insert_field(Field::surface("FI", Some("m2 s-2".into()), vec![9806.65, 0.0], 1, 2).unwrap())
            .unwrap();
        compute_geopot_height(&mut ds).unwrap();
        let geop = ds.field("geop").unwrap();
        assert!((geop.data[0] - 1000.16).abs() < 0.05);
        assert_eq!(geop.units.as_deref(), Some("m"));
    }

    #[test]
    fn test_missing_geopotential() {
        let grid = LatLonGrid::new(vec![50.0], vec![8.0]).unwrap();
        let mut ds = Dataset::new(vec![], None, grid);
        assert!(compute_geopot_height(&mut ds).is_err());
    }
}
