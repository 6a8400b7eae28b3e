//! In-memory forecast dataset and its selection operations.

use std::collections::BTreeMap;
use std::ops::Range;

use chrono::{DateTime, Duration, DurationRound, Utc};
use tracing::debug;
use wx_common::grid::nearest_index;
use wx_common::{BoundingBox, LatLonGrid, ValidTime};

use crate::error::{NetCdfError, NetCdfResult};
use crate::field::Field;

/// Named fields sharing one time axis, one optional pressure-level axis and
/// one lat/lon grid.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Model run initialization time.
    pub run: Option<DateTime<Utc>>,
    pub times: Vec<DateTime<Utc>>,
    /// Pressure levels in Pa.
    pub levels: Option<Vec<f64>>,
    pub grid: LatLonGrid,
    pub fields: BTreeMap<String, Field>,
    /// Free-form metadata such as the city a point was selected for.
    pub attrs: BTreeMap<String, String>,
}

impl Dataset {
    /// Empty dataset on the given axes.
    pub fn new(times: Vec<DateTime<Utc>>, levels: Option<Vec<f64>>, grid: LatLonGrid) -> Self {
        Self {
            run: None,
            times,
            levels,
            grid,
            fields: BTreeMap::new(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn ntimes(&self) -> usize {
        self.times.len()
    }

    pub fn nlevels(&self) -> usize {
        self.levels.as_ref().map_or(1, Vec::len)
    }

    /// Field by name (case-sensitive).
    pub fn field(&self, name: &str) -> NetCdfResult<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}'", name)))
    }

    pub fn field_mut(&mut self, name: &str) -> NetCdfResult<&mut Field> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}'", name)))
    }

    /// First field found among several spellings of the same quantity.
    pub fn field_any(&self, names: &[&str]) -> NetCdfResult<&Field> {
        names
            .iter()
            .find_map(|name| {
                self.fields
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, f)| f)
            })
            .ok_or_else(|| NetCdfError::MissingData(format!("any of variables {:?}", names)))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Add or replace a field, checking it against the dataset axes.
    pub fn insert_field(&mut self, field: Field) -> NetCdfResult<()> {
        if field.ny != self.grid.ny() || field.nx != self.grid.nx() {
            return Err(NetCdfError::InvalidFormat(format!(
                "field '{}' is {}x{}, grid is {}x{}",
                field.name,
                field.ny,
                field.nx,
                self.grid.ny(),
                self.grid.nx()
            )));
        }
        if field.has_time && field.nt != self.ntimes() {
            return Err(NetCdfError::InvalidFormat(format!(
                "field '{}' has {} steps, dataset has {}",
                field.name,
                field.nt,
                self.ntimes()
            )));
        }
        if field.has_level && field.nz != self.nlevels() {
            return Err(NetCdfError::InvalidFormat(format!(
                "field '{}' has {} levels, dataset has {}",
                field.name,
                field.nz,
                self.nlevels()
            )));
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Copy of the dataset with every field passed through `f`.
    fn map_fields<F>(&self, times: Vec<DateTime<Utc>>, levels: Option<Vec<f64>>, grid: LatLonGrid, f: F) -> Dataset
    where
        F: Fn(&Field) -> Field,
    {
        Dataset {
            run: self.run,
            times,
            levels,
            grid,
            fields: self
                .fields
                .iter()
                .map(|(name, field)| (name.clone(), f(field)))
                .collect(),
            attrs: self.attrs.clone(),
        }
    }

    /// Regular hourly time axis using the nearest source step within one
    /// hour; target steps with no source step in tolerance are NaN.
    ///
    /// The new axis runs from the first step floored to the hour up to the
    /// last step floored to the hour.
    pub fn resample_hourly(&self) -> NetCdfResult<Dataset> {
        let (first, last) = match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(NetCdfError::EmptySelection("dataset has no time steps".into())),
        };
        let hour = Duration::hours(1);
        let start = first
            .duration_trunc(hour)
            .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;
        let end = last
            .duration_trunc(hour)
            .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;

        let mut targets = Vec::new();
        let mut t = start;
        while t <= end {
            targets.push(t);
            t += hour;
        }

        let map: Vec<Option<usize>> = targets
            .iter()
            .map(|target| {
                self.times
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (i, (*t - *target).num_seconds().abs()))
                    .min_by_key(|&(_, d)| d)
                    .filter(|&(_, d)| d <= 3600)
                    .map(|(i, _)| i)
            })
            .collect();

        debug!(
            from = self.times.len(),
            to = targets.len(),
            missing = map.iter().filter(|m| m.is_none()).count(),
            "Resampled to hourly steps"
        );

        Ok(self.map_fields(targets, self.levels.clone(), self.grid.clone(), |f| {
            f.gather_steps(Some(&map), None)
        }))
    }

    /// Indices of the levels nearest to each target (Pa).
    fn nearest_levels(&self, targets: &[f64]) -> NetCdfResult<Vec<usize>> {
        let levels = self
            .levels
            .as_ref()
            .ok_or_else(|| NetCdfError::MissingData("pressure level axis".into()))?;
        Ok(targets.iter().map(|&p| nearest_index(levels, p)).collect())
    }

    /// Keep the levels nearest to the requested pressures (Pa).
    pub fn select_levels_nearest(&self, targets: &[f64]) -> NetCdfResult<Dataset> {
        let idx = self.nearest_levels(targets)?;
        let levels = self
            .levels
            .as_ref()
            .map(|levels| idx.iter().map(|&i| levels[i]).collect());
        Ok(self.map_fields(self.times.clone(), levels, self.grid.clone(), |f| {
            f.gather_steps(None, Some(&idx))
        }))
    }

    /// Select the single level nearest to `target` (Pa), dropping the axis.
    ///
    /// The selected pressure is kept in the `plev` attribute.
    pub fn select_level_nearest(&self, target: f64) -> NetCdfResult<Dataset> {
        let idx = self.nearest_levels(&[target])?;
        let mut out = self.map_fields(self.times.clone(), None, self.grid.clone(), |f| {
            f.gather_steps(None, Some(&idx)).squeeze_level()
        });
        if let Some(levels) = &self.levels {
            out.attrs.insert("plev".into(), levels[idx[0]].to_string());
        }
        Ok(out)
    }

    fn subset_grid(&self, rows: Range<usize>, cols: Range<usize>) -> Dataset {
        let grid = self.grid.subgrid(rows.clone(), cols.clone());
        self.map_fields(self.times.clone(), self.levels.clone(), grid, |f| {
            f.gather(None, None, rows.clone(), cols.clone())
        })
    }

    /// Crop to the cells inside a bounding box.
    pub fn crop(&self, bbox: &BoundingBox) -> NetCdfResult<Dataset> {
        let (rows, cols) = self.grid.crop_ranges(bbox)?;
        Ok(self.subset_grid(rows, cols))
    }

    /// Reduce the grid to the single cell nearest to a point.
    pub fn select_point_nearest(&self, lon: f64, lat: f64) -> Dataset {
        let (row, col) = self.grid.nearest(lon, lat);
        self.subset_grid(row..row + 1, col..col + 1)
    }

    /// Sub-range of time steps. Time-invariant fields are kept whole.
    pub fn isel_time(&self, range: Range<usize>) -> Dataset {
        let end = range.end.min(self.ntimes());
        let start = range.start.min(end);
        let map: Vec<Option<usize>> = (start..end).map(Some).collect();
        self.map_fields(self.times[start..end].to_vec(), self.levels.clone(), self.grid.clone(), |f| {
            f.gather_steps(Some(&map), None)
        })
    }

    /// Consecutive time chunks of at most `size` steps.
    pub fn time_chunks(&self, size: usize) -> Vec<Dataset> {
        let size = size.max(1);
        (0..self.ntimes())
            .step_by(size)
            .map(|start| self.isel_time(start..start + size))
            .collect()
    }

    /// Hours since the run for every time step.
    pub fn forecast_hours(&self) -> NetCdfResult<Vec<i64>> {
        Ok(self.valid_times()?.iter().map(|vt| vt.forecast_hour).collect())
    }

    /// (run, forecast hour) pair for every time step.
    pub fn valid_times(&self) -> NetCdfResult<Vec<ValidTime>> {
        let run = self
            .run
            .ok_or_else(|| NetCdfError::MissingData("run timestamp".into()))?;
        Ok(self
            .times
            .iter()
            .map(|t| ValidTime::from_step(run, *t))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    fn sample(times: Vec<DateTime<Utc>>) -> Dataset {
        let grid = LatLonGrid::new(vec![50.0, 51.0, 52.0], vec![8.0, 9.0, 10.0, 11.0]).unwrap();
        let nt = times.len();
        let levels = vec![100000.0, 85000.0, 50000.0];
        let mut ds = Dataset::new(times, Some(levels), grid);
        let data: Vec<f32> = (0..nt * 3 * 12).map(|v| v as f32).collect();
        ds.insert_field(Field::new("t", Some("K".into()), data, [nt, 3, 3, 4], true, true).unwrap())
            .unwrap();
        ds.insert_field(Field::surface("HSURF", Some("m".into()), vec![5.0; 12], 3, 4).unwrap())
            .unwrap();
        ds.run = Some(t0());
        ds
    }

    #[test]
    fn test_insert_field_checks_shape() {
        let mut ds = sample(vec![t0()]);
        let bad = Field::surface("x", None, vec![0.0; 6], 2, 3).unwrap();
        assert!(ds.insert_field(bad).is_err());
    }

    #[test]
    fn test_missing_field() {
        let ds = sample(vec![t0()]);
        assert!(matches!(ds.field("pmsl"), Err(NetCdfError::MissingData(_))));
        assert!(ds.field_any(&["hsurf"]).is_ok());
    }

    #[test]
    fn test_resample_hourly_with_tolerance() {
        // 3-hourly steps: targets at +1h and +2h are within an hour of a
        // source step, so nothing is missing
        let times = vec![t0(), t0() + Duration::hours(3), t0() + Duration::hours(6)];
        let ds = sample(times).resample_hourly().unwrap();
        assert_eq!(ds.ntimes(), 7);
        let t = ds.field("t").unwrap();
        assert_eq!(t.get(1, 0, 0, 0), t.get(0, 0, 0, 0));
        assert_eq!(t.get(2, 0, 0, 0), t.get(3, 0, 0, 0));
        assert!(t.data.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_resample_hourly_leaves_gaps_beyond_tolerance() {
        let times = vec![t0(), t0() + Duration::hours(6)];
        let ds = sample(times).resample_hourly().unwrap();
        let t = ds.field("t").unwrap();
        let series = t.series(0, 0, 0);
        assert!(!series[1].is_nan());
        assert!(series[2].is_nan() && series[3].is_nan() && series[4].is_nan());
        assert!(!series[5].is_nan());
    }

    #[test]
    fn test_select_levels() {
        let ds = sample(vec![t0()]);
        let sub = ds.select_levels_nearest(&[84000.0, 51000.0]).unwrap();
        assert_eq!(sub.levels, Some(vec![85000.0, 50000.0]));
        assert_eq!(sub.field("t").unwrap().nz, 2);

        let one = ds.select_level_nearest(70000.0).unwrap();
        let t = one.field("t").unwrap();
        assert!(!t.has_level);
        assert_eq!(one.attrs.get("plev").map(String::as_str), Some("85000"));
    }

    #[test]
    fn test_crop_and_point() {
        let ds = sample(vec![t0()]);
        let cropped = ds.crop(&BoundingBox::new(8.5, 50.5, 10.5, 52.5)).unwrap();
        assert_eq!(cropped.grid.lons, vec![9.0, 10.0]);
        assert_eq!(cropped.grid.lats, vec![51.0, 52.0]);
        let t = cropped.field("t").unwrap();
        assert_eq!(t.get(0, 0, 0, 0), ds.field("t").unwrap().get(0, 0, 1, 1));

        let point = ds.select_point_nearest(10.9, 50.2);
        assert_eq!(point.grid.lons, vec![11.0]);
        assert_eq!(point.grid.lats, vec![50.0]);
        assert_eq!(point.field("HSURF").unwrap().data, vec![5.0]);
    }

    #[test]
    fn test_time_chunks_and_forecast_hours() {
        let times: Vec<_> = (0..5).map(|h| t0() + Duration::hours(h)).collect();
        let ds = sample(times);
        let chunks = ds.time_chunks(2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].ntimes(), 1);
        assert_eq!(chunks[2].forecast_hours().unwrap(), vec![4]);
        assert_eq!(chunks[1].field("HSURF").unwrap().nt, 1);
    }

    #[test]
    fn test_forecast_hours_need_run() {
        let mut ds = sample(vec![t0()]);
        ds.run = None;
        assert!(ds.forecast_hours().is_err());
    }
}
