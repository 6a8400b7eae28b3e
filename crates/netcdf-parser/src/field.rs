//! Gridded fields: dense `f32` arrays over (time, level, lat, lon).

use std::ops::Range;

use chrono::{DateTime, Utc};
use wx_common::Unit;

use crate::error::{NetCdfError, NetCdfResult};

/// A named data variable on the dataset grid.
///
/// Values are stored row-major over `[nt, nz, ny, nx]`. Axes that the
/// variable does not carry have length 1 and their flag is `false`, so a
/// surface field without time (e.g. orography) is `[1, 1, ny, nx]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub units: Option<String>,
    pub data: Vec<f32>,
    pub nt: usize,
    pub nz: usize,
    pub ny: usize,
    pub nx: usize,
    pub has_time: bool,
    pub has_level: bool,
}

impl Field {
    /// Build a field, checking that `data` matches the declared shape.
    pub fn new(
        name: impl Into<String>,
        units: Option<String>,
        data: Vec<f32>,
        shape: [usize; 4],
        has_time: bool,
        has_level: bool,
    ) -> NetCdfResult<Self> {
        let name = name.into();
        let [nt, nz, ny, nx] = shape;
        if data.len() != nt * nz * ny * nx {
            return Err(NetCdfError::InvalidFormat(format!(
                "field '{}' has {} values, shape {:?} needs {}",
                name,
                data.len(),
                shape,
                nt * nz * ny * nx
            )));
        }
        if (!has_time && nt != 1) || (!has_level && nz != 1) {
            return Err(NetCdfError::InvalidFormat(format!(
                "field '{}' has a non-singleton axis that is flagged absent",
                name
            )));
        }
        Ok(Self {
            name,
            units,
            data,
            nt,
            nz,
            ny,
            nx,
            has_time,
            has_level,
        })
    }

    /// A 2-D field without time or level axes.
    pub fn surface(
        name: impl Into<String>,
        units: Option<String>,
        data: Vec<f32>,
        ny: usize,
        nx: usize,
    ) -> NetCdfResult<Self> {
        Self::new(name, units, data, [1, 1, ny, nx], false, false)
    }

    pub fn shape(&self) -> [usize; 4] {
        [self.nt, self.nz, self.ny, self.nx]
    }

    #[inline]
    fn offset(&self, t: usize, z: usize, y: usize, x: usize) -> usize {
        ((t * self.nz + z) * self.ny + y) * self.nx + x
    }

    /// Value at a grid position. Absent axes accept any index.
    pub fn get(&self, t: usize, z: usize, y: usize, x: usize) -> f32 {
        let t = if self.has_time { t } else { 0 };
        let z = if self.has_level { z } else { 0 };
        self.data[self.offset(t, z, y, x)]
    }

    /// Convert the values in place to another unit.
    pub fn convert_units(&mut self, to: &str) -> NetCdfResult<()> {
        let from = self
            .units
            .as_deref()
            .ok_or_else(|| NetCdfError::MissingData(format!("units of '{}'", self.name)))?;
        let target: Unit = to.parse()?;
        let transform = from.parse::<Unit>()?.transform_to(target)?;
        transform.apply_slice(&mut self.data);
        self.units = Some(target.symbol().to_string());
        Ok(())
    }

    /// Horizontal slice `[ny * nx]` at a time step and level.
    pub fn slice2d(&self, t: usize, z: usize) -> &[f32] {
        let t = if self.has_time { t } else { 0 };
        let z = if self.has_level { z } else { 0 };
        let start = self.offset(t, z, 0, 0);
        &self.data[start..start + self.ny * self.nx]
    }

    /// Vertical profile `[nz]` at one time step and grid cell.
    pub fn column(&self, t: usize, y: usize, x: usize) -> Vec<f32> {
        (0..self.nz).map(|z| self.get(t, z, y, x)).collect()
    }

    /// Time series `[nt]` at one level and grid cell.
    pub fn series(&self, z: usize, y: usize, x: usize) -> Vec<f32> {
        (0..self.nt).map(|t| self.get(t, z, y, x)).collect()
    }

    /// Smallest value, ignoring NaN.
    pub fn min(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::min)
    }

    /// Largest value, ignoring NaN.
    pub fn max(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::max)
    }

    /// Rate of change per hour along the time axis.
    ///
    /// Second-order central differences on the (possibly irregular) time
    /// axis for interior steps, first-order one-sided differences at the
    /// two ends. Units gain a `/h` suffix.
    pub fn differentiate_time(&self, times: &[DateTime<Utc>]) -> NetCdfResult<Field> {
        if !self.has_time {
            return Err(NetCdfError::MissingData(format!(
                "time axis of '{}'",
                self.name
            )));
        }
        if times.len() != self.nt {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} times for {} steps of '{}'",
                times.len(),
                self.nt,
                self.name
            )));
        }
        let hours: Vec<f64> = times
            .iter()
            .map(|t| (*t - times[0]).num_seconds() as f64 / 3600.0)
            .collect();

        let mut out = self.clone();
        out.units = self.units.as_ref().map(|u| format!("{}/h", u));
        if self.nt < 2 {
            out.data.iter_mut().for_each(|v| *v = f32::NAN);
            return Ok(out);
        }

        let plane = self.nz * self.ny * self.nx;
        for p in 0..plane {
            let at = |t: usize| self.data[t * plane + p] as f64;
            for t in 0..self.nt {
                let rate = if t == 0 {
                    (at(1) - at(0)) / (hours[1] - hours[0])
                } else if t == self.nt - 1 {
                    (at(t) - at(t - 1)) / (hours[t] - hours[t - 1])
                } else {
                    let h1 = hours[t] - hours[t - 1];
                    let h2 = hours[t + 1] - hours[t];
                    (h1 * h1 * at(t + 1) - h2 * h2 * at(t - 1) + (h2 * h2 - h1 * h1) * at(t))
                        / (h1 * h2 * (h1 + h2))
                };
                out.data[t * plane + p] = rate as f32;
            }
        }
        Ok(out)
    }

    /// Gather a subset of the field.
    ///
    /// `times` maps every output step to a source step, `None` filling the
    /// step with NaN; `levels` lists the source levels to keep. Passing
    /// `None` for either keeps that axis as is. Axes the field does not
    /// carry are left untouched.
    pub fn gather(
        &self,
        times: Option<&[Option<usize>]>,
        levels: Option<&[usize]>,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Field {
        let all_times: Vec<Option<usize>> = (0..self.nt).map(Some).collect();
        let time_map = match times {
            Some(map) if self.has_time => map,
            _ => &all_times[..],
        };
        let all_levels: Vec<usize> = (0..self.nz).collect();
        let level_map = match levels {
            Some(map) if self.has_level => map,
            _ => &all_levels[..],
        };

        let (ny, nx) = (rows.len(), cols.len());
        let mut data = Vec::with_capacity(time_map.len() * level_map.len() * ny * nx);
        for src_t in time_map {
            for &z in level_map {
                for y in rows.clone() {
                    match src_t {
                        Some(t) => {
                            let start = self.offset(*t, z, y, cols.start);
                            data.extend_from_slice(&self.data[start..start + nx]);
                        }
                        None => data.extend(std::iter::repeat(f32::NAN).take(nx)),
                    }
                }
            }
        }

        Field {
            name: self.name.clone(),
            units: self.units.clone(),
            data,
            nt: time_map.len(),
            nz: level_map.len(),
            ny,
            nx,
            has_time: self.has_time,
            has_level: self.has_level,
        }
    }

    /// Full-extent gather along the horizontal axes.
    pub fn gather_steps(&self, times: Option<&[Option<usize>]>, levels: Option<&[usize]>) -> Field {
        self.gather(times, levels, 0..self.ny, 0..self.nx)
    }

    /// Drop a singleton level axis.
    pub fn squeeze_level(mut self) -> Field {
        if self.nz == 1 {
            self.has_level = false;
        }
        self
    }

    /// Reorder the columns of every row.
    pub fn permute_columns(&mut self, order: &[usize]) {
        let nx = self.nx;
        let mut row = vec![0.0f32; nx];
        for chunk in self.data.chunks_mut(nx) {
            for (dst, &src) in row.iter_mut().zip(order) {
                *dst = chunk[src];
            }
            chunk.copy_from_slice(&row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hourly(n: usize) -> Vec<DateTime<Utc>> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn test_shape_is_validated() {
        let err = Field::new("t", None, vec![0.0; 5], [1, 1, 2, 2], true, false).unwrap_err();
        assert!(matches!(err, NetCdfError::InvalidFormat(_)));
    }

    #[test]
    fn test_slices_and_columns() {
        // 2 times, 3 levels, 1x2 grid; value encodes its indices
        let mut data = Vec::new();
        for t in 0..2 {
            for z in 0..3 {
                for x in 0..2 {
                    data.push((t * 100 + z * 10 + x) as f32);
                }
            }
        }
        let field = Field::new("t", Some("K".into()), data, [2, 3, 1, 2], true, true).unwrap();
        assert_eq!(field.slice2d(1, 2), &[120.0, 121.0]);
        assert_eq!(field.column(1, 0, 1), vec![101.0, 111.0, 121.0]);
        assert_eq!(field.series(2, 0, 0), vec![20.0, 120.0]);
    }

    #[test]
    fn test_convert_units() {
        let mut field = Field::surface("t_2m", Some("K".into()), vec![273.15, 283.15], 1, 2).unwrap();
        field.convert_units("degC").unwrap();
        assert!(field.data[0].abs() < 1e-4);
        assert!((field.data[1] - 10.0).abs() < 1e-4);
        assert_eq!(field.units.as_deref(), Some("degC"));
    }

    #[test]
    fn test_convert_units_without_units_fails() {
        let mut field = Field::surface("ww", None, vec![0.0], 1, 1).unwrap();
        assert!(field.convert_units("degC").is_err());
    }

    #[test]
    fn test_min_max_ignore_nan() {
        let field = Field::surface("x", None, vec![f32::NAN, 3.0, -1.0, f32::NAN], 2, 2).unwrap();
        assert_eq!(field.min(), Some(-1.0));
        assert_eq!(field.max(), Some(3.0));
        let empty = Field::surface("x", None, vec![f32::NAN], 1, 1).unwrap();
        assert_eq!(empty.max(), None);
    }

    #[test]
    fn test_rate_from_accumulation() {
        // 0, 1, 3, 6 mm accumulated at hourly steps
        let acc = Field::new("RAIN_GSP", Some("kg m-2".into()), vec![0.0, 1.0, 3.0, 6.0], [4, 1, 1, 1], true, false)
            .unwrap();
        let rate = acc.differentiate_time(&hourly(4)).unwrap();
        assert_eq!(rate.data, vec![1.0, 1.5, 2.5, 3.0]);
        assert_eq!(rate.units.as_deref(), Some("kg m-2/h"));
    }

    #[test]
    fn test_rate_on_irregular_steps() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let times = vec![t0, t0 + Duration::hours(1), t0 + Duration::hours(3)];
        // linear accumulation of 2 mm/h is recovered exactly
        let acc = Field::new("acc", None, vec![0.0, 2.0, 6.0], [3, 1, 1, 1], true, false).unwrap();
        let rate = acc.differentiate_time(&times).unwrap();
        for v in rate.data {
            assert!((v - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_gather_fills_missing_steps() {
        let field = Field::new("t", None, vec![1.0, 2.0, 3.0, 4.0], [2, 1, 1, 2], true, false).unwrap();
        let out = field.gather_steps(Some(&[Some(1), None]), None);
        assert_eq!(out.nt, 2);
        assert_eq!(&out.data[..2], &[3.0, 4.0]);
        assert!(out.data[2].is_nan() && out.data[3].is_nan());
    }

    #[test]
    fn test_gather_ignores_time_map_for_invariant_fields() {
        let field = Field::surface("HSURF", Some("m".into()), vec![10.0, 20.0], 1, 2).unwrap();
        let out = field.gather_steps(Some(&[Some(0), Some(1), None]), None);
        assert_eq!(out.nt, 1);
        assert_eq!(out.data, vec![10.0, 20.0]);
    }

    #[test]
    fn test_permute_columns() {
        let mut field = Field::surface("x", None, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 2, 4).unwrap();
        field.permute_columns(&[2, 3, 0, 1]);
        assert_eq!(field.data, vec![2.0, 3.0, 0.0, 1.0, 6.0, 7.0, 4.0, 5.0]);
    }
}
