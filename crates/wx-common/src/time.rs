//! Time handling utilities for model runs and forecast steps.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{WxError, WxResult};

/// Represents a valid time for meteorological data.
///
/// Combines reference time (model run time) and forecast offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidTime {
    /// Model run/reference time
    pub reference_time: DateTime<Utc>,
    /// Forecast hour offset from reference time
    pub forecast_hour: i64,
}

impl ValidTime {
    pub fn new(reference_time: DateTime<Utc>, forecast_hour: i64) -> Self {
        Self {
            reference_time,
            forecast_hour,
        }
    }

    /// Pair a step time with its run, rounding the offset to whole hours.
    pub fn from_step(reference_time: DateTime<Utc>, step: DateTime<Utc>) -> Self {
        Self::new(reference_time, hours_between(reference_time, step))
    }

    /// Calculate the actual valid time (reference + forecast offset)
    pub fn valid_datetime(&self) -> DateTime<Utc> {
        self.reference_time + Duration::hours(self.forecast_hour)
    }

    /// "ICON-D2 Run 2024011500 UTC" style annotation.
    pub fn run_label(&self) -> String {
        run_label(self.reference_time)
    }

    /// "Valid Monday 15 Jan 2024 at 14:00 (Berlin)" style annotation.
    pub fn valid_label(&self, tz: Tz) -> String {
        valid_label(self.valid_datetime(), tz)
    }
}

/// Whole hours from `run` to `step`, rounded to the nearest hour.
pub fn hours_between(run: DateTime<Utc>, step: DateTime<Utc>) -> i64 {
    let seconds = (step - run).num_seconds() as f64;
    (seconds / 3600.0).round() as i64
}

fn run_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{10})").expect("valid run code pattern"))
}

/// Parse the run initialization time from a file name.
///
/// Model files embed the run as a 10-digit `YYYYMMDDHH` code, e.g.
/// `icon-d2_germany_regular-lat-lon_pressure-level_2024011506_t.nc`.
pub fn parse_run_from_filename(name: &str) -> WxResult<DateTime<Utc>> {
    let code = run_code_pattern()
        .captures(name)
        .and_then(|c| c.get(1))
        .ok_or_else(|| WxError::InvalidTime(format!("no run code in '{}'", name)))?;
    parse_run_code(code.as_str())
}

/// Parse a `YYYYMMDDHH` run code.
pub fn parse_run_code(code: &str) -> WxResult<DateTime<Utc>> {
    let ndt = NaiveDateTime::parse_from_str(&format!("{}0000", code), "%Y%m%d%H%M%S")
        .map_err(|e| WxError::InvalidTime(format!("'{}': {}", code, e)))?;
    Ok(Utc.from_utc_datetime(&ndt))
}

/// Convert a UTC instant to the given timezone.
pub fn to_local(time: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    time.with_timezone(&tz)
}

/// Day if the local hour is within [6, 18].
pub fn is_daytime(time: DateTime<Utc>, tz: Tz) -> bool {
    (6..=18).contains(&to_local(time, tz).hour())
}

pub fn run_label(run: DateTime<Utc>) -> String {
    format!("ICON-D2 Run {} UTC", run.format("%Y%m%d %H"))
}

pub fn valid_label(valid: DateTime<Utc>, tz: Tz) -> String {
    let city = tz.name().rsplit('/').next().unwrap_or("UTC");
    format!(
        "Valid {} ({})",
        to_local(valid, tz).format("%A %d %b %Y at %H:%M"),
        city
    )
}
