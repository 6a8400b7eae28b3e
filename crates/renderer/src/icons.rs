//! Weather-code to icon lookup.
//!
//! Model `ww` codes (WMO present weather) map to a fixed set of glyph ids.
//! Each glyph exists as `<id>.png` and usually as day/night variants
//! `<id>d.png` / `<id>n.png` in the glyph folder.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use image::RgbaImage;
use tracing::debug;
use wx_common::time::is_daytime;

use crate::error::{RenderError, RenderResult};

/// Icon used for codes missing from the table.
pub const EMPTY_ICON: &str = "empty";

/// WMO `ww` code to glyph id.
const WMO_GLYPHS: [(i64, &str); 45] = [
    (0, "01"),
    (1, "02"),
    (2, "02"),
    (3, "04"),
    (5, "15"),
    (10, "15"),
    (14, "15"),
    (30, "15"),
    (40, "15"),
    (41, "15"),
    (42, "15"),
    (43, "15"),
    (44, "15"),
    (45, "15"),
    (46, "15"),
    (47, "15"),
    (50, "46"),
    (52, "46"),
    (53, "46"),
    (60, "09"),
    (61, "09"),
    (63, "10"),
    (64, "41"),
    (65, "12"),
    (68, "47"),
    (69, "48"),
    (70, "13"),
    (71, "49"),
    (73, "50"),
    (74, "45"),
    (75, "48"),
    (80, "05"),
    (81, "05"),
    (83, "41"),
    (84, "32"),
    (85, "08"),
    (86, "34"),
    (87, "45"),
    (89, "43"),
    (90, "30"),
    (91, "30"),
    (92, "25"),
    (93, "33"),
    (94, "34"),
    (95, "25"),
];

/// Glyph id for a weather code; the code is truncated toward zero.
/// NaN and unknown codes give [`EMPTY_ICON`].
pub fn icon_id(code: f32) -> &'static str {
    if !code.is_finite() {
        return EMPTY_ICON;
    }
    let code = code.trunc() as i64;
    WMO_GLYPHS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, id)| *id)
        .unwrap_or(EMPTY_ICON)
}

/// `d` between 06:00 and 18:59 local time, `n` otherwise.
pub fn day_night_suffix(time: DateTime<Utc>, tz: Tz) -> &'static str {
    if is_daytime(time, tz) {
        "d"
    } else {
        "n"
    }
}

/// Icon key with day/night suffix, e.g. `01d`.
pub fn icon_key(code: f32, time: DateTime<Utc>, tz: Tz) -> String {
    format!("{}{}", icon_id(code), day_night_suffix(time, tz))
}

/// Resolves weather codes to decoded icon images from a glyph folder.
#[derive(Debug, Clone)]
pub struct IconResolver {
    glyph_dir: PathBuf,
    tz: Tz,
}

impl IconResolver {
    pub fn new(glyph_dir: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            glyph_dir: glyph_dir.into(),
            tz,
        }
    }

    pub fn glyph_dir(&self) -> &Path {
        &self.glyph_dir
    }

    /// Path of the icon for one step: the day/night variant when present,
    /// else the plain glyph.
    pub fn resolve_path(&self, code: f32, time: DateTime<Utc>) -> RenderResult<PathBuf> {
        let id = icon_id(code);
        let variant = self
            .glyph_dir
            .join(format!("{}{}.png", id, day_night_suffix(time, self.tz)));
        if variant.is_file() {
            return Ok(variant);
        }
        let plain = self.glyph_dir.join(format!("{}.png", id));
        if plain.is_file() {
            return Ok(plain);
        }
        Err(RenderError::NotFound(plain))
    }

    pub fn load(&self, code: f32, time: DateTime<Utc>) -> RenderResult<RgbaImage> {
        let path = self.resolve_path(code, time)?;
        debug!(code, path = %path.display(), "Loading weather icon");
        Ok(image::open(&path)?.to_rgba8())
    }

    /// One decoded icon per step, in input order.
    pub fn weather_icons(
        &self,
        codes: &[f32],
        times: &[DateTime<Utc>],
    ) -> RenderResult<Vec<RgbaImage>> {
        if codes.len() != times.len() {
            return Err(RenderError::invalid(
                "times",
                format!("{} codes but {} timestamps", codes.len(), times.len()),
            ));
        }
        codes
            .iter()
            .zip(times)
            .map(|(&code, &time)| self.load(code, time))
            .collect()
    }
}
