//! Administrative boundaries and coastlines read from GeoJSON.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use geojson::{GeoJson, Geometry, Value};
use tracing::debug;
use wx_common::BoundingBox;

use crate::error::{RenderError, RenderResult};

/// A set of lon/lat polylines. Polygon rings become closed polylines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boundaries {
    pub lines: Vec<Vec<(f64, f64)>>,
}

impl Boundaries {
    pub fn from_geojson_reader<R: Read>(mut reader: R) -> RenderResult<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let geojson = text.parse::<GeoJson>()?;
        let mut lines = Vec::new();
        match geojson {
            GeoJson::Geometry(geometry) => collect_lines(&geometry, &mut lines),
            GeoJson::Feature(feature) => {
                if let Some(geometry) = &feature.geometry {
                    collect_lines(geometry, &mut lines);
                }
            }
            GeoJson::FeatureCollection(collection) => {
                for feature in &collection.features {
                    if let Some(geometry) = &feature.geometry {
                        collect_lines(geometry, &mut lines);
                    }
                }
            }
        }
        Ok(Self { lines })
    }

    pub fn from_file(path: &Path) -> RenderResult<Self> {
        if !path.is_file() {
            return Err(RenderError::NotFound(path.to_path_buf()));
        }
        let boundaries = Self::from_geojson_reader(BufReader::new(File::open(path)?))?;
        debug!(
            path = %path.display(),
            lines = boundaries.lines.len(),
            "Loaded boundaries"
        );
        Ok(boundaries)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines clipped to `bbox`; a line leaving and re-entering the box is
    /// split into separate pieces.
    pub fn clipped_to(&self, bbox: &BoundingBox) -> Boundaries {
        let mut lines = Vec::new();
        for line in &self.lines {
            let mut current: Vec<(f64, f64)> = Vec::new();
            for w in line.windows(2) {
                match clip_segment(w[0], w[1], bbox) {
                    Some((a, b)) => {
                        if current.last() != Some(&a) {
                            if current.len() >= 2 {
                                lines.push(std::mem::take(&mut current));
                            }
                            current.clear();
                            current.push(a);
                        }
                        current.push(b);
                    }
                    None => {
                        if current.len() >= 2 {
                            lines.push(std::mem::take(&mut current));
                        }
                        current.clear();
                    }
                }
            }
            if current.len() >= 2 {
                lines.push(current);
            }
        }
        Boundaries { lines }
    }
}

fn collect_lines(geometry: &Geometry, out: &mut Vec<Vec<(f64, f64)>>) {
    let to_line = |positions: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        positions
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| (p[0], p[1]))
            .collect()
    };
    match &geometry.value {
        Value::LineString(line) => out.push(to_line(line)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(to_line)),
        Value::Polygon(rings) => out.extend(rings.iter().map(to_line)),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.extend(rings.iter().map(to_line));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, out);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

/// Liang-Barsky clipping of one segment against `bbox`.
fn clip_segment(a: (f64, f64), b: (f64, f64), bbox: &BoundingBox) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-dx, a.0 - bbox.min_x),
        (dx, bbox.max_x - a.0),
        (-dy, a.1 - bbox.min_y),
        (dy, bbox.max_y - a.1),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    let at = |t: f64| {
        if t == 0.0 {
            a
        } else if t == 1.0 {
            b
        } else {
            (a.0 + t * dx, a.1 + t * dy)
        }
    };
    Some((at(t0), at(t1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 0]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[1, 1], [2, 1], [2, 2], [1, 1]]]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Point", "coordinates": [5, 5]}}
        ]
    }"#;

    #[test]
    fn test_reads_lines_and_rings() {
        let b = Boundaries::from_geojson_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(b.lines.len(), 2);
        assert_eq!(b.lines[1].len(), 4);
    }

    #[test]
    fn test_clipping_splits_lines() {
        let b = Boundaries {
            lines: vec![vec![(-1.0, 0.5), (2.0, 0.5), (2.0, 3.0), (0.5, 3.0), (0.5, 0.8)]],
        };
        let clipped = b.clipped_to(&BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(clipped.lines.len(), 2);
        assert_eq!(clipped.lines[0], vec![(0.0, 0.5), (1.0, 0.5)]);
        let second = &clipped.lines[1];
        assert_eq!(second.len(), 2);
        assert!((second[0].0 - 0.5).abs() < 1e-12 && (second[0].1 - 1.0).abs() < 1e-12);
        assert_eq!(second[1], (0.5, 0.8));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("de.geojson");
        std::fs::write(&path, SAMPLE).unwrap();
        let b = Boundaries::from_file(&path).unwrap();
        assert_eq!(b, Boundaries::from_geojson_reader(SAMPLE.as_bytes()).unwrap());
        assert!(!b.is_empty());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.geojson");
        std::fs::write(&path, "{\"type\": ").unwrap();
        let err = Boundaries::from_file(&path).unwrap_err();
        assert!(matches!(err, RenderError::GeoJson(_)), "{:?}", err);
    }

    #[test]
    fn test_missing_file() {
        let err = Boundaries::from_file(Path::new("/nonexistent/x.geojson")).unwrap_err();
        assert!(matches!(err, RenderError::NotFound(_)));
    }
}
