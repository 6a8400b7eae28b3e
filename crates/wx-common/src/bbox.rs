//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

/// A lon/lat bounding box in degrees.
///
/// `x` is longitude and `y` is latitude, following the lower-left /
/// upper-right corner convention used by the map regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Height over width, used to size images that keep the map aspect.
    pub fn aspect(&self) -> f64 {
        self.height() / self.width()
    }

    /// Check if a point is contained within this bbox (edges included).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Shrink every edge by `margin` degrees.
    ///
    /// Used to keep value labels away from the frame of a map.
    pub fn shrink(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x + margin,
            min_y: self.min_y + margin,
            max_x: self.max_x - margin,
            max_y: self.max_y - margin,
        }
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Bracketed corner list as expected by static map services:
    /// `[min_lon,min_lat,max_lon,max_lat]`.
    pub fn to_bracket_string(&self) -> String {
        format!(
            "[{},{},{},{}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shrink() {
        let bbox = BoundingBox::new(4.5, 46.5, 16.0, 56.0).shrink(0.15);
        assert!((bbox.min_x - 4.65).abs() < 1e-9);
        assert!((bbox.max_y - 55.85).abs() < 1e-9);
    }

    #[test]
    fn test_bracket_string() {
        let bbox = BoundingBox::new(4.0, 50.0, 12.0, 56.0);
        assert_eq!(bbox.to_bracket_string(), "[4,50,12,56]");
    }
}
